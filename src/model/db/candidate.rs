use mongodb::{bson::doc, options::FindOptions};
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    api::election::NewCandidate,
    common::{CandidateId, ElectionId},
    db::election::Election,
    mongodb::{is_duplicate_key_error, Coll, Counter, CANDIDATE_ID_COUNTER_ID},
};

/// A candidate from the database.
///
/// Removing a candidate only sets `removed`, so that votes already cast for
/// them still point at something. A removed candidate is no longer listed,
/// votable or tallied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: CandidateId,
    pub election_id: ElectionId,
    pub name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub removed: bool,
}

impl Candidate {
    pub fn new(id: CandidateId, election_id: ElectionId, candidate: NewCandidate) -> Self {
        Self {
            id,
            election_id,
            name: candidate.name,
            photo_url: candidate.photo_url,
            removed: false,
        }
    }

    /// Get a candidate that has not been removed.
    pub async fn get_live(candidates: &Coll<Candidate>, id: CandidateId) -> Result<Candidate> {
        let filter = doc! { "_id": id, "removed": false };
        candidates
            .find_one(filter, None)
            .await?
            .ok_or_else(|| Error::not_found(format!("Candidate {id}")))
    }

    /// The live candidates of one election, in creation order.
    pub async fn for_election(
        candidates: &Coll<Candidate>,
        election_id: ElectionId,
    ) -> Result<Vec<Candidate>> {
        Self::find_live(candidates, doc! { "election_id": election_id }).await
    }

    /// The live candidates of every election, in creation order.
    pub async fn all_live(candidates: &Coll<Candidate>) -> Result<Vec<Candidate>> {
        Self::find_live(candidates, doc! {}).await
    }

    async fn find_live(
        candidates: &Coll<Candidate>,
        mut filter: mongodb::bson::Document,
    ) -> Result<Vec<Candidate>> {
        filter.insert("removed", false);
        let sort = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        Ok(candidates.find(filter, sort).await?.try_collect().await?)
    }

    /// Add a candidate to an existing election.
    ///
    /// Names must be unique among the live candidates of the election; the
    /// partial unique index backs up the check below.
    pub async fn add(
        elections: &Coll<Election>,
        candidates: &Coll<Candidate>,
        counters: &Coll<Counter>,
        election_id: ElectionId,
        candidate: NewCandidate,
    ) -> Result<Candidate> {
        let candidate = candidate.validated()?;
        Election::get(elections, election_id).await?;

        let duplicate_name = format!(
            "Election {election_id} already has a candidate named '{}'",
            candidate.name
        );
        let filter = doc! {
            "election_id": election_id,
            "name": &candidate.name,
            "removed": false,
        };
        if candidates.find_one(filter, None).await?.is_some() {
            return Err(Error::InvalidInput(duplicate_name));
        }

        let id = Counter::next(counters, CANDIDATE_ID_COUNTER_ID).await?;
        let candidate = Candidate::new(id, election_id, candidate);
        let result = candidates.insert_one(&candidate, None).await;
        match result {
            Ok(_) => Ok(candidate),
            Err(e) if is_duplicate_key_error(&e) => Err(Error::InvalidInput(duplicate_name)),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a live candidate. Votes already cast for them are untouched.
    pub async fn remove(candidates: &Coll<Candidate>, id: CandidateId) -> Result<()> {
        let filter = doc! { "_id": id, "removed": false };
        let update = doc! { "$set": { "removed": true } };
        let result = candidates.update_one(filter, update, None).await?;
        if result.modified_count == 0 {
            Err(Error::not_found(format!("Candidate {id}")))
        } else {
            Ok(())
        }
    }
}
