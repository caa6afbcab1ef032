use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::{bson::doc, options::FindOptions};
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    api::vote::VoteRequest,
    common::{CandidateId, ElectionId},
    db::{candidate::Candidate, election::Election},
    mongodb::{is_duplicate_key_error, Coll, Id},
};

/// Core vote data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCore {
    pub user_id: Id,
    pub election_id: ElectionId,
    pub candidate_id: CandidateId,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}

/// A vote without an ID.
pub type NewVote = VoteCore;

/// A vote from the database, with its unique ID. Votes are immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub vote: VoteCore,
}

impl Deref for Vote {
    type Target = VoteCore;

    fn deref(&self) -> &Self::Target {
        &self.vote
    }
}

/// A successfully cast vote, with what it was cast in and for.
#[derive(Debug)]
pub struct CastVote {
    pub vote: Vote,
    pub election: Election,
    pub candidate: Candidate,
}

impl Vote {
    /// Record `user_id`'s vote.
    ///
    /// The checks run in a fixed order: the election must exist, the
    /// candidate must exist and be live, the candidate must stand in that
    /// election, and the user must not have voted in it yet. The last check
    /// is repeated by the unique index on insert, which is what makes
    /// concurrent attempts safe: exactly one of them succeeds.
    pub async fn cast(
        elections: &Coll<Election>,
        candidates: &Coll<Candidate>,
        votes: &Coll<Vote>,
        user_id: Id,
        request: VoteRequest,
    ) -> Result<CastVote> {
        let election = Election::get(elections, request.election_id).await?;
        let candidate = Candidate::get_live(candidates, request.candidate_id).await?;
        if candidate.election_id != election.id {
            return Err(Error::InvalidInput(format!(
                "Candidate {} is not standing in election {}",
                candidate.id, election.id
            )));
        }

        let election_id = election.id;
        let already_voted = || Error::AlreadyVoted(format!("in election {election_id}"));
        let filter = doc! {
            "user_id": user_id,
            "election_id": election.id,
        };
        if votes.find_one(filter, None).await?.is_some() {
            return Err(already_voted());
        }

        let vote = Vote {
            id: Id::new(),
            vote: NewVote {
                user_id,
                election_id: election.id,
                candidate_id: candidate.id,
                // Stored with millisecond precision.
                cast_at: mongodb::bson::DateTime::now().to_chrono(),
            },
        };
        let result = votes.insert_one(&vote, None).await;
        match result {
            Ok(_) => Ok(CastVote {
                vote,
                election,
                candidate,
            }),
            Err(e) if is_duplicate_key_error(&e) => Err(already_voted()),
            Err(e) => Err(e.into()),
        }
    }

    /// A user's votes, oldest first.
    pub async fn for_user(votes: &Coll<Vote>, user_id: Id) -> Result<Vec<Vote>> {
        Self::find(votes, doc! { "user_id": user_id }).await
    }

    /// Every vote in one election.
    pub async fn for_election(votes: &Coll<Vote>, election_id: ElectionId) -> Result<Vec<Vote>> {
        Self::find(votes, doc! { "election_id": election_id }).await
    }

    /// Every vote in every election.
    pub async fn all(votes: &Coll<Vote>) -> Result<Vec<Vote>> {
        Self::find(votes, doc! {}).await
    }

    async fn find(votes: &Coll<Vote>, filter: mongodb::bson::Document) -> Result<Vec<Vote>> {
        let sort = FindOptions::builder().sort(doc! { "cast_at": 1 }).build();
        Ok(votes.find(filter, sort).await?.try_collect().await?)
    }
}
