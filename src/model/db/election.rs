use mongodb::{bson::doc, options::FindOptions, Client};
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    api::election::NewCandidate,
    common::ElectionId,
    db::candidate::Candidate,
    mongodb::{u32_id_filter, Coll, Counter, CANDIDATE_ID_COUNTER_ID, ELECTION_ID_COUNTER_ID},
};

/// An election from the database, with its unique ID.
///
/// Elections are never updated or deleted once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: ElectionId,
    pub title: String,
}

impl Election {
    /// Create an election together with its initial candidates.
    ///
    /// IDs are allocated up front; the election and candidates are then
    /// written in a single transaction, so either all of them exist or none
    /// do. Allocated IDs are not reused if the transaction fails.
    pub async fn create(
        db_client: &Client,
        elections: &Coll<Election>,
        candidates: &Coll<Candidate>,
        counters: &Coll<Counter>,
        title: String,
        new_candidates: Vec<NewCandidate>,
    ) -> Result<(Election, Vec<Candidate>)> {
        let election = Election {
            id: Counter::next(counters, ELECTION_ID_COUNTER_ID).await?,
            title,
        };
        let mut created = Vec::with_capacity(new_candidates.len());
        for candidate in new_candidates {
            let id = Counter::next(counters, CANDIDATE_ID_COUNTER_ID).await?;
            created.push(Candidate::new(id, election.id, candidate));
        }

        let mut session = db_client.start_session(None).await?;
        session.start_transaction(None).await?;
        elections
            .insert_one_with_session(&election, None, &mut session)
            .await?;
        if !created.is_empty() {
            candidates
                .insert_many_with_session(&created, None, &mut session)
                .await?;
        }
        session.commit_transaction().await?;

        Ok((election, created))
    }

    /// Get an election by ID.
    pub async fn get(elections: &Coll<Election>, id: ElectionId) -> Result<Election> {
        elections
            .find_one(u32_id_filter(id), None)
            .await?
            .ok_or_else(|| Error::not_found(format!("Election {id}")))
    }

    /// All elections, oldest first.
    pub async fn list(elections: &Coll<Election>) -> Result<Vec<Election>> {
        let sort = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        Ok(elections.find(None, sort).await?.try_collect().await?)
    }
}
