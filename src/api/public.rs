use std::collections::HashMap;

use rocket::{serde::json::Json, Route};
use serde::Serialize;

use crate::{
    error::Result,
    model::{
        api::election::ElectionDescription,
        common::ElectionId,
        db::{candidate::Candidate, election::Election},
        mongodb::Coll,
    },
};

pub fn routes() -> Vec<Route> {
    routes![index, elections, election]
}

#[derive(Serialize)]
struct Index {
    message: &'static str,
}

#[get("/")]
async fn index() -> Json<Index> {
    Json(Index {
        message: "Election backend is running",
    })
}

/// Every election with its live candidates.
#[get("/elections")]
async fn elections(
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
) -> Result<Json<Vec<ElectionDescription>>> {
    let mut by_election: HashMap<ElectionId, Vec<Candidate>> = HashMap::new();
    for candidate in Candidate::all_live(&candidates).await? {
        by_election
            .entry(candidate.election_id)
            .or_default()
            .push(candidate);
    }

    let descriptions = Election::list(&elections)
        .await?
        .into_iter()
        .map(|election| {
            let candidates = by_election.remove(&election.id).unwrap_or_default();
            ElectionDescription::new(election, candidates)
        })
        .collect();
    Ok(Json(descriptions))
}

#[get("/elections/<election_id>")]
async fn election(
    election_id: ElectionId,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
) -> Result<Json<ElectionDescription>> {
    let election = Election::get(&elections, election_id).await?;
    let candidates = Candidate::for_election(&candidates, election_id).await?;
    Ok(Json(ElectionDescription::new(election, candidates)))
}
