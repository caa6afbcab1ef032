use std::collections::BTreeMap;

use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            auth::AuthToken,
            report::{CandidateResult, ElectionSummary},
        },
        common::{
            role::Role,
            tally::{eligible_voters, votes_by_election, Participation, Tally},
            ElectionId,
        },
        db::{candidate::Candidate, election::Election, user::User, vote::Vote},
        mongodb::Coll,
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![election_summary, vote_report, results]
}

/// Candidates, eligible voters and turnout for every election.
#[get("/admin/election_summary")]
async fn election_summary(
    token: AuthToken,
    users: Coll<User>,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
    config: &State<Config>,
) -> Result<Json<Vec<ElectionSummary>>> {
    User::require_role(&users, token.id, Role::Admin).await?;

    let eligible = eligible_voters(&User::all(&users).await?, config.registration());
    let live_candidates = Candidate::all_live(&candidates).await?;
    let all_votes = Vote::all(&votes).await?;
    let votes = votes_by_election(&all_votes);

    let summaries = Election::list(&elections)
        .await?
        .into_iter()
        .map(|election| {
            let candidates = live_candidates
                .iter()
                .filter(|c| c.election_id == election.id)
                .count() as u64;
            let voters = votes
                .get(&election.id)
                .into_iter()
                .flatten()
                .map(|vote| vote.user_id);
            let participation = Participation::count(&eligible, voters);
            ElectionSummary::new(election.id, election.title, candidates, participation)
        })
        .collect();
    Ok(Json(summaries))
}

/// Votes per live candidate in one election.
#[get("/admin/vote_report/<election_id>")]
async fn vote_report(
    token: AuthToken,
    election_id: ElectionId,
    users: Coll<User>,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
) -> Result<Json<BTreeMap<String, u64>>> {
    User::require_role(&users, token.id, Role::Admin).await?;

    let election = Election::get(&elections, election_id).await?;
    let candidates = Candidate::for_election(&candidates, election.id).await?;
    let votes = Vote::for_election(&votes, election.id).await?;
    let tally = Tally::count(&candidates, votes.iter().map(|v| v.candidate_id));
    if tally.dropped() > 0 {
        debug!(
            "Dropped {} votes for removed candidates in election {}",
            tally.dropped(),
            election.id
        );
    }
    Ok(Json(tally.by_name()))
}

/// Full results for one election. Only the super-admin may see these.
#[get("/results/<election_id>")]
async fn results(
    token: AuthToken,
    election_id: ElectionId,
    users: Coll<User>,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
    config: &State<Config>,
) -> Result<Json<BTreeMap<String, CandidateResult>>> {
    User::require_super_admin(&users, token.id, config.registration()).await?;

    let election = Election::get(&elections, election_id).await?;
    let candidates = Candidate::for_election(&candidates, election.id).await?;
    let votes = Vote::for_election(&votes, election.id).await?;
    let tally = Tally::count(&candidates, votes.iter().map(|v| v.candidate_id));
    Ok(Json(tally.results()))
}
