use aws_sdk_sns::Client as SnsClient;
use rocket::{serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::AuthToken,
            vote::{VoteDescription, VoteReceipt, VoteRequest},
        },
        db::{
            candidate::Candidate, election::Election, settings::Settings, user::User, vote::Vote,
        },
        mongodb::Coll,
    },
    logging::RequestId,
    notification::notify_voter,
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![cast_vote, my_votes]
}

/// Cast a vote as the logged-in user, then try to confirm it to them.
#[allow(clippy::too_many_arguments)]
#[post("/vote", data = "<request>", format = "json")]
async fn cast_vote(
    req_id: &RequestId,
    token: AuthToken,
    request: Json<VoteRequest>,
    users: Coll<User>,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
    settings: Coll<Settings>,
    sns: &State<SnsClient>,
    config: &State<Config>,
) -> Result<Json<VoteReceipt>> {
    let user = users
        .find_one(token.id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::Unauthorized("Unknown user".to_string()))?;

    let cast = Vote::cast(&elections, &candidates, &votes, user.id, request.0).await?;
    info!(
        "req{req_id}: {} voted in election {} '{}'",
        user.username, cast.election.id, cast.election.title
    );

    let outcome = notify_voter(&user, &cast, &settings, sns, config.notify_timeout()).await;
    Ok(Json(VoteReceipt {
        vote: cast.vote.into(),
        email_sent: outcome.sent,
        email_error: outcome.error,
    }))
}

/// The logged-in user's own votes.
#[get("/votes")]
async fn my_votes(token: AuthToken, votes: Coll<Vote>) -> Result<Json<Vec<VoteDescription>>> {
    let votes = Vote::for_user(&votes, token.id).await?;
    Ok(Json(votes.into_iter().map(VoteDescription::from).collect()))
}
