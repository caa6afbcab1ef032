use mongodb::Client;
use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            auth::AuthToken,
            election::{CandidateDescription, ElectionDescription, ElectionSpec, NewCandidate},
            settings::SettingsResponse,
            user::{UserCount, UserDescription},
        },
        common::{role::Role, CandidateId, ElectionId},
        db::{
            candidate::Candidate,
            election::Election,
            settings::{MailSettings, Settings},
            user::User,
        },
        mongodb::{Coll, Counter},
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        create_election,
        add_candidate,
        remove_candidate,
        list_users,
        user_count,
        get_settings,
        put_settings,
    ]
}

#[post("/elections", data = "<spec>", format = "json")]
pub async fn create_election(
    token: AuthToken,
    spec: Json<ElectionSpec>,
    users: Coll<User>,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    counters: Coll<Counter>,
    db_client: &State<Client>,
) -> Result<Json<ElectionDescription>> {
    User::require_role(&users, token.id, Role::Admin).await?;
    let (title, new_candidates) = spec.0.validated()?;

    let (election, created) = Election::create(
        db_client,
        &elections,
        &candidates,
        &counters,
        title,
        new_candidates,
    )
    .await?;
    info!(
        "Created election {} '{}' with {} candidates",
        election.id,
        election.title,
        created.len()
    );

    Ok(Json(ElectionDescription::new(election, created)))
}

#[post("/elections/<election_id>/candidates", data = "<candidate>", format = "json")]
async fn add_candidate(
    token: AuthToken,
    election_id: ElectionId,
    candidate: Json<NewCandidate>,
    users: Coll<User>,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    counters: Coll<Counter>,
) -> Result<Json<CandidateDescription>> {
    User::require_role(&users, token.id, Role::Admin).await?;
    let candidate =
        Candidate::add(&elections, &candidates, &counters, election_id, candidate.0).await?;
    info!(
        "Added candidate {} '{}' to election {election_id}",
        candidate.id, candidate.name
    );
    Ok(Json(candidate.into()))
}

#[delete("/candidates/<candidate_id>")]
async fn remove_candidate(
    token: AuthToken,
    candidate_id: CandidateId,
    users: Coll<User>,
    candidates: Coll<Candidate>,
) -> Result<()> {
    User::require_role(&users, token.id, Role::Admin).await?;
    Candidate::remove(&candidates, candidate_id).await?;
    info!("Removed candidate {candidate_id}");
    Ok(())
}

#[get("/users")]
async fn list_users(token: AuthToken, users: Coll<User>) -> Result<Json<Vec<UserDescription>>> {
    User::require_role(&users, token.id, Role::Admin).await?;
    let users = User::all(&users).await?;
    Ok(Json(users.into_iter().map(UserDescription::from).collect()))
}

/// Number of registered users, the super-admin included.
#[get("/user_count")]
async fn user_count(token: AuthToken, users: Coll<User>) -> Result<Json<UserCount>> {
    User::require_role(&users, token.id, Role::Admin).await?;
    let count = users.count_documents(None, None).await?;
    Ok(Json(UserCount { count }))
}

#[get("/settings")]
async fn get_settings(
    token: AuthToken,
    users: Coll<User>,
    settings: Coll<Settings>,
) -> Result<Json<SettingsResponse>> {
    User::require_role(&users, token.id, Role::Admin).await?;
    Ok(Json(Settings::get(&settings).await?.into()))
}

#[put("/settings", data = "<mail>", format = "json")]
async fn put_settings(
    token: AuthToken,
    mail: Json<MailSettings>,
    users: Coll<User>,
    settings: Coll<Settings>,
) -> Result<()> {
    User::require_role(&users, token.id, Role::Admin).await?;
    Settings::put(&settings, mail.0).await?;
    info!("Updated mail settings");
    Ok(())
}

#[cfg(test)]
mod tests {
    use mongodb::Database;
    use rocket::{http::Status, local::asynchronous::Client, serde::json::serde_json};

    use crate::error::ErrorKind;
    use crate::model::api::auth::Credentials;

    use super::super::common::{
        assert_error, create_election, login, post_json, read_json, register_and_login,
    };
    use super::*;

    #[backend_test(admin)]
    async fn create_election_with_candidates(client: Client, candidates: Coll<Candidate>) {
        let board = create_election(&client, &ElectionSpec::example()).await;
        assert_eq!(board.title, "Board");
        let names: Vec<&str> = board.candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Bo"]);

        let stored = Candidate::for_election(&candidates, board.id).await.unwrap();
        assert_eq!(stored.len(), 2);

        // Photos are kept, bare names have none.
        let treasurer = create_election(&client, &ElectionSpec::example2()).await;
        assert_ne!(treasurer.id, board.id);
        assert!(treasurer.candidates[0].photo_url.is_some());
        assert!(treasurer.candidates[1].photo_url.is_none());
    }

    #[backend_test(admin)]
    async fn invalid_elections_are_rejected(client: Client, db: Database) {
        let duplicate = serde_json::json!({"title": "Board", "candidates": ["Ann", "Ann"]});
        let response = post_json(&client, uri!(create_election), &duplicate).await;
        assert_error(response, ErrorKind::InvalidInput).await;

        let untitled = serde_json::json!({"title": "", "candidates": ["Ann"]});
        let response = post_json(&client, uri!(create_election), &untitled).await;
        assert_error(response, ErrorKind::InvalidInput).await;

        let elections = Coll::<Election>::from_db(&db);
        let candidates = Coll::<Candidate>::from_db(&db);
        assert_eq!(elections.count_documents(None, None).await.unwrap(), 0);
        assert_eq!(candidates.count_documents(None, None).await.unwrap(), 0);
    }

    #[backend_test(voter)]
    async fn voters_cannot_administer(client: Client, db: Database) {
        let response = post_json(&client, uri!(create_election), &ElectionSpec::example()).await;
        assert_error(response, ErrorKind::Forbidden).await;

        // Nothing was persisted.
        let elections = Coll::<Election>::from_db(&db);
        let candidates = Coll::<Candidate>::from_db(&db);
        assert_eq!(elections.count_documents(None, None).await.unwrap(), 0);
        assert_eq!(candidates.count_documents(None, None).await.unwrap(), 0);

        for uri in [uri!(list_users), uri!(user_count), uri!(get_settings)] {
            let response = client.get(uri).dispatch().await;
            assert_error(response, ErrorKind::Forbidden).await;
        }
        let response = client.delete(uri!(remove_candidate(1))).dispatch().await;
        assert_error(response, ErrorKind::Forbidden).await;
    }

    #[backend_test]
    async fn anonymous_users_cannot_administer(client: Client) {
        let response = post_json(&client, uri!(create_election), &ElectionSpec::example()).await;
        assert_error(response, ErrorKind::Unauthorized).await;
    }

    #[backend_test(admin)]
    async fn add_and_remove_candidates(client: Client) {
        let board = create_election(&client, &ElectionSpec::example()).await;

        let cy = NewCandidate {
            name: "Cy".to_string(),
            photo_url: Some("cy.png".to_string()),
        };
        let response = post_json(&client, uri!(add_candidate(board.id)), &cy).await;
        assert_eq!(response.status(), Status::Ok);
        let added: CandidateDescription = read_json(response).await;
        assert_eq!(added.name, "Cy");

        // Names are unique within the election.
        let response = post_json(&client, uri!(add_candidate(board.id)), &cy).await;
        assert_error(response, ErrorKind::InvalidInput).await;

        // Unknown elections.
        let response = post_json(&client, uri!(add_candidate(board.id + 100)), &cy).await;
        assert_error(response, ErrorKind::NotFound).await;

        // Removal.
        let response = client
            .delete(uri!(remove_candidate(added.id)))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let response = client
            .delete(uri!(remove_candidate(added.id)))
            .dispatch()
            .await;
        assert_error(response, ErrorKind::NotFound).await;

        let response = client.get(format!("/elections/{}", board.id)).dispatch().await;
        let board: ElectionDescription = read_json(response).await;
        assert_eq!(board.candidates.len(), 2);
    }

    #[backend_test(admin)]
    async fn users_are_listed_without_credentials(client: Client) {
        register_and_login(&client, Credentials::example_voter()).await;
        login(&client, Credentials::example_super_admin()).await;

        let response = client.get(uri!(list_users)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        assert!(!body.contains("password"));
        let users: Vec<UserDescription> = serde_json::from_str(&body).unwrap();
        let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["kantwi", "x@dktawa.org"]);

        let response = client.get(uri!(user_count)).dispatch().await;
        let count: UserCount = read_json(response).await;
        assert_eq!(count.count, 2);
    }

    #[backend_test(admin)]
    async fn settings_round_trip(client: Client) {
        let response = client.get(uri!(get_settings)).dispatch().await;
        assert_eq!(response.into_string().await.unwrap(), "{}");

        let mail = MailSettings::example_unreachable();
        let response = client
            .put(uri!(put_settings))
            .header(rocket::http::ContentType::JSON)
            .body(serde_json::to_string(&mail).unwrap())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.get(uri!(get_settings)).dispatch().await;
        let stored: SettingsResponse = read_json(response).await;
        assert_eq!(stored, SettingsResponse::Stored(mail));
    }
}
