//! Helpers shared by the endpoint tests.

use rocket::{
    http::{ContentType, Status},
    local::asynchronous::{Client, LocalResponse},
    serde::json::serde_json,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{ErrorBody, ErrorKind};
use crate::model::api::{
    auth::{Credentials, RegisterRequest},
    election::{ElectionDescription, ElectionSpec},
};

use super::{admin, auth};

/// POST a JSON body.
pub async fn post_json<'c>(
    client: &'c Client,
    uri: impl std::fmt::Display,
    body: &impl Serialize,
) -> LocalResponse<'c> {
    client
        .post(uri.to_string())
        .header(ContentType::JSON)
        .body(serde_json::to_string(body).unwrap())
        .dispatch()
        .await
}

/// Read a JSON response body.
pub async fn read_json<T: DeserializeOwned>(response: LocalResponse<'_>) -> T {
    serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
}

/// Check that a response failed with the given error kind.
pub async fn assert_error(response: LocalResponse<'_>, kind: ErrorKind) {
    assert_eq!(response.status(), kind.status());
    let body: ErrorBody = read_json(response).await;
    assert_eq!(body.kind, kind);
}

/// Register a user and log them in, replacing any current login.
pub async fn register_and_login(client: &Client, credentials: Credentials) {
    let response = post_json(
        client,
        uri!(auth::register),
        &RegisterRequest::from(credentials.clone()),
    )
    .await;
    assert_eq!(response.status(), Status::Ok);
    login(client, credentials).await;
}

/// Log an existing user in.
pub async fn login(client: &Client, credentials: Credentials) {
    let response = post_json(client, uri!(auth::login), &credentials).await;
    assert_eq!(response.status(), Status::Ok);
}

/// Create an election as the logged-in admin.
pub async fn create_election(client: &Client, spec: &ElectionSpec) -> ElectionDescription {
    let response = post_json(client, uri!(admin::create_election), spec).await;
    assert_eq!(response.status(), Status::Ok);
    read_json(response).await
}
