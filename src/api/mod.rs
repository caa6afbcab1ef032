use rocket::{http::Status, serde::json::Json, Catcher, Request, Route};

use crate::error::{ErrorBody, ErrorKind};

mod admin;
pub(crate) mod auth;
mod public;
mod report;
mod voter;

#[cfg(test)]
mod common;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(public::routes());
    routes.extend(auth::routes());
    routes.extend(admin::routes());
    routes.extend(voter::routes());
    routes.extend(report::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}

/// Give errors raised outside our handlers (failed guards, unknown routes,
/// malformed bodies) the same JSON shape as everything else.
#[catch(default)]
fn default_catcher(status: Status, _req: &Request) -> (Status, Json<ErrorBody>) {
    let kind = ErrorKind::from_status(status);
    let message = status.reason().unwrap_or("Unknown error").to_string();
    (status, Json(ErrorBody { kind, message }))
}
