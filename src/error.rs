use std::fmt::Display;

use argon2::Error as Argon2Error;
use jsonwebtoken::errors::Error as JwtError;
use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything a request can fail with. The domain variants are always
/// reported to the caller; the wrapped infrastructure errors are logged and
/// reported as [`ErrorKind::Internal`].
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Registration restricted: {0}")]
    PolicyViolation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Already voted: {0}")]
    AlreadyVoted(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Shorthand for a [`Error::NotFound`] naming the missing thing.
    pub fn not_found(what: impl Display) -> Self {
        Self::NotFound(format!("{what} does not exist"))
    }

    /// The caller-visible category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) | Self::Jwt(_) | Self::Argon2(_) => ErrorKind::Internal,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::PolicyViolation(_) => ErrorKind::PolicyViolation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::AlreadyVoted(_) => ErrorKind::AlreadyVoted,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// Error categories, as reported in the `kind` field of an error response.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInput,
    PolicyViolation,
    Conflict,
    AlreadyVoted,
    Unauthorized,
    Forbidden,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> Status {
        match self {
            Self::InvalidInput | Self::PolicyViolation => Status::BadRequest,
            Self::Conflict | Self::AlreadyVoted => Status::Conflict,
            Self::Unauthorized => Status::Unauthorized,
            Self::Forbidden => Status::Forbidden,
            Self::NotFound => Status::NotFound,
            Self::Internal => Status::InternalServerError,
        }
    }

    /// The kind used for a bare status code produced outside our handlers,
    /// e.g. by a failing request guard.
    pub fn from_status(status: Status) -> Self {
        match status.code {
            400 | 422 => Self::InvalidInput,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            _ => Self::Internal,
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let kind = self.kind();
        let message = if kind == ErrorKind::Internal {
            error!("{self}");
            "Internal server error".to_string()
        } else {
            debug!("{self}");
            self.to_string()
        };
        (kind.status(), Json(ErrorBody { kind, message })).respond_to(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = vec![
            (Error::InvalidInput("x".into()), Status::BadRequest),
            (Error::PolicyViolation("x".into()), Status::BadRequest),
            (Error::Conflict("x".into()), Status::Conflict),
            (Error::AlreadyVoted("x".into()), Status::Conflict),
            (Error::Unauthorized("x".into()), Status::Unauthorized),
            (Error::Forbidden("x".into()), Status::Forbidden),
            (Error::not_found("Election 3"), Status::NotFound),
        ];
        for (error, status) in cases {
            assert_eq!(error.kind().status(), status, "{error}");
        }
    }

    #[test]
    fn guard_statuses_have_kinds() {
        assert_eq!(
            ErrorKind::from_status(Status::Unauthorized),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            ErrorKind::from_status(Status::UnprocessableEntity),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            ErrorKind::from_status(Status::ServiceUnavailable),
            ErrorKind::Internal
        );
    }
}
