use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{
    errors::Error as JwtError, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use rocket::{
    http::{Cookie, SameSite, Status},
    outcome::try_outcome,
    request::{FromRequest, Outcome},
    time::Duration,
    Request,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::model::{
    common::role::Role,
    db::user::User,
    mongodb::{Coll, Id},
};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// An authentication token naming a user and the role they had when they
/// logged in.
///
/// The role is informational only: admin operations re-check the stored
/// user with [`User::require_role`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub id: Id,
    #[serde(rename = "rol")]
    pub role: Role,
}

impl AuthToken {
    /// Create a new [`AuthToken`] for the given user.
    pub fn new(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
        }
    }

    /// Sign this token and wrap it in a cookie.
    pub fn into_cookie(self, config: &Config) -> Result<Cookie<'static>, JwtError> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?;

        Ok(Cookie::build(AUTH_TOKEN_COOKIE, token)
            .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish())
    }

    /// Verify and decode a token from a cookie.
    pub fn from_cookie(cookie: &Cookie<'_>, config: &Config) -> Result<Self, JwtError> {
        jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    /// Get an [`AuthToken`] from the cookie and check that its user still
    /// exists. Any failure is reported as `401 Unauthorized`.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let unauthorized = |msg: &str| -> Outcome<Self, Error> {
            Outcome::Failure((Status::Unauthorized, Error::Unauthorized(msg.into())))
        };

        let Some(config) = req.rocket().state::<Config>() else {
            error!("No config in managed state");
            return Outcome::Failure((
                Status::InternalServerError,
                Error::Unauthorized("Authentication unavailable".into()),
            ));
        };
        let Some(cookie) = req.cookies().get(AUTH_TOKEN_COOKIE) else {
            return unauthorized("Not logged in");
        };
        let token = match Self::from_cookie(cookie, config) {
            Ok(token) => token,
            Err(e) => {
                debug!("Rejected auth token: {e}");
                return unauthorized("Invalid or expired login");
            }
        };

        // Check the user actually exists.
        let users = try_outcome!(req.guard::<Coll<User>>().await.map_failure(|(status, ())| {
            (status, Error::Unauthorized("Authentication unavailable".into()))
        }));
        match users.find_one(token.id.as_doc(), None).await {
            Ok(Some(_)) => Outcome::Success(token),
            Ok(None) => unauthorized("Unknown user"),
            Err(e) => Outcome::Failure((Status::InternalServerError, e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use rocket::figment::{providers::Serialized, Figment};

    use super::*;

    fn config(ttl: u32) -> Config {
        Figment::new()
            .merge(Serialized::default("super_admin", "kantwi"))
            .merge(Serialized::default("allowed_domain", "@dktawa.org"))
            .merge(Serialized::default("auth_ttl", ttl))
            .merge(Serialized::default("notify_timeout", 1))
            .merge(Serialized::default("jwt_secret", "test secret"))
            .extract()
            .unwrap()
    }

    fn token() -> AuthToken {
        AuthToken {
            id: Id::new(),
            role: Role::User,
        }
    }

    #[test]
    fn tokens_verify_with_the_same_secret() {
        let config = config(60);
        let token = token();
        let cookie = token.clone().into_cookie(&config).unwrap();
        assert_eq!(cookie.name(), AUTH_TOKEN_COOKIE);
        assert_eq!(AuthToken::from_cookie(&cookie, &config).unwrap(), token);
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let config = config(60);
        let cookie = token().into_cookie(&config).unwrap();
        let mut value = cookie.value().to_string();
        value.push('x');
        let tampered = Cookie::new(AUTH_TOKEN_COOKIE, value);
        assert!(AuthToken::from_cookie(&tampered, &config).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let config = config(60);
        // Beyond the default 60 second leeway.
        let claims = Claims {
            token: token(),
            expire_at: Utc::now() - chrono::Duration::seconds(120),
        };
        let value = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .unwrap();
        let cookie = Cookie::new(AUTH_TOKEN_COOKIE, value);
        assert!(AuthToken::from_cookie(&cookie, &config).is_err());
    }
}
