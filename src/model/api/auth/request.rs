use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    common::{contact::Contact, role::Role},
    db::user::User,
};

/// A request to create an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// Where to send vote confirmations. Defaults to the username when that
    /// is an email address.
    #[serde(default)]
    pub contact: Option<Contact>,
}

/// A username and password.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// A request to rotate a password.
#[derive(Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub username: String,
    pub current_password: String,
    pub new_password: String,
}

/// Who just logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: ApiId,
    pub role: Role,
}

impl From<&User> for LoginResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.into(),
            role: user.role,
        }
    }
}
