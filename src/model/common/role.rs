use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// What a user is allowed to do.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May manage the election catalog, read reports and settings.
    Admin,
    /// May vote.
    User,
}

impl Display for Role {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Admin => "admin",
                Self::User => "user",
            }
        )
    }
}
