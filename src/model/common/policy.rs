use serde::{Deserialize, Serialize};

use super::role::Role;

/// Who may register, and who the super-admin is.
///
/// Exactly one handle is the super-admin: it is the only account that
/// registers as an admin, the only one allowed to read full results, and
/// it never counts as a voter. Every other username must end with the
/// allowed domain suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationPolicy {
    super_admin: String,
    allowed_domain: String,
}

impl RegistrationPolicy {
    pub fn new(super_admin: impl Into<String>, allowed_domain: impl Into<String>) -> Self {
        Self {
            super_admin: super_admin.into(),
            allowed_domain: allowed_domain.into(),
        }
    }

    pub fn super_admin(&self) -> &str {
        &self.super_admin
    }

    pub fn allowed_domain(&self) -> &str {
        &self.allowed_domain
    }

    /// Is this username the designated super-admin?
    pub fn is_super_admin(&self, username: &str) -> bool {
        username == self.super_admin
    }

    /// May an account with this username be registered?
    pub fn permits(&self, username: &str) -> bool {
        self.is_super_admin(username)
            || (username.len() > self.allowed_domain.len()
                && username.ends_with(&self.allowed_domain))
    }

    /// The role a newly registered account with this username receives.
    pub fn role_for(&self, username: &str) -> Role {
        if self.is_super_admin(username) {
            Role::Admin
        } else {
            Role::User
        }
    }

    /// Does this account count towards turnout?
    pub fn is_eligible_voter(&self, username: &str) -> bool {
        !self.is_super_admin(username)
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl RegistrationPolicy {
        pub fn example() -> Self {
            Self::new("kantwi", "@dktawa.org")
        }
    }
}
