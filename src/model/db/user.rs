use std::ops::{Deref, DerefMut};
use std::sync::OnceLock;

use argon2::Config as Argon2Config;
use mongodb::{bson::doc, options::FindOptions};
use rand::Rng;
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    api::auth::{ChangePasswordRequest, Credentials, RegisterRequest},
    common::{contact::Contact, policy::RegistrationPolicy, role::Role},
    mongodb::{is_duplicate_key_error, Coll, Id},
};

/// Hash checked when the username is unknown, so that a failed login takes
/// the same time whichever half of the credentials was wrong. It must use
/// the same parameters as [`hash_password`].
fn dummy_hash() -> &'static str {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();
    DUMMY_HASH.get_or_init(|| hash_password("").unwrap_or_default())
}

const BAD_CREDENTIALS: &str = "Invalid username or password";

/// Core user data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCore {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
}

impl UserCore {
    /// Turn a registration request into a user, applying the registration
    /// policy and hashing the password. Uniqueness of the username is left
    /// to the database.
    pub fn register(request: RegisterRequest, policy: &RegistrationPolicy) -> Result<Self> {
        let RegisterRequest {
            username,
            password,
            contact,
        } = request;
        if username.is_empty() || password.is_empty() {
            return Err(Error::InvalidInput(
                "Missing username or password".to_string(),
            ));
        }
        if !policy.permits(&username) {
            return Err(Error::PolicyViolation(format!(
                "only {} or {} addresses may register",
                policy.super_admin(),
                policy.allowed_domain()
            )));
        }

        let contact = contact.or_else(|| Contact::from_username(&username));
        Ok(Self {
            role: policy.role_for(&username),
            password_hash: hash_password(&password)?,
            username,
            contact,
        })
    }

    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap_or(false)
    }
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    // 16 bytes is recommended for password hashing:
    //  https://en.wikipedia.org/wiki/Argon2
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    Ok(argon2::hash_encoded(
        password.as_bytes(),
        &salt,
        &Argon2Config::default(),
    )?)
}

/// A user without an ID.
pub type NewUser = UserCore;

/// A user from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub user: UserCore,
}

impl Deref for User {
    type Target = UserCore;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl DerefMut for User {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.user
    }
}

impl User {
    /// Insert a newly registered user, failing with [`Error::Conflict`] if
    /// the username is taken.
    pub async fn insert(users: &Coll<User>, user: NewUser) -> Result<User> {
        let username = user.username.clone();
        let conflict = || Error::Conflict(format!("Username already exists: {username}"));
        if Self::by_username(users, &username).await?.is_some() {
            return Err(conflict());
        }

        // The unique index settles races between concurrent registrations.
        let user = User {
            id: Id::new(),
            user,
        };
        let result = users.insert_one(&user, None).await;
        match result {
            Ok(_) => Ok(user),
            Err(e) if is_duplicate_key_error(&e) => Err(conflict()),
            Err(e) => Err(e.into()),
        }
    }

    /// Every user, in registration order.
    pub async fn all(users: &Coll<User>) -> Result<Vec<User>> {
        let sort = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        Ok(users.find(None, sort).await?.try_collect().await?)
    }

    /// Find a user by username.
    pub async fn by_username(users: &Coll<User>, username: &str) -> Result<Option<User>> {
        Ok(users.find_one(doc! { "username": username }, None).await?)
    }

    /// Check a username and password. Unknown usernames and wrong passwords
    /// fail identically.
    pub async fn authenticate(users: &Coll<User>, credentials: &Credentials) -> Result<User> {
        match Self::by_username(users, &credentials.username).await? {
            Some(user) if user.verify_password(&credentials.password) => Ok(user),
            Some(_) => Err(Error::Unauthorized(BAD_CREDENTIALS.to_string())),
            None => {
                let _ = argon2::verify_encoded(dummy_hash(), credentials.password.as_bytes());
                Err(Error::Unauthorized(BAD_CREDENTIALS.to_string()))
            }
        }
    }

    /// Replace a user's password, given their current one.
    pub async fn change_password(users: &Coll<User>, request: ChangePasswordRequest) -> Result<()> {
        if request.username.is_empty()
            || request.current_password.is_empty()
            || request.new_password.is_empty()
        {
            return Err(Error::InvalidInput("Missing required fields".to_string()));
        }
        let credentials = Credentials {
            username: request.username,
            password: request.current_password,
        };
        let user = Self::authenticate(users, &credentials).await?;

        let update = doc! {
            "$set": { "password_hash": hash_password(&request.new_password)? }
        };
        users.update_one(user.id.as_doc(), update, None).await?;
        Ok(())
    }

    /// Set a user's password without knowing the current one. This is for
    /// operators recovering the super-admin account.
    pub async fn reset_password(
        users: &Coll<User>,
        username: &str,
        new_password: &str,
    ) -> Result<()> {
        if new_password.is_empty() {
            return Err(Error::InvalidInput("Password is empty".to_string()));
        }
        let update = doc! {
            "$set": { "password_hash": hash_password(new_password)? }
        };
        let result = users
            .update_one(doc! { "username": username }, update, None)
            .await?;
        if result.matched_count == 0 {
            Err(Error::not_found(format!("User '{username}'")))
        } else {
            Ok(())
        }
    }

    /// Load the user with the given ID and check they have the given role.
    ///
    /// Every admin-only operation starts with this check.
    pub async fn require_role(users: &Coll<User>, id: Id, role: Role) -> Result<User> {
        users
            .find_one(id.as_doc(), None)
            .await?
            .filter(|user| user.role == role)
            .ok_or_else(|| Error::Forbidden(format!("{role} role required")))
    }

    /// Load the user with the given ID and check they are the designated
    /// super-admin. Being an admin is not enough.
    pub async fn require_super_admin(
        users: &Coll<User>,
        id: Id,
        policy: &RegistrationPolicy,
    ) -> Result<User> {
        let user = Self::require_role(users, id, Role::Admin)
            .await
            .map_err(|_| Error::Forbidden("super-admin only".to_string()))?;
        if policy.is_super_admin(&user.username) {
            Ok(user)
        } else {
            Err(Error::Forbidden("super-admin only".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: &str) -> Result<UserCore> {
        let request = RegisterRequest {
            username: username.to_string(),
            password: "hunter2".to_string(),
            contact: None,
        };
        UserCore::register(request, &RegistrationPolicy::example())
    }

    #[test]
    fn registration_assigns_roles() {
        let admin = register("kantwi").unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.contact, None);

        let user = register("x@dktawa.org").unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.contact, Contact::from_username("x@dktawa.org"));
    }

    /// The `$argon2i$v=19$m=..,t=..,p=..` prefix of an encoded hash.
    fn hash_params(encoded: &str) -> String {
        encoded.split('$').take(4).collect::<Vec<_>>().join("$")
    }

    #[test]
    fn unknown_users_cost_a_full_hash() {
        let real = hash_password("hunter2").unwrap();
        assert_eq!(hash_params(dummy_hash()), hash_params(&real));
        assert!(hash_params(&real).contains("t=3"));
    }

    #[test]
    fn registration_hashes_passwords() {
        let user = register("x@dktawa.org").unwrap();
        assert_ne!(user.password_hash, "hunter2");
        assert!(user.verify_password("hunter2"));
        assert!(!user.verify_password("hunter3"));

        // Salts differ between users.
        let other = register("y@dktawa.org").unwrap();
        assert_ne!(user.password_hash, other.password_hash);
    }

    #[test]
    fn registration_policy_applies_regardless_of_password() {
        for password in ["a", "a very long and very strong passphrase 123!"] {
            let request = RegisterRequest {
                username: "x@example.org".to_string(),
                password: password.to_string(),
                contact: None,
            };
            let result = UserCore::register(request, &RegistrationPolicy::example());
            assert!(matches!(result, Err(Error::PolicyViolation(_))));
        }
    }

    #[test]
    fn registration_requires_fields() {
        let request = RegisterRequest {
            username: "x@dktawa.org".to_string(),
            password: String::new(),
            contact: None,
        };
        let result = UserCore::register(request, &RegistrationPolicy::example());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn explicit_contact_wins() {
        let sms = Contact::Sms("+441234567890".parse().unwrap());
        let request = RegisterRequest {
            username: "x@dktawa.org".to_string(),
            password: "hunter2".to_string(),
            contact: Some(sms.clone()),
        };
        let user = UserCore::register(request, &RegistrationPolicy::example()).unwrap();
        assert_eq!(user.contact, Some(sms));
    }

    #[test]
    fn corrupt_hash_never_verifies() {
        let mut user = register("x@dktawa.org").unwrap();
        user.password_hash = "garbage".to_string();
        assert!(!user.verify_password("hunter2"));
    }

    #[backend_test]
    async fn duplicate_usernames_conflict(users: Coll<User>) {
        let user = register("x@dktawa.org").unwrap();
        User::insert(&users, user.clone()).await.unwrap();
        let result = User::insert(&users, user).await;
        assert!(matches!(result, Err(Error::Conflict(_))));
        assert_eq!(users.count_documents(None, None).await.unwrap(), 1);
    }

    #[backend_test]
    async fn role_checks(users: Coll<User>) {
        let policy = RegistrationPolicy::example();
        let admin = User::insert(&users, register("kantwi").unwrap())
            .await
            .unwrap();
        let voter = User::insert(&users, register("x@dktawa.org").unwrap())
            .await
            .unwrap();

        // Admin role.
        assert!(User::require_role(&users, admin.id, Role::Admin).await.is_ok());
        let result = User::require_role(&users, voter.id, Role::Admin).await;
        assert!(matches!(result, Err(Error::Forbidden(_))));
        let result = User::require_role(&users, Id::new(), Role::Admin).await;
        assert!(matches!(result, Err(Error::Forbidden(_))));

        // Super-admin.
        assert!(User::require_super_admin(&users, admin.id, &policy)
            .await
            .is_ok());
        let result = User::require_super_admin(&users, voter.id, &policy).await;
        assert!(matches!(result, Err(Error::Forbidden(_))));

        // An admin who isn't the designated handle is not the super-admin.
        let other_policy = RegistrationPolicy::new("someone-else", "@dktawa.org");
        let result = User::require_super_admin(&users, admin.id, &other_policy).await;
        assert!(matches!(result, Err(Error::Forbidden(_))));
    }

    #[backend_test]
    async fn authenticate_and_change_password(users: Coll<User>) {
        let user = User::insert(&users, register("x@dktawa.org").unwrap())
            .await
            .unwrap();

        let good = Credentials {
            username: "x@dktawa.org".to_string(),
            password: "hunter2".to_string(),
        };
        assert_eq!(User::authenticate(&users, &good).await.unwrap().id, user.id);

        // Wrong password and unknown user look the same.
        let wrong_password = Credentials {
            password: "nope".to_string(),
            ..good.clone()
        };
        let unknown_user = Credentials {
            username: "y@dktawa.org".to_string(),
            ..good.clone()
        };
        let a = User::authenticate(&users, &wrong_password).await.unwrap_err();
        let b = User::authenticate(&users, &unknown_user).await.unwrap_err();
        assert_eq!(a.to_string(), b.to_string());

        // Rotating requires the current password.
        let request = ChangePasswordRequest {
            username: "x@dktawa.org".to_string(),
            current_password: "nope".to_string(),
            new_password: "correct horse".to_string(),
        };
        let result = User::change_password(&users, request).await;
        assert!(matches!(result, Err(Error::Unauthorized(_))));

        let request = ChangePasswordRequest {
            username: "x@dktawa.org".to_string(),
            current_password: "hunter2".to_string(),
            new_password: "correct horse".to_string(),
        };
        User::change_password(&users, request).await.unwrap();
        assert!(User::authenticate(&users, &good).await.is_err());
        let rotated = Credentials {
            password: "correct horse".to_string(),
            ..good
        };
        assert!(User::authenticate(&users, &rotated).await.is_ok());
    }

    #[backend_test]
    async fn reset_password(users: Coll<User>) {
        let result = User::reset_password(&users, "kantwi", "fresh").await;
        assert!(matches!(result, Err(Error::NotFound(_))));

        User::insert(&users, register("kantwi").unwrap()).await.unwrap();
        User::reset_password(&users, "kantwi", "fresh").await.unwrap();
        let credentials = Credentials {
            username: "kantwi".to_string(),
            password: "fresh".to_string(),
        };
        assert!(User::authenticate(&users, &credentials).await.is_ok());

        let result = User::reset_password(&users, "kantwi", "").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
