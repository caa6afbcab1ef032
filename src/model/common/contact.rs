use std::fmt::{Display, Formatter};
use std::{ops::Deref, str::FromStr};

use lettre::Address;
use phonenumber::PhoneNumber;
use serde::{Deserialize, Serialize};

/// How a user wants to be told that their vote was recorded.
///
/// Stored on the user at registration time; users without one are never
/// notified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Contact {
    Email(Address),
    Sms(Sms),
}

impl Contact {
    /// The contact implied by a username, if the username is itself a valid
    /// email address.
    pub fn from_username(username: &str) -> Option<Self> {
        username.parse::<Address>().ok().map(Contact::Email)
    }
}

impl Display for Contact {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Email(address) => write!(f, "email {address}"),
            Self::Sms(sms) => write!(f, "SMS {sms}"),
        }
    }
}

/// A phone number that can receive SMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sms {
    inner: PhoneNumber,
}

impl Deref for Sms {
    type Target = PhoneNumber;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Display for Sms {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl FromStr for Sms {
    type Err = phonenumber::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Sms {
            inner: s.parse::<PhoneNumber>()?,
        })
    }
}

impl TryFrom<String> for Sms {
    type Error = phonenumber::ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Sms> for String {
    fn from(sms: Sms) -> Self {
        sms.to_string()
    }
}
