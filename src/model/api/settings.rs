use serde::{Deserialize, Serialize};

use crate::model::db::settings::{MailSettings, Settings};

/// The stored mail settings, or an empty object if there are none yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingsResponse {
    Stored(MailSettings),
    Empty {},
}

impl From<Option<Settings>> for SettingsResponse {
    fn from(settings: Option<Settings>) -> Self {
        match settings {
            Some(settings) => Self::Stored(settings.mail),
            None => Self::Empty {},
        }
    }
}
