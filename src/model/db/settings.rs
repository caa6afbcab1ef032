use mongodb::{bson::doc, options::ReplaceOptions};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::mongodb::Coll;

/// The fixed ID of the settings document.
pub const SETTINGS_ID: &str = "mail";

/// How to reach the SMTP relay that sends vote confirmations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_user: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    /// Upgrade the connection with STARTTLS.
    #[serde(default = "default_tls")]
    pub smtp_tls: bool,
}

fn default_tls() -> bool {
    true
}

/// The singleton settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "_id")]
    id: String,
    #[serde(flatten)]
    pub mail: MailSettings,
}

impl Settings {
    /// Load the settings, if they have ever been stored.
    pub async fn get(settings: &Coll<Settings>) -> Result<Option<Settings>> {
        Ok(settings.find_one(doc! { "_id": SETTINGS_ID }, None).await?)
    }

    /// Store the settings, replacing any previous ones.
    pub async fn put(settings: &Coll<Settings>, mail: MailSettings) -> Result<()> {
        let document = Settings {
            id: SETTINGS_ID.to_string(),
            mail,
        };
        let upsert = ReplaceOptions::builder().upsert(true).build();
        settings
            .replace_one(doc! { "_id": SETTINGS_ID }, &document, upsert)
            .await?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls_defaults_on() {
        let settings: MailSettings = rocket::serde::json::serde_json::from_str(
            r#"{"smtp_host": "mail", "smtp_port": 587, "smtp_from": "a@dktawa.org"}"#,
        )
        .unwrap();
        assert!(settings.smtp_tls);
        assert_eq!(settings.smtp_user, None);
    }

    #[backend_test]
    async fn settings_are_a_singleton(settings: Coll<Settings>) {
        assert_eq!(Settings::get(&settings).await.unwrap(), None);

        let mut mail = MailSettings::example_unreachable();
        Settings::put(&settings, mail.clone()).await.unwrap();
        mail.smtp_port = 2525;
        Settings::put(&settings, mail.clone()).await.unwrap();

        assert_eq!(settings.count_documents(None, None).await.unwrap(), 1);
        let stored = Settings::get(&settings).await.unwrap().unwrap();
        assert_eq!(stored.mail, mail);
    }
}
