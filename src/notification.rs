//! Best-effort vote confirmations.
//!
//! A confirmation is sent after the vote has been stored, so nothing here
//! can change whether a vote counts. Every failure ends up as a message in
//! [`NotificationOutcome`].

use std::time::Duration;

use aws_sdk_sns::Client as SnsClient;
use lettre::{
    address::AddressError,
    message::{header::ContentType, Mailbox},
    transport::smtp::{authentication::Credentials, Error as SmtpError},
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use crate::model::{
    common::contact::{Contact, Sms},
    db::{
        settings::{MailSettings, Settings},
        user::User,
        vote::CastVote,
    },
    mongodb::Coll,
};

/// How the confirmation for one vote went.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationOutcome {
    pub sent: bool,
    pub error: Option<String>,
}

#[derive(Debug, Error)]
enum NotifyError {
    #[error("could not load mail settings: {0}")]
    Settings(#[from] crate::error::Error),
    #[error("invalid sender address: {0}")]
    Sender(#[from] AddressError),
    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] SmtpError),
    #[error("SMS delivery failed: {0}")]
    Sns(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Tell a voter that their vote was recorded, through their stored contact
/// method. Users without one are skipped, as are email contacts while no
/// mail settings have been stored.
pub async fn notify_voter(
    user: &User,
    cast: &CastVote,
    settings: &Coll<Settings>,
    sns: &SnsClient,
    timeout: Duration,
) -> NotificationOutcome {
    let Some(contact) = &user.contact else {
        return NotificationOutcome::default();
    };

    let attempt = deliver(contact, user, cast, settings, sns, timeout);
    let result = match rocket::tokio::time::timeout(timeout, attempt).await {
        Ok(result) => result,
        Err(_) => Err(NotifyError::Timeout(timeout)),
    };
    match result {
        Ok(sent) => {
            if sent {
                info!("Sent vote confirmation to {contact}");
            }
            NotificationOutcome { sent, error: None }
        }
        Err(e) => {
            warn!("Failed to send vote confirmation to {contact}: {e}");
            NotificationOutcome {
                sent: false,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Send the confirmation, returning whether anything was sent.
async fn deliver(
    contact: &Contact,
    user: &User,
    cast: &CastVote,
    settings: &Coll<Settings>,
    sns: &SnsClient,
    timeout: Duration,
) -> Result<bool, NotifyError> {
    match contact {
        Contact::Email(address) => match Settings::get(settings).await? {
            Some(stored) => {
                send_email(&stored.mail, address, user, cast, timeout).await?;
                Ok(true)
            }
            None => {
                debug!("No mail settings stored, not emailing {address}");
                Ok(false)
            }
        },
        Contact::Sms(sms) => {
            send_sms(sns, sms, cast).await?;
            Ok(true)
        }
    }
}

fn confirmation_text(user: &User, cast: &CastVote) -> String {
    format!(
        "Dear {},\n\nYour vote for '{}' in the '{}' election has been received.\n\nThank you for voting!",
        user.username, cast.candidate.name, cast.election.title
    )
}

async fn send_email(
    mail: &MailSettings,
    to: &Address,
    user: &User,
    cast: &CastVote,
    timeout: Duration,
) -> Result<(), NotifyError> {
    let message = Message::builder()
        .from(Mailbox::new(None, mail.smtp_from.parse()?))
        .to(Mailbox::new(None, to.clone()))
        .subject(format!("Vote Confirmation: {}", cast.election.title))
        .header(ContentType::TEXT_PLAIN)
        .body(confirmation_text(user, cast))?;

    let builder = if mail.smtp_tls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&mail.smtp_host)?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&mail.smtp_host)
    };
    let mut builder = builder.port(mail.smtp_port).timeout(Some(timeout));
    if let (Some(username), Some(password)) = (&mail.smtp_user, &mail.smtp_password) {
        builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
    }

    builder.build().send(message).await?;
    Ok(())
}

#[cfg_attr(test, allow(unused_variables))]
async fn send_sms(sns: &SnsClient, sms: &Sms, cast: &CastVote) -> Result<(), NotifyError> {
    #[cfg(not(test))]
    sns.publish()
        .phone_number(sms.to_string())
        .message(format!(
            "Your vote in '{}' has been received.",
            cast.election.title
        ))
        .send()
        .await
        .map_err(|e| NotifyError::Sns(e.to_string()))?;

    Ok(())
}
