/// SendGrid v3 delivery
///
/// Posts to `https://api.sendgrid.com/v3/mail/send` with a bearer API key.
/// SendGrid answers `202 Accepted` on success.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{MailError, MailMessage, Mailer, Sender};

pub const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct SendGridMailer {
    client: reqwest::Client,
    api_key: String,
    sender: Sender,
    endpoint: String,
}

impl std::fmt::Debug for SendGridMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridMailer")
            .field("sender", &self.sender)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl SendGridMailer {
    pub fn new(api_key: impl Into<String>, sender: Sender) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            sender,
            endpoint: SENDGRID_ENDPOINT.to_string(),
        }
    }

    /// Points the mailer at another endpoint (a local stub, for instance)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 1],
}

fn request_body<'a>(sender: &'a Sender, message: &'a MailMessage) -> SendRequest<'a> {
    SendRequest {
        personalizations: [Personalization {
            to: [Address {
                email: &message.to,
                name: None,
            }],
        }],
        from: Address {
            email: &sender.email,
            name: Some(&sender.name),
        },
        subject: &message.subject,
        content: [Content {
            kind: "text/html",
            value: &message.html,
        }],
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        debug!(to = %message.to, subject = %message.subject, "Sending mail via SendGrid");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&request_body(&self.sender, message))
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "SendGrid rejected message");

        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
