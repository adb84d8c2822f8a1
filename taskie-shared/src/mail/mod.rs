/// Outgoing mail
///
/// The API only sends one kind of mail: the password reset link. Delivery is
/// behind the [`Mailer`] trait so handlers can be exercised with an in-memory
/// recorder; production uses [`sendgrid::SendGridMailer`].
///
/// # Example
///
/// ```no_run
/// use taskie_shared::mail::{password_reset_email, Mailer, Sender};
/// use taskie_shared::mail::sendgrid::SendGridMailer;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = SendGridMailer::new("SG.key", Sender::default());
/// let message = password_reset_email("ada@example.com", "http://localhost:3000", "token");
/// mailer.send(&message).await?;
/// # Ok(())
/// # }
/// ```

pub mod sendgrid;

use async_trait::async_trait;
use std::fmt;

/// From-address used when none is configured
pub const DEFAULT_FROM_EMAIL: &str = "recovery.taskie@gmail.com";
pub const DEFAULT_FROM_NAME: &str = "Taskie";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Failed to reach mail provider: {0}")]
    Transport(String),

    /// Provider answered with a non-success status
    #[error("Mail provider rejected message: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Sender identity shown to recipients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub email: String,
    pub name: String,
}

impl Default for Sender {
    fn default() -> Self {
        Self {
            email: DEFAULT_FROM_EMAIL.to_string(),
            name: DEFAULT_FROM_NAME.to_string(),
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivers a message or reports why it could not
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}

/// Link the client app serves for choosing a new password
pub fn reset_link(client_url: &str, token: &str) -> String {
    format!("{}/reset-password/{}", client_url.trim_end_matches('/'), token)
}

/// Builds the password reset email for `to`
pub fn password_reset_email(to: &str, client_url: &str, token: &str) -> MailMessage {
    let link = reset_link(client_url, token);

    let html = format!(
        r#"<!DOCTYPE html>
<html style="background-color: #171717; color: #ededed; font-family: Arial, sans-serif;">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Reset Password</title>
</head>
<body style="margin: 0; padding: 0;">
  <table width="100%" cellpadding="0" cellspacing="0" border="0">
    <tr>
      <td align="center" style="padding: 20px 0;">
        <table cellpadding="0" cellspacing="0" border="0" style="max-width: 300px; background-color: #27272A; border-radius: 8px; padding: 24px;">
          <tr>
            <td style="text-align: center;">
              <h1 style="font-size: 24px; color: #ededed;">Reset your password</h1>
              <p style="font-size: 16px; color: #ededed;">Click the button below to reset your password. The link expires in 5 minutes.</p>
              <a href="{link}" style="display: inline-block; background-color: #F9C52B; color: #27272A; text-decoration: none; padding: 12px 24px; border-radius: 5px; font-weight: bold;">Reset password</a>
            </td>
          </tr>
          <tr>
            <td align="center" style="padding: 20px 0; font-size: 12px; color: #ededed;">
              If you did not request a password reset, please ignore this email.
            </td>
          </tr>
        </table>
      </td>
    </tr>
  </table>
</body>
</html>
"#
    );

    MailMessage {
        to: to.to_string(),
        subject: "Reset your password".to_string(),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_link() {
        assert_eq!(
            reset_link("http://localhost:3000", "abc"),
            "http://localhost:3000/reset-password/abc"
        );
        assert_eq!(
            reset_link("https://taskie.app/", "abc"),
            "https://taskie.app/reset-password/abc"
        );
    }

    #[test]
    fn test_password_reset_email() {
        let message = password_reset_email("ada@example.com", "http://localhost:3000", "tok.en.sig");

        assert_eq!(message.to, "ada@example.com");
        assert_eq!(message.subject, "Reset your password");
        assert!(message
            .html
            .contains(r#"href="http://localhost:3000/reset-password/tok.en.sig""#));
    }

    #[test]
    fn test_default_sender_display() {
        assert_eq!(Sender::default().to_string(), "Taskie <recovery.taskie@gmail.com>");
    }
}
