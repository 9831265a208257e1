//! SMTP invitation notifier using the `lettre` crate.

use async_trait::async_trait;
use edsetu_application::{InvitationNotice, InvitationNotifier};
use edsetu_core::{AppError, AppResult};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::warn;

use crate::invitation_message;

/// SMTP notifier configuration.
#[derive(Clone)]
pub struct SmtpNotifierConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// SMTP username.
    pub username: String,
    /// SMTP password.
    pub password: String,
    /// Sender email address.
    pub from_address: String,
}

/// Production notifier that delivers invitations by email.
///
/// Phone-only invitations are skipped with a warning; there is no SMS channel.
#[derive(Clone)]
pub struct SmtpInvitationNotifier {
    config: SmtpNotifierConfig,
}

impl SmtpInvitationNotifier {
    /// Creates a new SMTP notifier.
    #[must_use]
    pub fn new(config: SmtpNotifierConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl InvitationNotifier for SmtpInvitationNotifier {
    async fn send_invitation(&self, notice: &InvitationNotice) -> AppResult<()> {
        let Some(to) = notice.email.as_deref() else {
            warn!(
                invitation_id = %notice.invitation_id,
                "invitation has no email channel; skipping smtp delivery"
            );
            return Ok(());
        };

        let from = self
            .config
            .from_address
            .parse()
            .map_err(|error| AppError::Internal(format!("invalid from address: {error}")))?;

        let to_mailbox = to
            .parse()
            .map_err(|error| AppError::Internal(format!("invalid recipient address: {error}")))?;

        let message = Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(invitation_message::subject(notice))
            .header(ContentType::TEXT_PLAIN)
            .body(invitation_message::body(notice))
            .map_err(|error| AppError::Internal(format!("failed to build email: {error}")))?;

        let credentials =
            Credentials::new(self.config.username.clone(), self.config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
            .map_err(|error| {
                AppError::Internal(format!("failed to create SMTP transport: {error}"))
            })?
            .port(self.config.port)
            .credentials(credentials)
            .build();

        mailer
            .send(message)
            .await
            .map_err(|error| AppError::Internal(format!("failed to send invitation: {error}")))?;

        Ok(())
    }
}
