//! Console invitation notifier for development. Logs notices to tracing output.

use async_trait::async_trait;
use edsetu_application::{InvitationNotice, InvitationNotifier};
use edsetu_core::AppResult;
use tracing::info;

use crate::invitation_message;

/// Development notifier that logs invitations to the console.
#[derive(Clone, Default)]
pub struct ConsoleInvitationNotifier;

impl ConsoleInvitationNotifier {
    /// Creates a new console notifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl InvitationNotifier for ConsoleInvitationNotifier {
    async fn send_invitation(&self, notice: &InvitationNotice) -> AppResult<()> {
        info!(
            invitation_id = %notice.invitation_id,
            email = notice.email.as_deref().unwrap_or("-"),
            phone = notice.phone.as_deref().unwrap_or("-"),
            "--- INVITATION (console) ---\nSubject: {}\n\n{}\n--- END INVITATION ---",
            invitation_message::subject(notice),
            invitation_message::body(notice)
        );

        Ok(())
    }
}
