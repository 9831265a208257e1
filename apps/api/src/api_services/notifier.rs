use std::sync::Arc;

use edsetu_application::InvitationNotifier;
use edsetu_infrastructure::{
    ConsoleInvitationNotifier, SmtpInvitationNotifier, SmtpNotifierConfig,
};

use crate::api_config::NotifierProviderConfig;

pub(super) fn build_notifier(config: &NotifierProviderConfig) -> Arc<dyn InvitationNotifier> {
    match config {
        NotifierProviderConfig::Console => Arc::new(ConsoleInvitationNotifier::new()),
        NotifierProviderConfig::Smtp(smtp) => {
            Arc::new(SmtpInvitationNotifier::new(SmtpNotifierConfig {
                host: smtp.host.clone(),
                port: smtp.port,
                username: smtp.username.clone(),
                password: smtp.password.clone(),
                from_address: smtp.from_address.clone(),
            }))
        }
    }
}
