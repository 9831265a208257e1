//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_invitation_notifier;
mod in_memory_access_repository;
mod invitation_message;
mod postgres_assignment_repository;
mod postgres_audit_log_repository;
mod postgres_audit_repository;
mod postgres_invitation_repository;
mod postgres_mapping;
mod postgres_role_repository;
#[cfg(test)]
mod postgres_test_support;
mod smtp_invitation_notifier;
mod system_clock;

pub use console_invitation_notifier::ConsoleInvitationNotifier;
pub use in_memory_access_repository::InMemoryAccessRepository;
pub use postgres_assignment_repository::PostgresAssignmentRepository;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_invitation_repository::PostgresInvitationRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use smtp_invitation_notifier::{SmtpInvitationNotifier, SmtpNotifierConfig};
pub use system_clock::SystemClock;
