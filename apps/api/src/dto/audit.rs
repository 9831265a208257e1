use edsetu_application::AuditLogEntry;
use serde::Serialize;
use ts_rs::TS;

/// API representation of an audit log entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-log-entry-response.ts"
)]
pub struct AuditLogEntryResponse {
    pub event_id: String,
    pub subject: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub previous_state: Option<String>,
    pub new_state: Option<String>,
    pub detail: Option<String>,
    pub created_at: String,
}

impl From<AuditLogEntry> for AuditLogEntryResponse {
    fn from(value: AuditLogEntry) -> Self {
        Self {
            event_id: value.event_id,
            subject: value.subject,
            action: value.action,
            resource_type: value.resource_type,
            resource_id: value.resource_id,
            previous_state: value.previous_state,
            new_state: value.new_state,
            detail: value.detail,
            created_at: value.created_at,
        }
    }
}
