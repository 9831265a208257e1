//! Plain-text rendering shared by the invitation notifiers.

use edsetu_application::InvitationNotice;

pub(crate) fn subject(notice: &InvitationNotice) -> String {
    let prefix = if notice.is_resend { "Reminder: " } else { "" };
    format!(
        "{prefix}{} invited you to join as {}",
        notice.inviter_name,
        notice.role.display_name()
    )
}

pub(crate) fn body(notice: &InvitationNotice) -> String {
    let greeting = notice
        .display_name
        .as_deref()
        .map_or_else(|| "Hello,".to_owned(), |name| format!("Hello {name},"));

    let mut text = format!(
        "{greeting}\n\n{} invited you to join their organization as {}.\n",
        notice.inviter_name,
        notice.role.display_name()
    );
    if let Some(message) = notice.message.as_deref() {
        text.push_str(&format!("\n\"{message}\"\n"));
    }
    text.push_str(&format!(
        "\nInvitation code: {}\nThis invitation expires at {}.\n",
        notice.invitation_id,
        notice.expires_at.to_rfc3339()
    ));
    text
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use edsetu_application::InvitationNotice;
    use edsetu_core::OrganizationId;
    use edsetu_domain::RoleType;
    use uuid::Uuid;

    use super::{body, subject};

    fn notice(is_resend: bool) -> InvitationNotice {
        InvitationNotice {
            invitation_id: Uuid::nil(),
            organization_id: OrganizationId::new(),
            email: Some("bob@example.com".to_owned()),
            phone: None,
            display_name: Some("Bob".to_owned()),
            inviter_name: "Alice".to_owned(),
            role: RoleType::Instructor,
            message: Some("Welcome aboard".to_owned()),
            expires_at: Utc
                .with_ymd_and_hms(2026, 3, 9, 9, 0, 0)
                .single()
                .unwrap_or_else(|| panic!("valid timestamp")),
            is_resend,
        }
    }

    #[test]
    fn resend_subject_is_marked_as_reminder() {
        assert!(!subject(&notice(false)).starts_with("Reminder"));
        assert!(subject(&notice(true)).starts_with("Reminder: Alice invited you"));
    }

    #[test]
    fn body_carries_code_note_and_deadline() {
        let text = body(&notice(false));
        assert!(text.starts_with("Hello Bob,"));
        assert!(text.contains("\"Welcome aboard\""));
        assert!(text.contains(&Uuid::nil().to_string()));
        assert!(text.contains("2026-03-09T09:00:00+00:00"));
    }
}
