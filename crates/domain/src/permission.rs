use std::collections::BTreeMap;
use std::str::FromStr;

use edsetu_core::AppError;
use serde::{Deserialize, Serialize};

use crate::RoleType;

/// Resource nouns that permissions apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionResource {
    /// Organization members of any role.
    Users,
    /// Sub-admin members.
    SubAdmins,
    /// Instructor members.
    Instructors,
    /// Student members.
    Students,
    /// Course catalog.
    Courses,
    /// Reporting dashboards.
    Analytics,
    /// Organization settings.
    Settings,
    /// Membership invitations.
    Invitations,
    /// Role permission bindings.
    Roles,
    /// Audit trail.
    AuditLog,
}

impl PermissionResource {
    /// Returns a stable storage value for this resource.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::SubAdmins => "sub_admins",
            Self::Instructors => "instructors",
            Self::Students => "students",
            Self::Courses => "courses",
            Self::Analytics => "analytics",
            Self::Settings => "settings",
            Self::Invitations => "invitations",
            Self::Roles => "roles",
            Self::AuditLog => "audit_log",
        }
    }
}

/// Action verbs; `Manage` implies every other action on the same resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    /// Create new items.
    Create,
    /// Read existing items.
    Read,
    /// Modify existing items.
    Update,
    /// Remove items.
    Delete,
    /// Full control over the resource.
    Manage,
}

impl PermissionAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Manage => "manage",
        }
    }
}

/// Static permission catalog enforced by application policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Full control over organization members.
    ManageUsers,
    /// Lists organization members.
    ViewUsers,
    /// Creates, edits and removes sub-admins.
    ManageSubAdmins,
    /// Creates, edits and removes instructors.
    ManageInstructors,
    /// Creates, edits and removes students.
    ManageStudents,
    /// Lists students.
    ViewStudents,
    /// Authors new courses.
    CreateCourse,
    /// Reads course content.
    ViewCourses,
    /// Edits existing courses.
    EditCourse,
    /// Deletes courses.
    DeleteCourse,
    /// Full control over courses.
    ManageCourses,
    /// Reads analytics dashboards.
    ViewAnalytics,
    /// Reads organization settings.
    ViewSettings,
    /// Changes organization settings.
    ManageSettings,
    /// Sends membership invitations.
    SendInvitations,
    /// Revokes and resends invitations sent by others.
    ManageInvitations,
    /// Edits role and per-user permission bindings.
    ManageRoles,
    /// Reads the audit trail.
    ViewAuditLog,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManageUsers => "manage_users",
            Self::ViewUsers => "view_users",
            Self::ManageSubAdmins => "manage_sub_admins",
            Self::ManageInstructors => "manage_instructors",
            Self::ManageStudents => "manage_students",
            Self::ViewStudents => "view_students",
            Self::CreateCourse => "create_course",
            Self::ViewCourses => "view_courses",
            Self::EditCourse => "edit_course",
            Self::DeleteCourse => "delete_course",
            Self::ManageCourses => "manage_courses",
            Self::ViewAnalytics => "view_analytics",
            Self::ViewSettings => "view_settings",
            Self::ManageSettings => "manage_settings",
            Self::SendInvitations => "send_invitations",
            Self::ManageInvitations => "manage_invitations",
            Self::ManageRoles => "manage_roles",
            Self::ViewAuditLog => "view_audit_log",
        }
    }

    /// Returns the resource this permission applies to.
    #[must_use]
    pub fn resource(&self) -> PermissionResource {
        match self {
            Self::ManageUsers | Self::ViewUsers => PermissionResource::Users,
            Self::ManageSubAdmins => PermissionResource::SubAdmins,
            Self::ManageInstructors => PermissionResource::Instructors,
            Self::ManageStudents | Self::ViewStudents => PermissionResource::Students,
            Self::CreateCourse
            | Self::ViewCourses
            | Self::EditCourse
            | Self::DeleteCourse
            | Self::ManageCourses => PermissionResource::Courses,
            Self::ViewAnalytics => PermissionResource::Analytics,
            Self::ViewSettings | Self::ManageSettings => PermissionResource::Settings,
            Self::SendInvitations | Self::ManageInvitations => PermissionResource::Invitations,
            Self::ManageRoles => PermissionResource::Roles,
            Self::ViewAuditLog => PermissionResource::AuditLog,
        }
    }

    /// Returns the action verb of this permission.
    #[must_use]
    pub fn action(&self) -> PermissionAction {
        match self {
            Self::CreateCourse | Self::SendInvitations => PermissionAction::Create,
            Self::ViewUsers
            | Self::ViewStudents
            | Self::ViewCourses
            | Self::ViewAnalytics
            | Self::ViewSettings
            | Self::ViewAuditLog => PermissionAction::Read,
            Self::EditCourse => PermissionAction::Update,
            Self::DeleteCourse => PermissionAction::Delete,
            Self::ManageUsers
            | Self::ManageSubAdmins
            | Self::ManageInstructors
            | Self::ManageStudents
            | Self::ManageCourses
            | Self::ManageSettings
            | Self::ManageInvitations
            | Self::ManageRoles => PermissionAction::Manage,
        }
    }

    /// Returns the other catalog permissions a `manage` permission implies.
    #[must_use]
    pub fn implied(&self) -> Vec<Permission> {
        if self.action() != PermissionAction::Manage {
            return Vec::new();
        }

        Self::all()
            .iter()
            .copied()
            .filter(|candidate| candidate != self && candidate.resource() == self.resource())
            .collect()
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::ManageUsers,
            Permission::ViewUsers,
            Permission::ManageSubAdmins,
            Permission::ManageInstructors,
            Permission::ManageStudents,
            Permission::ViewStudents,
            Permission::CreateCourse,
            Permission::ViewCourses,
            Permission::EditCourse,
            Permission::DeleteCourse,
            Permission::ManageCourses,
            Permission::ViewAnalytics,
            Permission::ViewSettings,
            Permission::ManageSettings,
            Permission::SendInvitations,
            Permission::ManageInvitations,
            Permission::ManageRoles,
            Permission::ViewAuditLog,
        ];

        ALL
    }

    /// Parses a transport value into a permission.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|permission| permission.as_str() == value)
            .ok_or_else(|| AppError::UnknownPermission(format!("'{value}' is not in the catalog")))
    }
}

/// Explicit permission toggles with `manage` expansion baked in at write time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionBinding {
    entries: BTreeMap<Permission, bool>,
}

impl PermissionBinding {
    /// Creates an empty binding.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a binding with each listed permission enabled.
    #[must_use]
    pub fn with_enabled(permissions: &[Permission]) -> Self {
        let mut binding = Self::new();
        for permission in permissions {
            binding.set(*permission, true);
        }
        binding
    }

    /// Rebuilds a binding from already-expanded storage rows.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (Permission, bool)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Toggles a permission.
    ///
    /// Enabling a `manage` permission also enables everything it implies.
    /// Disabling it leaves the implied entries untouched.
    pub fn set(&mut self, permission: Permission, enabled: bool) {
        self.entries.insert(permission, enabled);
        if enabled {
            for implied in permission.implied() {
                self.entries.insert(implied, true);
            }
        }
    }

    /// Returns the stored toggle for a permission, if any.
    #[must_use]
    pub fn get(&self, permission: Permission) -> Option<bool> {
        self.entries.get(&permission).copied()
    }

    /// Returns whether the permission is explicitly enabled.
    #[must_use]
    pub fn allows(&self, permission: Permission) -> bool {
        self.get(permission).unwrap_or(false)
    }

    /// Returns all stored toggles in catalog order.
    pub fn entries(&self) -> impl Iterator<Item = (Permission, bool)> + '_ {
        self.entries
            .iter()
            .map(|(permission, enabled)| (*permission, *enabled))
    }

    /// Returns every enabled permission in catalog order.
    #[must_use]
    pub fn enabled(&self) -> Vec<Permission> {
        self.entries()
            .filter_map(|(permission, enabled)| enabled.then_some(permission))
            .collect()
    }

    /// Returns the binding with `overrides` taking precedence entry by entry.
    #[must_use]
    pub fn overlay(&self, overrides: &PermissionBinding) -> PermissionBinding {
        let mut merged = self.entries.clone();
        for (permission, enabled) in overrides.entries() {
            merged.insert(permission, enabled);
        }
        PermissionBinding { entries: merged }
    }

    /// Returns whether no toggles are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Returns the binding seeded for a role when an organization is provisioned.
#[must_use]
pub fn default_binding_for_role(role: RoleType) -> PermissionBinding {
    match role {
        RoleType::Admin => PermissionBinding::with_enabled(Permission::all()),
        RoleType::SubAdmin => {
            let mut binding = PermissionBinding::with_enabled(&[
                Permission::ViewUsers,
                Permission::ManageInstructors,
                Permission::ViewStudents,
                Permission::ManageCourses,
                Permission::ViewAnalytics,
                Permission::ViewSettings,
                Permission::SendInvitations,
            ]);
            binding.set(Permission::ManageStudents, false);
            binding
        }
        RoleType::Instructor => PermissionBinding::with_enabled(&[
            Permission::CreateCourse,
            Permission::ViewCourses,
            Permission::EditCourse,
            Permission::ViewStudents,
            Permission::ViewAnalytics,
            Permission::SendInvitations,
        ]),
        RoleType::Student => PermissionBinding::with_enabled(&[Permission::ViewCourses]),
    }
}
