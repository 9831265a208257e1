use std::cmp::Ordering;
use std::str::FromStr;

use edsetu_core::AppError;
use serde::{Deserialize, Serialize};

use crate::Permission;

/// Closed set of roles a user may hold inside an organization.
///
/// Privilege comparisons must go through [`RoleType::rank`] or
/// [`RoleType::can_manage`]; the ordering rule lives here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    /// Organization owner with every permission.
    Admin,
    /// Delegated administrator with a customizable permission set.
    SubAdmin,
    /// Course author who delivers instruction.
    Instructor,
    /// Learner enrolled in courses.
    Student,
}

impl RoleType {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::SubAdmin => "sub_admin",
            Self::Instructor => "instructor",
            Self::Student => "student",
        }
    }

    /// Returns the hierarchy rank; higher means more privileged.
    #[must_use]
    pub fn rank(&self) -> i32 {
        match self {
            Self::Admin => 4,
            Self::SubAdmin => 3,
            Self::Instructor => 2,
            Self::Student => 1,
        }
    }

    /// Returns whether this role strictly outranks `target`.
    #[must_use]
    pub fn can_manage(&self, target: RoleType) -> bool {
        self.rank() > target.rank()
    }

    /// Returns the human-readable role label.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::SubAdmin => "Sub Admin",
            Self::Instructor => "Instructor",
            Self::Student => "Student",
        }
    }

    /// Returns a short description of the role.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Admin => "Full access to the organization, its users and settings.",
            Self::SubAdmin => "Delegated administration with admin-selected permissions.",
            Self::Instructor => "Creates and teaches courses and invites students.",
            Self::Student => "Enrolls in and views courses.",
        }
    }

    /// Returns the permission needed to directly assign or revoke this role.
    ///
    /// `None` means the role is only ever granted by organization provisioning.
    #[must_use]
    pub fn management_permission(&self) -> Option<Permission> {
        match self {
            Self::Admin => None,
            Self::SubAdmin => Some(Permission::ManageSubAdmins),
            Self::Instructor => Some(Permission::ManageInstructors),
            Self::Student => Some(Permission::ManageStudents),
        }
    }

    /// Returns all roles from most to least privileged.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[RoleType] = &[
            RoleType::Admin,
            RoleType::SubAdmin,
            RoleType::Instructor,
            RoleType::Student,
        ];

        ALL
    }

    /// Parses a transport value into a role.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl Ord for RoleType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for RoleType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for RoleType {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for RoleType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "sub_admin" => Ok(Self::SubAdmin),
            "instructor" => Ok(Self::Instructor),
            "student" => Ok(Self::Student),
            _ => Err(AppError::NotFound(format!("role '{value}' was not found"))),
        }
    }
}
