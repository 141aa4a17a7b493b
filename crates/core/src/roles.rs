//! Caller roles derived from the identity string.
//!
//! The role is encoded in the identity prefix: `admin-…` callers are
//! administrators, `student-…` callers are students. Anything else is
//! rejected before any transaction is opened.

use serde::Serialize;

use crate::error::CoreError;
use crate::ids;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Student,
}

impl Role {
    /// Derive the role from a caller identity such as `student-123412341234`.
    pub fn from_identity(identity: &str) -> Result<Self, CoreError> {
        if ids::is_admin_uuid(identity) {
            Ok(Role::Admin)
        } else if ids::is_student_uuid(identity) {
            Ok(Role::Student)
        } else {
            Err(CoreError::Unauthorized(format!(
                "caller identity '{identity}' is not a student or admin uuid"
            )))
        }
    }
}

/// Capability an operation demands from its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Only administrators.
    Admin,
    /// Any student or administrator.
    StudentOrAdmin,
    /// The leader of the target club, or an administrator. The leader half
    /// is decided later against the stored club row; see [`is_leader_or_admin`].
    LeaderOrAdmin,
}

/// Check the identity-only part of a capability.
pub fn authorize(identity: &str, capability: Capability) -> Result<Role, CoreError> {
    let role = Role::from_identity(identity)?;
    match (capability, role) {
        (Capability::Admin, Role::Student) => Err(CoreError::Forbidden(
            "admin role required".into(),
        )),
        _ => Ok(role),
    }
}

/// Leader check performed once the club's current leader is known.
pub fn is_leader_or_admin(identity: &str, leader_uuid: &str) -> Result<(), CoreError> {
    if ids::is_admin_uuid(identity) || identity == leader_uuid {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "'{identity}' is not the leader of this club"
        )))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn role_follows_identity_prefix() {
        assert_eq!(Role::from_identity("admin-000000000001"), Ok(Role::Admin));
        assert_eq!(
            Role::from_identity("student-000000000001"),
            Ok(Role::Student)
        );
        assert_matches!(
            Role::from_identity("parent-000000000001"),
            Err(CoreError::Unauthorized(_))
        );
    }

    #[test]
    fn admin_capability_rejects_students() {
        assert_matches!(
            authorize("student-000000000001", Capability::Admin),
            Err(CoreError::Forbidden(_))
        );
        assert_eq!(
            authorize("admin-000000000001", Capability::Admin),
            Ok(Role::Admin)
        );
    }

    #[test]
    fn leader_capability_defers_to_club_row() {
        assert_eq!(
            authorize("student-000000000001", Capability::LeaderOrAdmin),
            Ok(Role::Student)
        );
        assert!(is_leader_or_admin("student-000000000001", "student-000000000001").is_ok());
        assert!(is_leader_or_admin("admin-000000000009", "student-000000000001").is_ok());
        assert_matches!(
            is_leader_or_admin("student-000000000002", "student-000000000001"),
            Err(CoreError::Forbidden(_))
        );
    }
}
