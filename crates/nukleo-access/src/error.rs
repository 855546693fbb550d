//! Error types for access-control operations
//!
//! Mutations report "not found" and "duplicate" conditions as values so the
//! request handler can map them to a client-facing status. Permission checks
//! never produce errors; a denied check is a plain `false`.

use nukleo_rbac::PermissionParseError;
use thiserror::Error;
use uuid::Uuid;

use crate::config::ConfigError;
use crate::store::StoreError;

/// Access-control error types.
#[derive(Debug, Error)]
pub enum AccessError {
    /// User id does not resolve to a row
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Role id or slug does not resolve to a row
    #[error("Role not found: {0}")]
    RoleNotFound(String),

    /// Permission id or name does not resolve to a row
    #[error("Permission not found: {0}")]
    PermissionNotFound(String),

    /// Team id does not resolve to a row
    #[error("Team not found: {0}")]
    TeamNotFound(Uuid),

    /// No assignment of the role to the user
    #[error("User {user_id} does not hold role {role_id}")]
    AssignmentNotFound {
        /// User ID
        user_id: Uuid,
        /// Role ID
        role_id: Uuid,
    },

    /// No override of the permission for the user
    #[error("User {user_id} has no custom permission {permission_id}")]
    OverrideNotFound {
        /// User ID
        user_id: Uuid,
        /// Permission ID
        permission_id: Uuid,
    },

    /// The role is already assigned to the user
    #[error("User {user_id} already has role {role_id}")]
    DuplicateAssignment {
        /// User ID
        user_id: Uuid,
        /// Role ID
        role_id: Uuid,
    },

    /// The permission is not linked to the role
    #[error("Role {role_id} does not have permission {permission_id}")]
    LinkNotFound {
        /// Role ID
        role_id: Uuid,
        /// Permission ID
        permission_id: Uuid,
    },

    /// A referenced row vanished while the store applied a change
    #[error("Referenced record not found")]
    RecordNotFound,

    /// The store rejected a change that conflicts with an existing row
    #[error("Conflicting record exists")]
    Conflict,

    /// The permission is already granted directly to the user
    #[error("User {user_id} already has custom permission {permission_id}")]
    DuplicateOverride {
        /// User ID
        user_id: Uuid,
        /// Permission ID
        permission_id: Uuid,
    },

    /// The permission is already linked to the role
    #[error("Role {role_id} already has permission {permission_id}")]
    DuplicateLink {
        /// Role ID
        role_id: Uuid,
        /// Permission ID
        permission_id: Uuid,
    },

    /// The user is already a member of the team
    #[error("User {user_id} is already a member of team {team_id}")]
    DuplicateMembership {
        /// Team ID
        team_id: Uuid,
        /// User ID
        user_id: Uuid,
    },

    /// The role is already granted to the team
    #[error("Team {team_id} already carries role {role_id}")]
    DuplicateTeamRole {
        /// Team ID
        team_id: Uuid,
        /// Role ID
        role_id: Uuid,
    },

    /// A user with this id or email exists
    #[error("User already exists: {0}")]
    DuplicateUser(String),

    /// A role with this slug exists
    #[error("Role already exists: {0}")]
    DuplicateRole(String),

    /// A permission with this name exists
    #[error("Permission already exists: {0}")]
    DuplicatePermission(String),

    /// A team with this id or slug exists
    #[error("Team already exists: {0}")]
    DuplicateTeam(String),

    /// Malformed permission name
    #[error("Invalid permission: {0}")]
    InvalidPermission(#[from] PermissionParseError),

    /// Permission check failed
    #[error("Forbidden: missing permission {0}")]
    Forbidden(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backing store failure
    #[error("Store error: {0}")]
    Store(String),
}

/// Result type for access-control operations.
pub type AccessResult<T> = Result<T, AccessError>;

impl AccessError {
    /// Check if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        matches!(self, AccessError::Store(_) | AccessError::Config(_))
    }

    /// Check if this error is a "does not resolve to a row" condition.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == 404
    }

    /// Check if this error is a rejected duplicate.
    pub fn is_duplicate(&self) -> bool {
        self.status_code() == 409
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AccessError::UserNotFound(_)
            | AccessError::RoleNotFound(_)
            | AccessError::PermissionNotFound(_)
            | AccessError::TeamNotFound(_)
            | AccessError::AssignmentNotFound { .. }
            | AccessError::OverrideNotFound { .. }
            | AccessError::LinkNotFound { .. }
            | AccessError::RecordNotFound => 404,

            AccessError::DuplicateAssignment { .. }
            | AccessError::DuplicateOverride { .. }
            | AccessError::DuplicateLink { .. }
            | AccessError::DuplicateMembership { .. }
            | AccessError::DuplicateTeamRole { .. }
            | AccessError::DuplicateUser(_)
            | AccessError::DuplicateRole(_)
            | AccessError::DuplicatePermission(_)
            | AccessError::DuplicateTeam(_)
            | AccessError::Conflict => 409,

            AccessError::InvalidPermission(_) => 400,
            AccessError::Forbidden(_) => 403,

            AccessError::Config(_) | AccessError::Store(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AccessError::UserNotFound(_) => "USER_NOT_FOUND",
            AccessError::RoleNotFound(_) => "ROLE_NOT_FOUND",
            AccessError::PermissionNotFound(_) => "PERMISSION_NOT_FOUND",
            AccessError::TeamNotFound(_) => "TEAM_NOT_FOUND",
            AccessError::AssignmentNotFound { .. } => "ASSIGNMENT_NOT_FOUND",
            AccessError::OverrideNotFound { .. } => "OVERRIDE_NOT_FOUND",
            AccessError::LinkNotFound { .. } => "LINK_NOT_FOUND",
            AccessError::RecordNotFound => "RECORD_NOT_FOUND",
            AccessError::Conflict => "CONFLICT",
            AccessError::DuplicateAssignment { .. } => "DUPLICATE_ASSIGNMENT",
            AccessError::DuplicateOverride { .. } => "DUPLICATE_OVERRIDE",
            AccessError::DuplicateLink { .. } => "DUPLICATE_LINK",
            AccessError::DuplicateMembership { .. } => "DUPLICATE_MEMBERSHIP",
            AccessError::DuplicateTeamRole { .. } => "DUPLICATE_TEAM_ROLE",
            AccessError::DuplicateUser(_) => "DUPLICATE_USER",
            AccessError::DuplicateRole(_) => "DUPLICATE_ROLE",
            AccessError::DuplicatePermission(_) => "DUPLICATE_PERMISSION",
            AccessError::DuplicateTeam(_) => "DUPLICATE_TEAM",
            AccessError::InvalidPermission(_) => "INVALID_PERMISSION",
            AccessError::Forbidden(_) => "FORBIDDEN",
            AccessError::Config(_) => "CONFIG_ERROR",
            AccessError::Store(_) => "STORE_ERROR",
        }
    }
}

impl From<StoreError> for AccessError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AccessError::RecordNotFound,
            StoreError::AlreadyExists => AccessError::Conflict,
            StoreError::Backend(message) => AccessError::Store(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let id = Uuid::now_v7();
        assert_eq!(AccessError::UserNotFound(id).status_code(), 404);
        assert_eq!(
            AccessError::DuplicateAssignment {
                user_id: id,
                role_id: id
            }
            .status_code(),
            409
        );
        assert_eq!(AccessError::Forbidden("users:read".into()).status_code(), 403);
        assert_eq!(AccessError::Store("down".into()).status_code(), 500);
    }

    #[test]
    fn test_taxonomy_helpers() {
        let id = Uuid::now_v7();
        assert!(AccessError::RoleNotFound("manager".into()).is_not_found());
        assert!(AccessError::DuplicateOverride {
            user_id: id,
            permission_id: id
        }
        .is_duplicate());
        assert!(AccessError::Store("down".into()).is_server_error());
        assert!(!AccessError::Forbidden("x:y".into()).is_server_error());
    }

    #[test]
    fn test_from_store_error() {
        let err: AccessError = StoreError::NotFound.into();
        assert!(matches!(err, AccessError::RecordNotFound));
        assert_eq!(err.status_code(), 404);

        let err: AccessError = StoreError::AlreadyExists.into();
        assert!(matches!(err, AccessError::Conflict));
        assert!(err.is_duplicate());

        let err: AccessError = StoreError::Backend("connection reset".into()).into();
        assert!(matches!(err, AccessError::Store(ref m) if m == "connection reset"));
        assert!(err.is_server_error());
    }

    #[test]
    fn test_from_parse_error() {
        let err: AccessError = nukleo_rbac::Permission::parse("users").unwrap_err().into();
        assert_eq!(err.error_code(), "INVALID_PERMISSION");
        assert_eq!(err.status_code(), 400);
    }
}
