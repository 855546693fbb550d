//! Assignment domain models
//!
//! This module provides the link entities of the access-control model:
//! user-to-role assignments (direct or team-scoped), per-user permission
//! overrides, and role-to-permission links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Assignment of a role to a user.
///
/// A direct assignment has no `team_id`. A team-scoped assignment only
/// counts while the user is an active member of that team.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use nukleo_org::RoleAssignment;
///
/// let user_id = Uuid::now_v7();
/// let role_id = Uuid::now_v7();
/// let direct = RoleAssignment::new(user_id, role_id);
/// assert!(direct.is_direct());
///
/// let scoped = RoleAssignment::new(user_id, role_id).in_team(Uuid::now_v7());
/// assert!(!scoped.is_direct());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleAssignment {
    /// Unique assignment ID
    pub id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role ID
    pub role_id: Uuid,

    /// Team scope, if any
    pub team_id: Option<Uuid>,

    /// Inactive assignments grant nothing
    pub is_active: bool,

    /// When the role was assigned
    pub assigned_at: DateTime<Utc>,

    /// Who assigned the role
    pub assigned_by: Option<Uuid>,
}

impl RoleAssignment {
    /// Creates a new active direct assignment.
    pub fn new(user_id: Uuid, role_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            role_id,
            team_id: None,
            is_active: true,
            assigned_at: Utc::now(),
            assigned_by: None,
        }
    }

    /// Scope the assignment to a team.
    pub fn in_team(mut self, team_id: Uuid) -> Self {
        self.team_id = Some(team_id);
        self
    }

    /// Record who made the assignment.
    pub fn with_assigner(mut self, assigner_id: Uuid) -> Self {
        self.assigned_by = Some(assigner_id);
        self
    }

    /// Check if the assignment is direct (not team-scoped).
    pub fn is_direct(&self) -> bool {
        self.team_id.is_none()
    }

    /// Check if two assignments target the same (user, role, team) triple.
    pub fn same_target(&self, other: &RoleAssignment) -> bool {
        self.user_id == other.user_id
            && self.role_id == other.role_id
            && self.team_id == other.team_id
    }
}

/// A permission granted directly to a user outside role membership.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionOverride {
    /// Unique override ID
    pub id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Permission ID
    pub permission_id: Uuid,

    /// When the override was granted
    pub granted_at: DateTime<Utc>,

    /// Who granted it
    pub granted_by: Option<Uuid>,
}

impl PermissionOverride {
    /// Creates a new override.
    pub fn new(user_id: Uuid, permission_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            permission_id,
            granted_at: Utc::now(),
            granted_by: None,
        }
    }

    /// Record who granted the override.
    pub fn with_granter(mut self, granter_id: Uuid) -> Self {
        self.granted_by = Some(granter_id);
        self
    }
}

/// Link between a role and a permission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RolePermissionLink {
    /// Role ID
    pub role_id: Uuid,

    /// Permission ID
    pub permission_id: Uuid,

    /// When the link was created
    pub created_at: DateTime<Utc>,
}

impl RolePermissionLink {
    /// Creates a new link.
    pub fn new(role_id: Uuid, permission_id: Uuid) -> Self {
        Self {
            role_id,
            permission_id,
            created_at: Utc::now(),
        }
    }
}
