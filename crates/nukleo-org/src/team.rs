//! Team domain models
//!
//! Teams group users. A team can carry role grants, in which case every
//! active member of the active team holds those roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::slugify;

/// A team of users.
///
/// # Examples
///
/// ```
/// use nukleo_org::Team;
///
/// let team = Team::new("Field Sales");
/// assert_eq!(team.slug, "field-sales");
/// assert!(team.is_active);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Team {
    /// Unique team ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// URL-friendly slug
    pub slug: String,

    /// Inactive teams confer no roles
    pub is_active: bool,

    /// When the team was created
    pub created_at: DateTime<Utc>,
}

impl Team {
    /// Creates a new active team, deriving the slug from the name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::now_v7(),
            slug: slugify(&name),
            name,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Mark as inactive.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Membership linking a user to a team.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use nukleo_org::TeamMembership;
///
/// let membership = TeamMembership::new(Uuid::now_v7(), Uuid::now_v7());
/// assert!(membership.is_active);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamMembership {
    /// Unique membership ID
    pub id: Uuid,

    /// Team ID
    pub team_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Whether the membership is active
    pub is_active: bool,

    /// When the user joined
    pub joined_at: DateTime<Utc>,
}

impl TeamMembership {
    /// Creates a new active membership.
    pub fn new(team_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            team_id,
            user_id,
            is_active: true,
            joined_at: Utc::now(),
        }
    }

    /// Mark as inactive.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// A role carried by a team.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamRoleGrant {
    /// Team ID
    pub team_id: Uuid,

    /// Role ID
    pub role_id: Uuid,

    /// When the grant was made
    pub granted_at: DateTime<Utc>,
}

impl TeamRoleGrant {
    /// Creates a new grant.
    pub fn new(team_id: Uuid, role_id: Uuid) -> Self {
        Self {
            team_id,
            role_id,
            granted_at: Utc::now(),
        }
    }
}
