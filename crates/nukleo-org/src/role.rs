//! Role and permission records
//!
//! Roles are named, sluggable bundles of permissions. Permission records are
//! the stored form of a `resource:action` name.

use chrono::{DateTime, Utc};
use nukleo_rbac::{Permission, Segment};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Turn a display name into a URL-friendly slug.
///
/// Lowercases, keeps ASCII alphanumerics and collapses every other run of
/// characters into a single `-`.
///
/// # Examples
///
/// ```
/// use nukleo_org::role::slugify;
///
/// assert_eq!(slugify("Sales Manager"), "sales-manager");
/// assert_eq!(slugify("  R&D -- Lead "), "r-d-lead");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// A role that can be assigned to users or granted to teams.
///
/// # Examples
///
/// ```
/// use nukleo_org::Role;
///
/// let role = Role::new("Account Manager");
/// assert_eq!(role.slug, "account-manager");
/// assert!(role.is_active);
/// assert!(!role.is_system);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    /// Unique role ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Unique slug
    pub slug: String,

    /// Optional description
    pub description: Option<String>,

    /// System roles are seeded and not editable by tenants
    pub is_system: bool,

    /// Inactive roles grant nothing
    pub is_active: bool,

    /// When the role was created
    pub created_at: DateTime<Utc>,

    /// When the role was last updated
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Creates a new active custom role, deriving the slug from the name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let slug = slugify(&name);
        Self::with_slug(name, slug)
    }

    /// Creates a new active custom role with an explicit slug.
    pub fn with_slug(name: impl Into<String>, slug: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            slug: slug.into(),
            description: None,
            is_system: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark as a system role.
    pub fn system(mut self) -> Self {
        self.is_system = true;
        self
    }

    /// Mark as inactive.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Stored permission row.
///
/// # Examples
///
/// ```
/// use nukleo_org::PermissionRecord;
/// use nukleo_rbac::Permission;
///
/// let record = PermissionRecord::new(Permission::parse("users:read").unwrap());
/// assert_eq!(record.name(), "users:read");
/// assert_eq!(record.resource(), "users");
/// assert_eq!(record.action(), "read");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionRecord {
    /// Unique permission ID
    pub id: Uuid,

    /// The `resource:action` value (unique)
    pub permission: Permission,

    /// Optional description
    pub description: Option<String>,

    /// When the permission was created
    pub created_at: DateTime<Utc>,
}

impl PermissionRecord {
    /// Creates a new permission record.
    pub fn new(permission: Permission) -> Self {
        Self {
            id: Uuid::now_v7(),
            permission,
            description: None,
            created_at: Utc::now(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The `resource:action` name.
    pub fn name(&self) -> String {
        self.permission.to_string()
    }

    /// The resource half of the name.
    pub fn resource(&self) -> &str {
        self.permission.resource.as_str()
    }

    /// The action half of the name.
    pub fn action(&self) -> &str {
        self.permission.action.as_str()
    }

    /// Check if the record is a `resource:*` wildcard.
    pub fn is_wildcard(&self) -> bool {
        matches!(self.permission.action, Segment::Any)
    }
}
