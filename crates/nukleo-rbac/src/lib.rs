//! # Nukleo RBAC
//!
//! Permission values and the seed catalog for Nukleo's role-based access
//! control.
//!
//! ## Overview
//!
//! - **Permissions**: `resource:action` pairs where either half may be `*`
//! - **Permission Sets**: effective sets with wildcard-aware membership
//! - **Catalog**: the default permission names and roles seeded at startup
//!
//! ## Matching
//!
//! ```text
//! requested "invoices:send"
//!   1. "invoices:send" in set   -> allow
//!   2. "admin:*" in set         -> allow
//!   3. "invoices:*" in set      -> allow
//!   4.                          -> deny
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use nukleo_rbac::{Permission, PermissionSet};
//!
//! let mut set = PermissionSet::new();
//! set.insert(Permission::parse("users:read").unwrap());
//! set.insert(Permission::parse("teams:*").unwrap());
//!
//! assert!(set.has_str("users:read"));
//! assert!(set.has_str("teams:delete"));
//! assert!(!set.has_str("users:delete"));
//! ```

pub mod catalog;
pub mod permissions;

pub use catalog::{Catalog, RoleTemplate, ADMIN_SLUG, SUPERADMIN_SLUG};
pub use permissions::{Permission, PermissionParseError, PermissionSet, Segment};
