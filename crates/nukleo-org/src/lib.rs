//! # Nukleo Organization Model
//!
//! Records behind Nukleo's role-based access control.
//!
//! ## Architecture
//!
//! ```text
//! User
//!   ├─ RoleAssignment ─→ Role ─→ RolePermissionLink ─→ PermissionRecord
//!   │     (direct, or scoped to a Team)
//!   ├─ TeamMembership ─→ Team ─→ TeamRoleGrant ─→ Role
//!   └─ PermissionOverride ─→ PermissionRecord
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use nukleo_org::{Role, RoleAssignment, User};
//!
//! let user = User::new("ada@example.com");
//! let role = Role::new("Manager");
//! let assignment = RoleAssignment::new(user.id, role.id);
//! assert!(assignment.is_direct());
//! ```

pub mod assignment;
pub mod role;
pub mod team;
pub mod user;

pub use assignment::{PermissionOverride, RoleAssignment, RolePermissionLink};
pub use role::{PermissionRecord, Role};
pub use team::{Team, TeamMembership, TeamRoleGrant};
pub use user::User;
