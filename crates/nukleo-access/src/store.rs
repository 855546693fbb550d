//! Storage abstraction for access-control records.
//!
//! The relational database is an external collaborator. Backends implement
//! [`PermissionStore`] so resolution and admin logic do not depend on a
//! specific engine or schema. [`crate::memory::MemoryPermissionStore`] is the
//! in-process implementation.

use async_trait::async_trait;
use nukleo_org::{
    PermissionOverride, PermissionRecord, Role, RoleAssignment, Team, TeamMembership,
    TeamRoleGrant, User,
};
use thiserror::Error;
use uuid::Uuid;

/// Uniform error type for all storage backends.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced row does not exist
    #[error("not found")]
    NotFound,

    /// A row with the same unique key exists
    #[error("already exists")]
    AlreadyExists,

    /// Backend failure (connection, query, serialization)
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store trait for role, permission and assignment records.
///
/// Every method is a single short transaction. Implementations hold no
/// cross-call locks.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Get a user by id.
    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>>;

    /// Get a role by id.
    async fn get_role(&self, role_id: Uuid) -> StoreResult<Option<Role>>;

    /// Find a role by slug.
    async fn find_role_by_slug(&self, slug: &str) -> StoreResult<Option<Role>>;

    /// List all roles, ordered by slug.
    async fn list_roles(&self) -> StoreResult<Vec<Role>>;

    /// Get a permission by id.
    async fn get_permission(&self, permission_id: Uuid) -> StoreResult<Option<PermissionRecord>>;

    /// Find a permission by its `resource:action` name.
    async fn find_permission_by_name(&self, name: &str) -> StoreResult<Option<PermissionRecord>>;

    /// List all permissions, ordered by name.
    async fn list_permissions(&self) -> StoreResult<Vec<PermissionRecord>>;

    /// Get a team by id.
    async fn get_team(&self, team_id: Uuid) -> StoreResult<Option<Team>>;

    /// All role assignments of a user, active or not.
    async fn assignments_for_user(&self, user_id: Uuid) -> StoreResult<Vec<RoleAssignment>>;

    /// All team memberships of a user, active or not.
    async fn team_memberships_for_user(&self, user_id: Uuid) -> StoreResult<Vec<TeamMembership>>;

    /// Role ids granted to a team.
    async fn roles_for_team(&self, team_id: Uuid) -> StoreResult<Vec<Uuid>>;

    /// Permissions linked to a role.
    async fn permissions_for_role(&self, role_id: Uuid) -> StoreResult<Vec<PermissionRecord>>;

    /// Direct permission overrides of a user.
    async fn overrides_for_user(&self, user_id: Uuid) -> StoreResult<Vec<PermissionOverride>>;

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Insert a user. `AlreadyExists` if the id or email is taken.
    async fn insert_user(&self, user: User) -> StoreResult<()>;

    /// Insert a role. `AlreadyExists` if the id or slug is taken.
    async fn insert_role(&self, role: Role) -> StoreResult<()>;

    /// Insert a permission. `AlreadyExists` if the id or name is taken.
    async fn insert_permission(&self, permission: PermissionRecord) -> StoreResult<()>;

    /// Insert a team. `AlreadyExists` if the id or slug is taken.
    async fn insert_team(&self, team: Team) -> StoreResult<()>;

    /// Insert a team membership. `AlreadyExists` if the user is already in the team.
    async fn insert_team_membership(&self, membership: TeamMembership) -> StoreResult<()>;

    /// Grant a role to a team. `AlreadyExists` if the grant is present.
    async fn grant_team_role(&self, grant: TeamRoleGrant) -> StoreResult<()>;

    /// Insert a role assignment. `AlreadyExists` if the same
    /// (user, role, team) assignment is present, active or not.
    async fn insert_assignment(&self, assignment: RoleAssignment) -> StoreResult<()>;

    /// Delete the (user, role, team) assignment. `NotFound` if absent.
    async fn delete_assignment(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        team_id: Option<Uuid>,
    ) -> StoreResult<()>;

    /// Set the active flag of the (user, role, team) assignment. `NotFound` if absent.
    async fn set_assignment_active(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        team_id: Option<Uuid>,
        is_active: bool,
    ) -> StoreResult<()>;

    /// Atomically replace a user's direct assignments.
    ///
    /// Assignments for roles absent from `assignments` are deleted. Existing
    /// ones for listed roles keep their row and are set active. Missing ones
    /// are inserted. Team-scoped assignments are untouched.
    async fn replace_direct_assignments(
        &self,
        user_id: Uuid,
        assignments: Vec<RoleAssignment>,
    ) -> StoreResult<()>;

    /// Insert a permission override. `AlreadyExists` if present.
    async fn insert_override(&self, permission_override: PermissionOverride) -> StoreResult<()>;

    /// Delete a permission override. `NotFound` if absent.
    async fn delete_override(&self, user_id: Uuid, permission_id: Uuid) -> StoreResult<()>;

    /// Link a permission to a role. `AlreadyExists` if linked.
    async fn link_role_permission(&self, role_id: Uuid, permission_id: Uuid) -> StoreResult<()>;

    /// Unlink a permission from a role. `NotFound` if not linked.
    async fn unlink_role_permission(&self, role_id: Uuid, permission_id: Uuid) -> StoreResult<()>;

    /// Atomically replace the permissions linked to a role.
    async fn replace_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: Vec<Uuid>,
    ) -> StoreResult<()>;
}
