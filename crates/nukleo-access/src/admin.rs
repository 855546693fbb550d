//! Admin-facing mutations of roles, assignments and overrides.
//!
//! Every call validates that the ids it is given resolve to rows before
//! touching links, so callers get `*NotFound` rather than a store error.
//! Linking something that is already linked is rejected with a `Duplicate*`
//! error; it is never silently ignored.

use nukleo_org::{
    PermissionOverride, PermissionRecord, Role, RoleAssignment, Team, TeamMembership,
    TeamRoleGrant, User,
};
use nukleo_rbac::Permission;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{AccessError, AccessResult};
use crate::store::{PermissionStore, StoreError};

/// Parameters for creating a role.
#[derive(Debug, Clone, Default)]
pub struct CreateRoleParams {
    /// Display name
    pub name: String,
    /// Explicit slug; derived from the name when `None`
    pub slug: Option<String>,
    /// Optional description
    pub description: Option<String>,
    /// Mark as a system role
    pub is_system: bool,
}

/// Admin operations over a [`PermissionStore`].
#[derive(Clone)]
pub struct AccessAdmin {
    store: Arc<dyn PermissionStore>,
}

impl std::fmt::Debug for AccessAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessAdmin").finish_non_exhaustive()
    }
}

impl AccessAdmin {
    /// Create an admin handle over a store.
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        Self { store }
    }

    async fn require_user(&self, user_id: Uuid) -> AccessResult<User> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(AccessError::UserNotFound(user_id))
    }

    async fn require_role(&self, role_id: Uuid) -> AccessResult<Role> {
        self.store
            .get_role(role_id)
            .await?
            .ok_or_else(|| AccessError::RoleNotFound(role_id.to_string()))
    }

    async fn require_team(&self, team_id: Uuid) -> AccessResult<Team> {
        self.store
            .get_team(team_id)
            .await?
            .ok_or(AccessError::TeamNotFound(team_id))
    }

    async fn require_permission(&self, permission_id: Uuid) -> AccessResult<PermissionRecord> {
        self.store
            .get_permission(permission_id)
            .await?
            .ok_or_else(|| AccessError::PermissionNotFound(permission_id.to_string()))
    }

    /// Look up a permission by its `resource:action` name.
    pub async fn find_permission(&self, name: &str) -> AccessResult<PermissionRecord> {
        let canonical = Permission::parse(name)?.to_string();
        self.store
            .find_permission_by_name(&canonical)
            .await?
            .ok_or(AccessError::PermissionNotFound(canonical))
    }

    /// Look up a role by slug.
    pub async fn find_role(&self, slug: &str) -> AccessResult<Role> {
        self.store
            .find_role_by_slug(slug)
            .await?
            .ok_or_else(|| AccessError::RoleNotFound(slug.to_string()))
    }

    // ------------------------------------------------------------------
    // Catalog records
    // ------------------------------------------------------------------

    /// Register a user.
    pub async fn create_user(&self, user: User) -> AccessResult<User> {
        match self.store.insert_user(user.clone()).await {
            Ok(()) => Ok(user),
            Err(StoreError::AlreadyExists) => Err(AccessError::DuplicateUser(user.email)),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a role.
    pub async fn create_role(&self, params: CreateRoleParams) -> AccessResult<Role> {
        let mut role = match params.slug {
            Some(slug) => Role::with_slug(params.name, slug),
            None => Role::new(params.name),
        };
        role.description = params.description;
        role.is_system = params.is_system;

        match self.store.insert_role(role.clone()).await {
            Ok(()) => {
                info!(role = %role.slug, "role created");
                Ok(role)
            }
            Err(StoreError::AlreadyExists) => Err(AccessError::DuplicateRole(role.slug)),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a permission from its `resource:action` name.
    pub async fn create_permission(
        &self,
        name: &str,
        description: Option<String>,
    ) -> AccessResult<PermissionRecord> {
        let mut record = PermissionRecord::new(Permission::parse(name)?);
        record.description = description;

        match self.store.insert_permission(record.clone()).await {
            Ok(()) => {
                info!(permission = %record.permission, "permission created");
                Ok(record)
            }
            Err(StoreError::AlreadyExists) => Err(AccessError::DuplicatePermission(record.name())),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a team.
    pub async fn create_team(&self, name: &str) -> AccessResult<Team> {
        let team = Team::new(name);
        match self.store.insert_team(team.clone()).await {
            Ok(()) => Ok(team),
            Err(StoreError::AlreadyExists) => Err(AccessError::DuplicateTeam(team.slug)),
            Err(e) => Err(e.into()),
        }
    }

    /// Add a user to a team.
    pub async fn add_team_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> AccessResult<TeamMembership> {
        self.require_team(team_id).await?;
        self.require_user(user_id).await?;

        let membership = TeamMembership::new(team_id, user_id);
        match self.store.insert_team_membership(membership.clone()).await {
            Ok(()) => Ok(membership),
            Err(StoreError::AlreadyExists) => {
                Err(AccessError::DuplicateMembership { team_id, user_id })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Make every active member of a team hold a role.
    pub async fn grant_team_role(
        &self,
        team_id: Uuid,
        role_id: Uuid,
    ) -> AccessResult<TeamRoleGrant> {
        self.require_team(team_id).await?;
        self.require_role(role_id).await?;

        let grant = TeamRoleGrant::new(team_id, role_id);
        match self.store.grant_team_role(grant.clone()).await {
            Ok(()) => {
                info!(%team_id, %role_id, "team role granted");
                Ok(grant)
            }
            Err(StoreError::AlreadyExists) => {
                Err(AccessError::DuplicateTeamRole { team_id, role_id })
            }
            Err(e) => Err(e.into()),
        }
    }

    // ------------------------------------------------------------------
    // Role assignments
    // ------------------------------------------------------------------

    async fn insert_assignment(&self, assignment: RoleAssignment) -> AccessResult<RoleAssignment> {
        let (user_id, role_id) = (assignment.user_id, assignment.role_id);
        match self.store.insert_assignment(assignment.clone()).await {
            Ok(()) => {
                info!(%user_id, %role_id, team_id = ?assignment.team_id, "role assigned");
                Ok(assignment)
            }
            Err(StoreError::AlreadyExists) => {
                Err(AccessError::DuplicateAssignment { user_id, role_id })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Assign a role directly to a user.
    ///
    /// Rejected with `DuplicateAssignment` if the user already has a direct
    /// assignment of the role, including an inactive one.
    pub async fn assign_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> AccessResult<RoleAssignment> {
        self.require_user(user_id).await?;
        self.require_role(role_id).await?;

        let mut assignment = RoleAssignment::new(user_id, role_id);
        assignment.assigned_by = assigned_by;
        self.insert_assignment(assignment).await
    }

    /// Assign a role to a user within a team.
    ///
    /// The role only counts while the user is an active member of the team.
    pub async fn assign_team_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        team_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> AccessResult<RoleAssignment> {
        self.require_user(user_id).await?;
        self.require_role(role_id).await?;
        self.require_team(team_id).await?;

        let mut assignment = RoleAssignment::new(user_id, role_id).in_team(team_id);
        assignment.assigned_by = assigned_by;
        self.insert_assignment(assignment).await
    }

    async fn delete_assignment(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        team_id: Option<Uuid>,
    ) -> AccessResult<()> {
        match self.store.delete_assignment(user_id, role_id, team_id).await {
            Ok(()) => {
                info!(%user_id, %role_id, ?team_id, "role removed");
                Ok(())
            }
            Err(StoreError::NotFound) => Err(AccessError::AssignmentNotFound { user_id, role_id }),
            Err(e) => Err(e.into()),
        }
    }

    async fn toggle_assignment(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        team_id: Option<Uuid>,
        is_active: bool,
    ) -> AccessResult<()> {
        match self
            .store
            .set_assignment_active(user_id, role_id, team_id, is_active)
            .await
        {
            Ok(()) => {
                info!(%user_id, %role_id, ?team_id, is_active, "role assignment toggled");
                Ok(())
            }
            Err(StoreError::NotFound) => Err(AccessError::AssignmentNotFound { user_id, role_id }),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a direct role assignment. Overrides are unaffected.
    pub async fn remove_role(&self, user_id: Uuid, role_id: Uuid) -> AccessResult<()> {
        self.delete_assignment(user_id, role_id, None).await
    }

    /// Remove a role assignment scoped to a team.
    pub async fn remove_team_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        team_id: Uuid,
    ) -> AccessResult<()> {
        self.delete_assignment(user_id, role_id, Some(team_id))
            .await
    }

    /// Activate or deactivate a direct role assignment.
    pub async fn set_role_assignment_active(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        is_active: bool,
    ) -> AccessResult<()> {
        self.toggle_assignment(user_id, role_id, None, is_active)
            .await
    }

    /// Activate or deactivate a role assignment scoped to a team.
    pub async fn set_team_role_assignment_active(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        team_id: Uuid,
        is_active: bool,
    ) -> AccessResult<()> {
        self.toggle_assignment(user_id, role_id, Some(team_id), is_active)
            .await
    }

    /// Replace a user's direct role assignments with exactly `role_ids`.
    ///
    /// Roles the user already has an assignment for keep that row, which is
    /// reactivated if it was inactive. Team-scoped assignments and overrides
    /// are unaffected.
    pub async fn update_user_roles(
        &self,
        user_id: Uuid,
        role_ids: &[Uuid],
        assigned_by: Option<Uuid>,
    ) -> AccessResult<()> {
        self.require_user(user_id).await?;

        let mut assignments = Vec::with_capacity(role_ids.len());
        for role_id in role_ids {
            self.require_role(*role_id).await?;
            if assignments
                .iter()
                .any(|a: &RoleAssignment| a.role_id == *role_id)
            {
                continue;
            }
            let mut assignment = RoleAssignment::new(user_id, *role_id);
            assignment.assigned_by = assigned_by;
            assignments.push(assignment);
        }

        self.store
            .replace_direct_assignments(user_id, assignments)
            .await?;
        info!(%user_id, roles = role_ids.len(), "user roles replaced");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Overrides
    // ------------------------------------------------------------------

    /// Grant a permission directly to a user.
    pub async fn add_custom_permission(
        &self,
        user_id: Uuid,
        permission_id: Uuid,
        granted_by: Option<Uuid>,
    ) -> AccessResult<PermissionOverride> {
        self.require_user(user_id).await?;
        self.require_permission(permission_id).await?;

        let mut o = PermissionOverride::new(user_id, permission_id);
        o.granted_by = granted_by;

        match self.store.insert_override(o.clone()).await {
            Ok(()) => {
                info!(%user_id, %permission_id, "custom permission added");
                Ok(o)
            }
            Err(StoreError::AlreadyExists) => Err(AccessError::DuplicateOverride {
                user_id,
                permission_id,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Grant a permission directly to a user, by `resource:action` name.
    pub async fn add_custom_permission_by_name(
        &self,
        user_id: Uuid,
        name: &str,
        granted_by: Option<Uuid>,
    ) -> AccessResult<PermissionOverride> {
        let record = self.find_permission(name).await?;
        self.add_custom_permission(user_id, record.id, granted_by)
            .await
    }

    /// Revoke a permission granted directly to a user.
    pub async fn remove_custom_permission(
        &self,
        user_id: Uuid,
        permission_id: Uuid,
    ) -> AccessResult<()> {
        match self.store.delete_override(user_id, permission_id).await {
            Ok(()) => {
                info!(%user_id, %permission_id, "custom permission removed");
                Ok(())
            }
            Err(StoreError::NotFound) => Err(AccessError::OverrideNotFound {
                user_id,
                permission_id,
            }),
            Err(e) => Err(e.into()),
        }
    }

    // ------------------------------------------------------------------
    // Role permissions
    // ------------------------------------------------------------------

    /// Link a permission to a role.
    pub async fn add_role_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> AccessResult<()> {
        self.require_role(role_id).await?;
        self.require_permission(permission_id).await?;

        match self.store.link_role_permission(role_id, permission_id).await {
            Ok(()) => Ok(()),
            Err(StoreError::AlreadyExists) => Err(AccessError::DuplicateLink {
                role_id,
                permission_id,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Unlink a permission from a role.
    pub async fn remove_role_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> AccessResult<()> {
        match self
            .store
            .unlink_role_permission(role_id, permission_id)
            .await
        {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(AccessError::LinkNotFound {
                role_id,
                permission_id,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the permissions linked to a role with exactly `permission_ids`.
    pub async fn update_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> AccessResult<()> {
        self.require_role(role_id).await?;

        let mut ids = Vec::with_capacity(permission_ids.len());
        for permission_id in permission_ids {
            self.require_permission(*permission_id).await?;
            if !ids.contains(permission_id) {
                ids.push(*permission_id);
            }
        }

        self.store.replace_role_permissions(role_id, ids).await?;
        info!(%role_id, permissions = permission_ids.len(), "role permissions replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPermissionStore;

    fn admin() -> AccessAdmin {
        AccessAdmin::new(Arc::new(MemoryPermissionStore::new()))
    }

    #[tokio::test]
    async fn test_create_role_derives_slug() {
        let admin = admin();
        let role = admin
            .create_role(CreateRoleParams {
                name: "Account Manager".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(role.slug, "account-manager");

        let err = admin
            .create_role(CreateRoleParams {
                name: "Account  Manager".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::DuplicateRole(slug) if slug == "account-manager"));
    }

    #[tokio::test]
    async fn test_create_permission_validates_name() {
        let admin = admin();
        let err = admin.create_permission("users", None).await.unwrap_err();
        assert!(matches!(err, AccessError::InvalidPermission(_)));

        admin.create_permission("Users:Read", None).await.unwrap();
        let err = admin
            .create_permission("users:read", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::DuplicatePermission(name) if name == "users:read"));

        let found = admin.find_permission("USERS:read").await.unwrap();
        assert_eq!(found.name(), "users:read");
    }

    #[tokio::test]
    async fn test_assign_role_unknown_ids() {
        let admin = admin();
        let user = admin.create_user(User::new("a@example.com")).await.unwrap();

        let err = admin
            .assign_role(Uuid::now_v7(), Uuid::now_v7(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::UserNotFound(_)));

        let err = admin
            .assign_role(user.id, Uuid::now_v7(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::RoleNotFound(_)));
    }

    #[tokio::test]
    async fn test_link_duplicate_rejected() {
        let admin = admin();
        let role = admin
            .create_role(CreateRoleParams {
                name: "Manager".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let perm = admin.create_permission("users:read", None).await.unwrap();

        admin.add_role_permission(role.id, perm.id).await.unwrap();
        let err = admin
            .add_role_permission(role.id, perm.id)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "DUPLICATE_LINK");

        admin.remove_role_permission(role.id, perm.id).await.unwrap();
        let err = admin
            .remove_role_permission(role.id, perm.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::LinkNotFound { .. }));
        assert_eq!(err.error_code(), "LINK_NOT_FOUND");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_team_membership_duplicate() {
        let admin = admin();
        let user = admin.create_user(User::new("a@example.com")).await.unwrap();
        let team = admin.create_team("Sales").await.unwrap();

        admin.add_team_member(team.id, user.id).await.unwrap();
        let err = admin.add_team_member(team.id, user.id).await.unwrap_err();
        assert!(matches!(err, AccessError::DuplicateMembership { .. }));

        let err = admin.create_team("sales").await.unwrap_err();
        assert!(matches!(err, AccessError::DuplicateTeam(_)));
    }
}
