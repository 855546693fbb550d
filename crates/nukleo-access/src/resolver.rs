//! Role and permission resolution.
//!
//! Effective permissions are recomputed from the store on every call; there
//! is no cache to invalidate.

use nukleo_org::Role;
use nukleo_rbac::PermissionSet;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::AccessResult;
use crate::store::PermissionStore;

/// Computes the set of active roles held by a user.
///
/// A role is held when it is active and reachable through one of:
/// - a direct active assignment
/// - an active team-scoped assignment whose team is active and in which the
///   user is an active member
/// - an active membership in an active team that carries the role
#[derive(Clone)]
pub struct RoleResolver {
    store: Arc<dyn PermissionStore>,
}

impl std::fmt::Debug for RoleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleResolver").finish_non_exhaustive()
    }
}

impl RoleResolver {
    /// Create a resolver over a store.
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        Self { store }
    }

    /// Get the active roles held by a user, ordered by slug.
    ///
    /// An unknown user, or a user with no roles, yields an empty list.
    #[instrument(skip(self))]
    pub async fn get_user_roles(&self, user_id: Uuid) -> AccessResult<Vec<Role>> {
        let mut active_teams = HashSet::new();
        for membership in self.store.team_memberships_for_user(user_id).await? {
            if !membership.is_active {
                continue;
            }
            if let Some(team) = self.store.get_team(membership.team_id).await? {
                if team.is_active {
                    active_teams.insert(team.id);
                }
            }
        }

        let mut role_ids = BTreeSet::new();
        for assignment in self.store.assignments_for_user(user_id).await? {
            if !assignment.is_active {
                continue;
            }
            match assignment.team_id {
                None => {
                    role_ids.insert(assignment.role_id);
                }
                Some(team_id) if active_teams.contains(&team_id) => {
                    role_ids.insert(assignment.role_id);
                }
                Some(_) => {}
            }
        }

        for team_id in &active_teams {
            role_ids.extend(self.store.roles_for_team(*team_id).await?);
        }

        let mut roles = Vec::with_capacity(role_ids.len());
        for role_id in role_ids {
            if let Some(role) = self.store.get_role(role_id).await? {
                if role.is_active {
                    roles.push(role);
                }
            }
        }
        roles.sort_by(|a, b| a.slug.cmp(&b.slug));

        debug!(%user_id, roles = roles.len(), "resolved user roles");
        Ok(roles)
    }

    /// Check if the user holds an active role with the given slug.
    pub async fn has_role(&self, user_id: Uuid, slug: &str) -> AccessResult<bool> {
        Ok(self
            .get_user_roles(user_id)
            .await?
            .iter()
            .any(|r| r.slug == slug))
    }
}

/// Computes a user's effective permission set.
#[derive(Clone)]
pub struct PermissionResolver {
    store: Arc<dyn PermissionStore>,
    roles: RoleResolver,
    superadmin_slug: String,
}

impl std::fmt::Debug for PermissionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionResolver")
            .field("superadmin_slug", &self.superadmin_slug)
            .finish_non_exhaustive()
    }
}

impl PermissionResolver {
    /// Create a resolver over a store.
    ///
    /// # Arguments
    ///
    /// * `store` - The backing store
    /// * `superadmin_slug` - Slug of the role that short-circuits to `admin:*`
    pub fn new(store: Arc<dyn PermissionStore>, superadmin_slug: impl Into<String>) -> Self {
        Self {
            roles: RoleResolver::new(store.clone()),
            store,
            superadmin_slug: superadmin_slug.into(),
        }
    }

    /// The role resolver this permission resolver uses.
    pub fn role_resolver(&self) -> &RoleResolver {
        &self.roles
    }

    /// Get the user's effective permission set.
    ///
    /// 1. A user holding the superadmin role gets exactly `{admin:*}`, without
    ///    consulting permission rows.
    /// 2. Otherwise the permissions of every active role held are collected.
    /// 3. Direct overrides are added. Overrides never remove anything.
    #[instrument(skip(self))]
    pub async fn get_user_permissions(&self, user_id: Uuid) -> AccessResult<PermissionSet> {
        let roles = self.roles.get_user_roles(user_id).await?;

        if roles.iter().any(|r| r.slug == self.superadmin_slug) {
            debug!(%user_id, "superadmin short-circuit");
            return Ok(PermissionSet::master());
        }

        let mut effective = PermissionSet::new();
        for role in &roles {
            effective.merge(&self.get_role_permissions(role.id).await?);
        }
        effective.merge(&self.get_user_overrides(user_id).await?);

        debug!(%user_id, permissions = effective.len(), "resolved effective permissions");
        Ok(effective)
    }

    /// Permissions linked to a role, regardless of the role's active flag.
    pub async fn get_role_permissions(&self, role_id: Uuid) -> AccessResult<PermissionSet> {
        Ok(self
            .store
            .permissions_for_role(role_id)
            .await?
            .into_iter()
            .map(|record| record.permission)
            .collect())
    }

    /// Permissions granted directly to a user.
    pub async fn get_user_overrides(&self, user_id: Uuid) -> AccessResult<PermissionSet> {
        let mut set = PermissionSet::new();
        for o in self.store.overrides_for_user(user_id).await? {
            match self.store.get_permission(o.permission_id).await? {
                Some(record) => {
                    set.insert(record.permission);
                }
                None => warn!(
                    %user_id,
                    permission_id = %o.permission_id,
                    "override references a missing permission"
                ),
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPermissionStore;
    use nukleo_org::{RoleAssignment, TeamMembership, User};

    #[tokio::test]
    async fn test_has_role_by_slug() {
        let store = Arc::new(MemoryPermissionStore::new());
        let user = User::new("a@example.com");
        let role = Role::new("Manager");
        store.insert_user(user.clone()).await.unwrap();
        store.insert_role(role.clone()).await.unwrap();
        store
            .insert_assignment(RoleAssignment::new(user.id, role.id))
            .await
            .unwrap();

        let resolver = RoleResolver::new(store);
        assert!(resolver.has_role(user.id, "manager").await.unwrap());
        assert!(!resolver.has_role(user.id, "superadmin").await.unwrap());
    }

    #[tokio::test]
    async fn test_inactive_membership_drops_team_roles() {
        let store = Arc::new(MemoryPermissionStore::new());
        let user = User::new("a@example.com");
        let team = nukleo_org::Team::new("Sales");
        let role = Role::new("Sales");
        store.insert_user(user.clone()).await.unwrap();
        store.insert_team(team.clone()).await.unwrap();
        store.insert_role(role.clone()).await.unwrap();
        store
            .grant_team_role(nukleo_org::TeamRoleGrant::new(team.id, role.id))
            .await
            .unwrap();
        store
            .insert_team_membership(TeamMembership::new(team.id, user.id).inactive())
            .await
            .unwrap();

        let resolver = RoleResolver::new(store);
        assert!(resolver.get_user_roles(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_role_permissions_ignore_overrides() {
        let store = Arc::new(MemoryPermissionStore::new());
        let role = Role::new("Manager");
        let record = nukleo_org::PermissionRecord::new(nukleo_rbac::Permission::master());
        store.insert_role(role.clone()).await.unwrap();
        store.insert_permission(record.clone()).await.unwrap();
        store.link_role_permission(role.id, record.id).await.unwrap();

        let resolver = PermissionResolver::new(store, "superadmin");
        let set = resolver.get_role_permissions(role.id).await.unwrap();
        assert!(set.is_master());
        assert!(resolver
            .get_user_overrides(Uuid::now_v7())
            .await
            .unwrap()
            .is_empty());
    }
}
