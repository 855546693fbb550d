//! In-memory permission store.
//!
//! Suitable for single-process deployments and tests. All tables live behind
//! one `RwLock`, so every trait call is atomic.

use async_trait::async_trait;
use nukleo_org::{
    PermissionOverride, PermissionRecord, Role, RoleAssignment, RolePermissionLink, Team,
    TeamMembership, TeamRoleGrant, User,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{PermissionStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    roles: HashMap<Uuid, Role>,
    permissions: HashMap<Uuid, PermissionRecord>,
    teams: HashMap<Uuid, Team>,
    memberships: Vec<TeamMembership>,
    team_roles: Vec<TeamRoleGrant>,
    assignments: Vec<RoleAssignment>,
    overrides: Vec<PermissionOverride>,
    links: Vec<RolePermissionLink>,
}

impl Tables {
    fn permissions_for(&self, ids: impl Iterator<Item = Uuid>) -> Vec<PermissionRecord> {
        let mut records: Vec<PermissionRecord> = ids
            .filter_map(|id| self.permissions.get(&id).cloned())
            .collect();
        records.sort_by_key(|r| r.name());
        records
    }
}

/// In-memory [`PermissionStore`] implementation.
///
/// Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryPermissionStore {
    tables: Arc<RwLock<Tables>>,
    offline: Arc<AtomicBool>,
}

impl std::fmt::Debug for MemoryPermissionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPermissionStore")
            .field("offline", &self.offline.load(Ordering::Relaxed))
            .finish()
    }
}

impl MemoryPermissionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable backend: while offline every call fails
    /// with `StoreError::Backend`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Backend("store offline".to_string()))
        } else {
            Ok(())
        }
    }

    /// Number of role/permission links, for diagnostics.
    pub async fn link_count(&self) -> StoreResult<usize> {
        self.check_online()?;
        Ok(self.tables.read().await.links.len())
    }
}

#[async_trait]
impl PermissionStore for MemoryPermissionStore {
    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        self.check_online()?;
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn get_role(&self, role_id: Uuid) -> StoreResult<Option<Role>> {
        self.check_online()?;
        Ok(self.tables.read().await.roles.get(&role_id).cloned())
    }

    async fn find_role_by_slug(&self, slug: &str) -> StoreResult<Option<Role>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables.roles.values().find(|r| r.slug == slug).cloned())
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        let mut roles: Vec<Role> = tables.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(roles)
    }

    async fn get_permission(&self, permission_id: Uuid) -> StoreResult<Option<PermissionRecord>> {
        self.check_online()?;
        Ok(self.tables.read().await.permissions.get(&permission_id).cloned())
    }

    async fn find_permission_by_name(&self, name: &str) -> StoreResult<Option<PermissionRecord>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables.permissions.values().find(|p| p.name() == name).cloned())
    }

    async fn list_permissions(&self) -> StoreResult<Vec<PermissionRecord>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables.permissions_for(tables.permissions.keys().copied()))
    }

    async fn get_team(&self, team_id: Uuid) -> StoreResult<Option<Team>> {
        self.check_online()?;
        Ok(self.tables.read().await.teams.get(&team_id).cloned())
    }

    async fn assignments_for_user(&self, user_id: Uuid) -> StoreResult<Vec<RoleAssignment>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn team_memberships_for_user(&self, user_id: Uuid) -> StoreResult<Vec<TeamMembership>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn roles_for_team(&self, team_id: Uuid) -> StoreResult<Vec<Uuid>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .team_roles
            .iter()
            .filter(|g| g.team_id == team_id)
            .map(|g| g.role_id)
            .collect())
    }

    async fn permissions_for_role(&self, role_id: Uuid) -> StoreResult<Vec<PermissionRecord>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        let ids = tables
            .links
            .iter()
            .filter(|l| l.role_id == role_id)
            .map(|l| l.permission_id);
        Ok(tables.permissions_for(ids))
    }

    async fn overrides_for_user(&self, user_id: Uuid) -> StoreResult<Vec<PermissionOverride>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .overrides
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_user(&self, user: User) -> StoreResult<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id)
            || tables.users.values().any(|u| u.email == user.email)
        {
            return Err(StoreError::AlreadyExists);
        }
        tables.users.insert(user.id, user);
        Ok(())
    }

    async fn insert_role(&self, role: Role) -> StoreResult<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        if tables.roles.contains_key(&role.id)
            || tables.roles.values().any(|r| r.slug == role.slug)
        {
            return Err(StoreError::AlreadyExists);
        }
        tables.roles.insert(role.id, role);
        Ok(())
    }

    async fn insert_permission(&self, permission: PermissionRecord) -> StoreResult<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        if tables.permissions.contains_key(&permission.id)
            || tables
                .permissions
                .values()
                .any(|p| p.permission == permission.permission)
        {
            return Err(StoreError::AlreadyExists);
        }
        tables.permissions.insert(permission.id, permission);
        Ok(())
    }

    async fn insert_team(&self, team: Team) -> StoreResult<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        if tables.teams.contains_key(&team.id)
            || tables.teams.values().any(|t| t.slug == team.slug)
        {
            return Err(StoreError::AlreadyExists);
        }
        tables.teams.insert(team.id, team);
        Ok(())
    }

    async fn insert_team_membership(&self, membership: TeamMembership) -> StoreResult<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        if !tables.teams.contains_key(&membership.team_id)
            || !tables.users.contains_key(&membership.user_id)
        {
            return Err(StoreError::NotFound);
        }
        if tables
            .memberships
            .iter()
            .any(|m| m.team_id == membership.team_id && m.user_id == membership.user_id)
        {
            return Err(StoreError::AlreadyExists);
        }
        tables.memberships.push(membership);
        Ok(())
    }

    async fn grant_team_role(&self, grant: TeamRoleGrant) -> StoreResult<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        if !tables.teams.contains_key(&grant.team_id) || !tables.roles.contains_key(&grant.role_id)
        {
            return Err(StoreError::NotFound);
        }
        if tables
            .team_roles
            .iter()
            .any(|g| g.team_id == grant.team_id && g.role_id == grant.role_id)
        {
            return Err(StoreError::AlreadyExists);
        }
        tables.team_roles.push(grant);
        Ok(())
    }

    async fn insert_assignment(&self, assignment: RoleAssignment) -> StoreResult<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&assignment.user_id)
            || !tables.roles.contains_key(&assignment.role_id)
        {
            return Err(StoreError::NotFound);
        }
        if let Some(team_id) = assignment.team_id {
            if !tables.teams.contains_key(&team_id) {
                return Err(StoreError::NotFound);
            }
        }
        if tables.assignments.iter().any(|a| a.same_target(&assignment)) {
            return Err(StoreError::AlreadyExists);
        }
        tables.assignments.push(assignment);
        Ok(())
    }

    async fn delete_assignment(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        team_id: Option<Uuid>,
    ) -> StoreResult<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        let before = tables.assignments.len();
        tables
            .assignments
            .retain(|a| !(a.user_id == user_id && a.role_id == role_id && a.team_id == team_id));
        if tables.assignments.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn set_assignment_active(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        team_id: Option<Uuid>,
        is_active: bool,
    ) -> StoreResult<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        let assignment = tables
            .assignments
            .iter_mut()
            .find(|a| a.user_id == user_id && a.role_id == role_id && a.team_id == team_id)
            .ok_or(StoreError::NotFound)?;
        assignment.is_active = is_active;
        Ok(())
    }

    async fn replace_direct_assignments(
        &self,
        user_id: Uuid,
        assignments: Vec<RoleAssignment>,
    ) -> StoreResult<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::NotFound);
        }
        if assignments.iter().any(|a| {
            a.user_id != user_id || !a.is_direct() || !tables.roles.contains_key(&a.role_id)
        }) {
            return Err(StoreError::NotFound);
        }

        let keep: Vec<Uuid> = assignments.iter().map(|a| a.role_id).collect();
        tables
            .assignments
            .retain(|a| a.user_id != user_id || !a.is_direct() || keep.contains(&a.role_id));

        for assignment in assignments {
            match tables
                .assignments
                .iter()
                .position(|a| a.same_target(&assignment))
            {
                Some(i) => tables.assignments[i].is_active = true,
                None => tables.assignments.push(assignment),
            }
        }
        Ok(())
    }

    async fn insert_override(&self, permission_override: PermissionOverride) -> StoreResult<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&permission_override.user_id)
            || !tables
                .permissions
                .contains_key(&permission_override.permission_id)
        {
            return Err(StoreError::NotFound);
        }
        if tables.overrides.iter().any(|o| {
            o.user_id == permission_override.user_id
                && o.permission_id == permission_override.permission_id
        }) {
            return Err(StoreError::AlreadyExists);
        }
        tables.overrides.push(permission_override);
        Ok(())
    }

    async fn delete_override(&self, user_id: Uuid, permission_id: Uuid) -> StoreResult<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        let before = tables.overrides.len();
        tables
            .overrides
            .retain(|o| !(o.user_id == user_id && o.permission_id == permission_id));
        if tables.overrides.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn link_role_permission(&self, role_id: Uuid, permission_id: Uuid) -> StoreResult<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        if !tables.roles.contains_key(&role_id) || !tables.permissions.contains_key(&permission_id)
        {
            return Err(StoreError::NotFound);
        }
        if tables
            .links
            .iter()
            .any(|l| l.role_id == role_id && l.permission_id == permission_id)
        {
            return Err(StoreError::AlreadyExists);
        }
        tables
            .links
            .push(RolePermissionLink::new(role_id, permission_id));
        Ok(())
    }

    async fn unlink_role_permission(&self, role_id: Uuid, permission_id: Uuid) -> StoreResult<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        let before = tables.links.len();
        tables
            .links
            .retain(|l| !(l.role_id == role_id && l.permission_id == permission_id));
        if tables.links.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn replace_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: Vec<Uuid>,
    ) -> StoreResult<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        if !tables.roles.contains_key(&role_id)
            || permission_ids
                .iter()
                .any(|id| !tables.permissions.contains_key(id))
        {
            return Err(StoreError::NotFound);
        }

        tables
            .links
            .retain(|l| l.role_id != role_id || permission_ids.contains(&l.permission_id));
        for permission_id in permission_ids {
            if !tables
                .links
                .iter()
                .any(|l| l.role_id == role_id && l.permission_id == permission_id)
            {
                tables
                    .links
                    .push(RolePermissionLink::new(role_id, permission_id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nukleo_rbac::Permission;

    fn record(name: &str) -> PermissionRecord {
        PermissionRecord::new(Permission::parse(name).unwrap())
    }

    #[tokio::test]
    async fn test_unique_keys() {
        let store = MemoryPermissionStore::new();
        store.insert_role(Role::new("Manager")).await.unwrap();
        assert_eq!(
            store.insert_role(Role::new("Manager")).await,
            Err(StoreError::AlreadyExists)
        );

        store.insert_permission(record("users:read")).await.unwrap();
        assert_eq!(
            store.insert_permission(record("users:read")).await,
            Err(StoreError::AlreadyExists)
        );

        store.insert_user(User::new("a@example.com")).await.unwrap();
        assert_eq!(
            store.insert_user(User::new("a@example.com")).await,
            Err(StoreError::AlreadyExists)
        );
    }

    #[tokio::test]
    async fn test_assignment_requires_rows() {
        let store = MemoryPermissionStore::new();
        let user = User::new("a@example.com");
        store.insert_user(user.clone()).await.unwrap();

        let result = store
            .insert_assignment(RoleAssignment::new(user.id, Uuid::now_v7()))
            .await;
        assert_eq!(result, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_assignment_lifecycle() {
        let store = MemoryPermissionStore::new();
        let user = User::new("a@example.com");
        let role = Role::new("Manager");
        store.insert_user(user.clone()).await.unwrap();
        store.insert_role(role.clone()).await.unwrap();

        store
            .insert_assignment(RoleAssignment::new(user.id, role.id))
            .await
            .unwrap();
        assert_eq!(
            store
                .insert_assignment(RoleAssignment::new(user.id, role.id))
                .await,
            Err(StoreError::AlreadyExists)
        );

        store
            .set_assignment_active(user.id, role.id, None, false)
            .await
            .unwrap();
        let assignments = store.assignments_for_user(user.id).await.unwrap();
        assert_eq!(assignments.len(), 1);
        assert!(!assignments[0].is_active);

        store.delete_assignment(user.id, role.id, None).await.unwrap();
        assert_eq!(
            store.delete_assignment(user.id, role.id, None).await,
            Err(StoreError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_replace_role_permissions() {
        let store = MemoryPermissionStore::new();
        let role = Role::new("Manager");
        let read = record("users:read");
        let list = record("users:list");
        let create = record("teams:create");
        store.insert_role(role.clone()).await.unwrap();
        for p in [&read, &list, &create] {
            store.insert_permission(p.clone()).await.unwrap();
        }

        store.link_role_permission(role.id, read.id).await.unwrap();
        store.link_role_permission(role.id, list.id).await.unwrap();

        store
            .replace_role_permissions(role.id, vec![list.id, create.id])
            .await
            .unwrap();

        let names: Vec<String> = store
            .permissions_for_role(role.id)
            .await
            .unwrap()
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["teams:create", "users:list"]);
        assert_eq!(store.link_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_replace_direct_assignments_keeps_team_scoped() {
        let store = MemoryPermissionStore::new();
        let user = User::new("a@example.com");
        let team = Team::new("Sales");
        let manager = Role::new("Manager");
        let viewer = Role::new("Viewer");
        store.insert_user(user.clone()).await.unwrap();
        store.insert_team(team.clone()).await.unwrap();
        store.insert_role(manager.clone()).await.unwrap();
        store.insert_role(viewer.clone()).await.unwrap();

        store
            .insert_assignment(RoleAssignment::new(user.id, manager.id))
            .await
            .unwrap();
        store
            .insert_assignment(RoleAssignment::new(user.id, manager.id).in_team(team.id))
            .await
            .unwrap();

        store
            .replace_direct_assignments(user.id, vec![RoleAssignment::new(user.id, viewer.id)])
            .await
            .unwrap();

        let assignments = store.assignments_for_user(user.id).await.unwrap();
        assert_eq!(assignments.len(), 2);
        assert!(assignments
            .iter()
            .any(|a| a.role_id == manager.id && a.team_id == Some(team.id)));
        assert!(assignments
            .iter()
            .any(|a| a.role_id == viewer.id && a.is_direct()));
    }

    #[tokio::test]
    async fn test_replace_direct_assignments_reactivates_kept_rows() {
        let store = MemoryPermissionStore::new();
        let user = User::new("a@example.com");
        let manager = Role::new("Manager");
        store.insert_user(user.clone()).await.unwrap();
        store.insert_role(manager.clone()).await.unwrap();

        let original = RoleAssignment::new(user.id, manager.id);
        store.insert_assignment(original.clone()).await.unwrap();
        store
            .set_assignment_active(user.id, manager.id, None, false)
            .await
            .unwrap();

        store
            .replace_direct_assignments(user.id, vec![RoleAssignment::new(user.id, manager.id)])
            .await
            .unwrap();

        let assignments = store.assignments_for_user(user.id).await.unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].id, original.id);
        assert!(assignments[0].is_active);
    }

    #[tokio::test]
    async fn test_offline_store_fails() {
        let store = MemoryPermissionStore::new();
        store.set_offline(true);
        assert!(matches!(
            store.list_roles().await,
            Err(StoreError::Backend(_))
        ));
        store.set_offline(false);
        assert!(store.list_roles().await.unwrap().is_empty());
    }
}
