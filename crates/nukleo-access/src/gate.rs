//! Boolean permission checks consumed by request handlers.
//!
//! Checks never fail. A store error during a check is logged and the check
//! answers `false`, so a broken backend degrades to "forbidden".

use nukleo_rbac::PermissionSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AccessError, AccessResult};
use crate::resolver::PermissionResolver;

/// Permission gate.
///
/// # Matching
///
/// For a requested `resource:action`, compared verbatim:
/// 1. exact match in the effective set
/// 2. `admin:*` in the effective set
/// 3. `resource:*` in the effective set
/// 4. otherwise deny
#[derive(Debug, Clone)]
pub struct PermissionGate {
    resolver: PermissionResolver,
    log_denials: bool,
}

impl PermissionGate {
    /// Create a gate over a permission resolver.
    pub fn new(resolver: PermissionResolver) -> Self {
        Self {
            resolver,
            log_denials: false,
        }
    }

    /// Log denied checks at debug level.
    pub fn with_denial_logging(mut self, enabled: bool) -> Self {
        self.log_denials = enabled;
        self
    }

    async fn effective(&self, user_id: Uuid) -> Option<PermissionSet> {
        match self.resolver.get_user_permissions(user_id).await {
            Ok(set) => Some(set),
            Err(e) => {
                warn!(%user_id, error = %e, "permission resolution failed, denying");
                None
            }
        }
    }

    fn denied(&self, user_id: Uuid, permissions: &[&str]) {
        if self.log_denials {
            debug!(%user_id, ?permissions, "permission denied");
        }
    }

    /// Check a single `resource:action` permission.
    pub async fn has_permission(&self, user_id: Uuid, permission: &str) -> bool {
        let allowed = match self.effective(user_id).await {
            Some(set) => set.has_str(permission),
            None => false,
        };
        if !allowed {
            self.denied(user_id, &[permission]);
        }
        allowed
    }

    /// True if any of the permissions is granted.
    pub async fn has_any_permission(&self, user_id: Uuid, permissions: &[&str]) -> bool {
        let allowed = match self.effective(user_id).await {
            Some(set) => permissions.iter().any(|p| set.has_str(p)),
            None => false,
        };
        if !allowed {
            self.denied(user_id, permissions);
        }
        allowed
    }

    /// True only if every permission is granted. An empty list is granted
    /// whenever the effective set can be resolved.
    pub async fn has_all_permissions(&self, user_id: Uuid, permissions: &[&str]) -> bool {
        let allowed = match self.effective(user_id).await {
            Some(set) => permissions.iter().all(|p| set.has_str(p)),
            None => false,
        };
        if !allowed {
            self.denied(user_id, permissions);
        }
        allowed
    }

    /// Like [`Self::has_permission`], but returns `AccessError::Forbidden` on
    /// deny so handlers can turn it into a 403 with `?`.
    pub async fn require_permission(&self, user_id: Uuid, permission: &str) -> AccessResult<()> {
        if self.has_permission(user_id, permission).await {
            Ok(())
        } else {
            Err(AccessError::Forbidden(permission.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPermissionStore;
    use crate::store::PermissionStore;
    use nukleo_org::{PermissionOverride, PermissionRecord, User};
    use nukleo_rbac::Permission;
    use std::sync::Arc;

    async fn gate_with_override(name: &str) -> (PermissionGate, Arc<MemoryPermissionStore>, Uuid) {
        let store = Arc::new(MemoryPermissionStore::new());
        let user = User::new("a@example.com");
        let record = PermissionRecord::new(Permission::parse(name).unwrap());
        store.insert_user(user.clone()).await.unwrap();
        store.insert_permission(record.clone()).await.unwrap();
        store
            .insert_override(PermissionOverride::new(user.id, record.id))
            .await
            .unwrap();

        let gate = PermissionGate::new(PermissionResolver::new(store.clone(), "superadmin"))
            .with_denial_logging(true);
        (gate, store, user.id)
    }

    #[tokio::test]
    async fn test_require_permission() {
        let (gate, _, user_id) = gate_with_override("invoices:*").await;

        assert!(gate.require_permission(user_id, "invoices:send").await.is_ok());
        let err = gate
            .require_permission(user_id, "quotes:send")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_requested_name_compared_verbatim() {
        let (gate, _, user_id) = gate_with_override("users:read").await;

        assert!(gate.has_permission(user_id, "users:read").await);
        assert!(!gate.has_permission(user_id, "Users:READ").await);
        assert!(!gate.has_permission(user_id, " users : read ").await);
        assert!(!gate.has_any_permission(user_id, &["USERS:read"]).await);
    }

    #[tokio::test]
    async fn test_master_grants_non_canonical_names() {
        let (gate, _, user_id) = gate_with_override("admin:*").await;
        assert!(gate.has_permission(user_id, "Users:READ").await);
    }

    #[tokio::test]
    async fn test_offline_store_denies() {
        let (gate, store, user_id) = gate_with_override("admin:*").await;
        assert!(gate.has_permission(user_id, "users:read").await);

        store.set_offline(true);
        assert!(!gate.has_permission(user_id, "users:read").await);
        assert!(!gate.has_any_permission(user_id, &["users:read"]).await);
    }
}
