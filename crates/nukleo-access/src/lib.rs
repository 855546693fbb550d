//! # Nukleo Access Control
//!
//! Role-based access control resolution for Nukleo request handlers.
//!
//! ## Overview
//!
//! - **Store**: the [`PermissionStore`] trait over role, permission and
//!   assignment records, with an in-memory implementation
//! - **Resolution**: [`RoleResolver`] and [`PermissionResolver`] compute a
//!   user's roles and effective permission set
//! - **Gate**: [`PermissionGate`] answers allow/deny for handlers
//! - **Admin**: [`AccessAdmin`] mutates assignments, overrides and role links
//! - **Seeding**: [`seed_defaults`] ensures the default catalog exists
//!
//! ## Architecture
//!
//! ```text
//! handler ─→ PermissionGate ─→ PermissionResolver
//!                                 ├─→ RoleResolver ─→ PermissionStore
//!                                 └─→ PermissionStore (links, overrides)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use nukleo_access::{AccessConfig, AccessControl, MemoryPermissionStore};
//! use nukleo_org::User;
//!
//! # async fn example() -> nukleo_access::AccessResult<()> {
//! let store = Arc::new(MemoryPermissionStore::new());
//! let access = AccessControl::bootstrap(store, AccessConfig::from_env()).await?;
//!
//! let user = access.admin().create_user(User::new("ada@example.com")).await?;
//! let manager = access.admin().find_role("manager").await?;
//! access.admin().assign_role(user.id, manager.id, None).await?;
//!
//! assert!(access.has_permission(user.id, "users:read").await);
//! assert!(!access.has_permission(user.id, "users:delete").await);
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod config;
pub mod error;
pub mod gate;
pub mod memory;
pub mod resolver;
pub mod seed;
pub mod store;

pub use admin::{AccessAdmin, CreateRoleParams};
pub use config::{AccessConfig, ConfigError};
pub use error::{AccessError, AccessResult};
pub use gate::PermissionGate;
pub use memory::MemoryPermissionStore;
pub use resolver::{PermissionResolver, RoleResolver};
pub use seed::{seed_catalog, seed_defaults, SeedReport};
pub use store::{PermissionStore, StoreError, StoreResult};

use nukleo_org::Role;
use nukleo_rbac::PermissionSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Entry point bundling a store with configuration.
///
/// Cloning is cheap; clones share the store.
#[derive(Clone)]
pub struct AccessControl {
    store: Arc<dyn PermissionStore>,
    config: AccessConfig,
    gate: PermissionGate,
}

impl std::fmt::Debug for AccessControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessControl")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AccessControl {
    /// Create an access-control handle without seeding.
    pub fn new(store: Arc<dyn PermissionStore>, config: AccessConfig) -> AccessResult<Self> {
        config.validate()?;

        let resolver = PermissionResolver::new(store.clone(), config.superadmin_role_slug.clone());
        let gate = PermissionGate::new(resolver).with_denial_logging(config.log_denials);

        Ok(Self {
            store,
            config,
            gate,
        })
    }

    /// Create an access-control handle and, if configured, seed the
    /// default catalog.
    pub async fn bootstrap(
        store: Arc<dyn PermissionStore>,
        config: AccessConfig,
    ) -> AccessResult<Self> {
        let access = Self::new(store, config)?;
        if access.config.seed_on_startup {
            let report = access.seed().await?;
            info!(?report, "access control bootstrapped");
        }
        Ok(access)
    }

    /// Seed the default catalog.
    pub async fn seed(&self) -> AccessResult<SeedReport> {
        seed_defaults(self.store.as_ref()).await
    }

    /// The active configuration.
    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    /// The backing store.
    pub fn store(&self) -> Arc<dyn PermissionStore> {
        self.store.clone()
    }

    /// The permission gate.
    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    /// A permission resolver over the store.
    pub fn resolver(&self) -> PermissionResolver {
        PermissionResolver::new(self.store.clone(), self.config.superadmin_role_slug.clone())
    }

    /// Admin operations over the store.
    pub fn admin(&self) -> AccessAdmin {
        AccessAdmin::new(self.store.clone())
    }

    /// See [`RoleResolver::get_user_roles`].
    pub async fn get_user_roles(&self, user_id: Uuid) -> AccessResult<Vec<Role>> {
        RoleResolver::new(self.store.clone())
            .get_user_roles(user_id)
            .await
    }

    /// See [`PermissionResolver::get_user_permissions`].
    pub async fn get_user_permissions(&self, user_id: Uuid) -> AccessResult<PermissionSet> {
        self.resolver().get_user_permissions(user_id).await
    }

    /// See [`PermissionGate::has_permission`].
    pub async fn has_permission(&self, user_id: Uuid, permission: &str) -> bool {
        self.gate.has_permission(user_id, permission).await
    }

    /// See [`PermissionGate::has_any_permission`].
    pub async fn has_any_permission(&self, user_id: Uuid, permissions: &[&str]) -> bool {
        self.gate.has_any_permission(user_id, permissions).await
    }

    /// See [`PermissionGate::has_all_permissions`].
    pub async fn has_all_permissions(&self, user_id: Uuid, permissions: &[&str]) -> bool {
        self.gate.has_all_permissions(user_id, permissions).await
    }

    /// See [`PermissionGate::require_permission`].
    pub async fn require_permission(&self, user_id: Uuid, permission: &str) -> AccessResult<()> {
        self.gate.require_permission(user_id, permission).await
    }
}
