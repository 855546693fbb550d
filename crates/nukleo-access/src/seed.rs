//! Idempotent bootstrap of the permission and role catalog.
//!
//! Each entry is looked up by its unique key (permission name, role slug)
//! and created only if absent; role links are added only if missing.
//! Re-running on a seeded store changes nothing and reports zero creations.

use nukleo_org::{PermissionRecord, Role};
use nukleo_rbac::{Catalog, Permission};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::error::AccessResult;
use crate::store::{PermissionStore, StoreError};

/// Summary of a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Permission rows created
    pub permissions_created: usize,
    /// Role rows created
    pub roles_created: usize,
    /// Role/permission links created
    pub links_created: usize,
}

impl SeedReport {
    /// True if the run created nothing.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Seed the default Nukleo catalog.
pub async fn seed_defaults(store: &dyn PermissionStore) -> AccessResult<SeedReport> {
    seed_catalog(store, &Catalog::default_catalog()).await
}

/// Seed an arbitrary catalog.
pub async fn seed_catalog(
    store: &dyn PermissionStore,
    catalog: &Catalog,
) -> AccessResult<SeedReport> {
    let mut report = SeedReport::default();

    for name in &catalog.permissions {
        ensure_permission(store, name, &mut report).await?;
    }

    for template in &catalog.roles {
        let role = match store.find_role_by_slug(&template.slug).await? {
            Some(role) => role,
            None => {
                let mut role = Role::with_slug(&template.name, &template.slug)
                    .with_description(&template.description);
                role.is_system = template.is_system;
                insert_or_existing_role(store, role, &mut report).await?
            }
        };

        let linked: HashSet<_> = store
            .permissions_for_role(role.id)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();

        for name in &template.permissions {
            let record = ensure_permission(store, name, &mut report).await?;
            if linked.contains(&record.id) {
                continue;
            }
            match store.link_role_permission(role.id, record.id).await {
                Ok(()) => report.links_created += 1,
                // Linked concurrently; the end state is what we want.
                Err(StoreError::AlreadyExists) => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    if report.is_noop() {
        debug!("access catalog already seeded");
    } else {
        info!(
            permissions = report.permissions_created,
            roles = report.roles_created,
            links = report.links_created,
            "access catalog seeded"
        );
    }
    Ok(report)
}

async fn ensure_permission(
    store: &dyn PermissionStore,
    name: &str,
    report: &mut SeedReport,
) -> AccessResult<PermissionRecord> {
    let permission = Permission::parse(name)?;
    let canonical = permission.to_string();

    if let Some(existing) = store.find_permission_by_name(&canonical).await? {
        return Ok(existing);
    }

    let record = PermissionRecord::new(permission);
    match store.insert_permission(record.clone()).await {
        Ok(()) => {
            report.permissions_created += 1;
            Ok(record)
        }
        Err(StoreError::AlreadyExists) => store
            .find_permission_by_name(&canonical)
            .await?
            .ok_or_else(|| StoreError::NotFound.into()),
        Err(e) => Err(e.into()),
    }
}

async fn insert_or_existing_role(
    store: &dyn PermissionStore,
    role: Role,
    report: &mut SeedReport,
) -> AccessResult<Role> {
    match store.insert_role(role.clone()).await {
        Ok(()) => {
            report.roles_created += 1;
            Ok(role)
        }
        Err(StoreError::AlreadyExists) => store
            .find_role_by_slug(&role.slug)
            .await?
            .ok_or_else(|| StoreError::NotFound.into()),
        Err(e) => Err(e.into()),
    }
}
