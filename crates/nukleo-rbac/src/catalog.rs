//! # Catalog
//!
//! The fixed catalog of permission names and default roles that is ensured
//! to exist at process start.
//!
//! Resources are grouped by the ERP area that owns them:
//! - **Administration**: users, teams, roles, permissions, settings
//! - **CRM**: clients, contacts, opportunities, quotes
//! - **Finance**: invoices, subscriptions, expenses
//! - **Delivery**: projects, tasks, time_entries, tickets
//! - **CMS**: pages, forms, menus, themes, media
//! - **Insights**: reports, leo (the AI assistant)

use crate::permissions::Permission;

/// Slug of the role that short-circuits to the master permission.
pub const SUPERADMIN_SLUG: &str = "superadmin";

/// Slug of the role that is granted `admin:*` through an ordinary link.
pub const ADMIN_SLUG: &str = "admin";

/// All resources known to the default catalog.
pub const RESOURCES: &[&str] = &[
    "users",
    "teams",
    "roles",
    "permissions",
    "projects",
    "tasks",
    "clients",
    "contacts",
    "opportunities",
    "quotes",
    "invoices",
    "subscriptions",
    "expenses",
    "tickets",
    "time_entries",
    "pages",
    "forms",
    "menus",
    "themes",
    "media",
    "settings",
    "reports",
    "leo",
];

/// Actions generated for every resource.
pub const STANDARD_ACTIONS: &[&str] = &["create", "read", "update", "delete", "list"];

/// Permission names outside the resource × action grid.
pub const EXTRA_PERMISSIONS: &[&str] = &[
    "invoices:send",
    "reports:export",
    "settings:manage",
    "leo:chat",
    "reports:*",
    "admin:*",
];

/// Business resources a manager may fully operate on.
const MANAGER_RESOURCES: &[&str] = &[
    "projects",
    "tasks",
    "clients",
    "contacts",
    "opportunities",
    "quotes",
    "invoices",
    "subscriptions",
    "expenses",
    "tickets",
    "time_entries",
];

/// A role definition in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTemplate {
    /// Unique slug.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Whether the role is managed by the system.
    pub is_system: bool,
    /// Permission names linked to the role.
    pub permissions: Vec<String>,
}

impl RoleTemplate {
    /// Create a role template.
    pub fn new(
        slug: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        is_system: bool,
    ) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            description: description.into(),
            is_system,
            permissions: Vec::new(),
        }
    }

    /// Add permission names to the template.
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions.extend(permissions.into_iter().map(Into::into));
        self
    }
}

/// A catalog of permission names and role templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// Permission names, in seeding order.
    pub permissions: Vec<String>,
    /// Role templates, in seeding order.
    pub roles: Vec<RoleTemplate>,
}

impl Catalog {
    /// Build the default Nukleo catalog.
    ///
    /// # Example
    ///
    /// ```
    /// use nukleo_rbac::catalog::Catalog;
    ///
    /// let catalog = Catalog::default_catalog();
    /// assert!(catalog.permissions.iter().any(|p| p == "users:read"));
    /// assert!(catalog.role("manager").is_some());
    /// ```
    pub fn default_catalog() -> Self {
        let mut permissions = Vec::new();
        for resource in RESOURCES {
            for action in STANDARD_ACTIONS {
                permissions.push(format!("{}:{}", resource, action));
            }
        }
        permissions.extend(EXTRA_PERMISSIONS.iter().map(|p| p.to_string()));

        let superadmin = RoleTemplate::new(
            SUPERADMIN_SLUG,
            "Super Administrator",
            "Unrestricted access to every tenant feature",
            true,
        );

        let admin = RoleTemplate::new(
            ADMIN_SLUG,
            "Administrator",
            "Full administrative access",
            true,
        )
        .with_permissions(["admin:*"]);

        let mut manager_perms: Vec<String> = MANAGER_RESOURCES
            .iter()
            .flat_map(|r| STANDARD_ACTIONS.iter().map(move |a| format!("{}:{}", r, a)))
            .collect();
        manager_perms.extend(
            [
                "users:read",
                "users:list",
                "teams:read",
                "teams:list",
                "invoices:send",
                "reports:*",
                "leo:chat",
            ]
            .iter()
            .map(|p| p.to_string()),
        );
        let manager = RoleTemplate::new(
            "manager",
            "Manager",
            "Manages business records and team work",
            false,
        )
        .with_permissions(manager_perms);

        let user = RoleTemplate::new("user", "User", "Standard member access", false)
            .with_permissions([
                "projects:read",
                "projects:list",
                "tasks:read",
                "tasks:list",
                "tasks:update",
                "clients:read",
                "clients:list",
                "contacts:read",
                "contacts:list",
                "time_entries:create",
                "time_entries:read",
                "time_entries:update",
                "time_entries:delete",
                "time_entries:list",
                "tickets:create",
                "tickets:read",
                "tickets:list",
                "leo:chat",
            ]);

        Self {
            permissions,
            roles: vec![superadmin, admin, manager, user],
        }
    }

    /// Look up a role template by slug.
    pub fn role(&self, slug: &str) -> Option<&RoleTemplate> {
        self.roles.iter().find(|r| r.slug == slug)
    }

    /// Check that every name in the catalog parses and that every role only
    /// references names the catalog declares.
    ///
    /// # Returns
    ///
    /// The offending names, empty when the catalog is consistent.
    pub fn inconsistencies(&self) -> Vec<String> {
        let mut bad: Vec<String> = self
            .permissions
            .iter()
            .filter(|p| Permission::parse(p).is_err())
            .cloned()
            .collect();

        for role in &self.roles {
            for perm in &role.permissions {
                if !self.permissions.contains(perm) {
                    bad.push(format!("{}:{}", role.slug, perm));
                }
            }
        }
        bad
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_consistent() {
        let catalog = Catalog::default_catalog();
        assert!(catalog.inconsistencies().is_empty());
    }

    #[test]
    fn test_default_catalog_has_no_duplicate_names() {
        let catalog = Catalog::default_catalog();
        let mut names = catalog.permissions.clone();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), catalog.permissions.len());
    }

    #[test]
    fn test_superadmin_has_no_links() {
        let catalog = Catalog::default_catalog();
        let superadmin = catalog.role(SUPERADMIN_SLUG).unwrap();
        assert!(superadmin.is_system);
        assert!(superadmin.permissions.is_empty());
    }

    #[test]
    fn test_admin_holds_master_permission() {
        let catalog = Catalog::default_catalog();
        let admin = catalog.role(ADMIN_SLUG).unwrap();
        assert_eq!(admin.permissions, vec!["admin:*".to_string()]);
    }

    #[test]
    fn test_manager_can_read_users() {
        let catalog = Catalog::default_catalog();
        let manager = catalog.role("manager").unwrap();
        assert!(manager.permissions.contains(&"users:read".to_string()));
        assert!(manager.permissions.contains(&"users:list".to_string()));
        assert!(!manager.permissions.contains(&"users:delete".to_string()));
    }

    #[test]
    fn test_inconsistencies_reports_unknown_names() {
        let catalog = Catalog {
            permissions: vec!["users:read".to_string(), "broken".to_string()],
            roles: vec![RoleTemplate::new("x", "X", "", false).with_permissions(["teams:read"])],
        };
        assert_eq!(
            catalog.inconsistencies(),
            vec!["broken".to_string(), "x:teams:read".to_string()]
        );
    }
}
