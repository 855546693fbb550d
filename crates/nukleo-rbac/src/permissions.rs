//! # Permissions
//!
//! Core permission types and the effective permission set.
//! A permission combines a resource segment with an action segment; either
//! segment may be the `*` wildcard.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Wildcard marker used in permission strings.
pub const WILDCARD: &str = "*";

/// Resource name of the master permission.
pub const MASTER_RESOURCE: &str = "admin";

/// Error returned when a permission string cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PermissionParseError {
    /// The string has no `:` separator.
    #[error("permission '{0}' is missing the ':' separator")]
    MissingSeparator(String),

    /// The resource half is empty.
    #[error("permission '{0}' has an empty resource")]
    EmptyResource(String),

    /// The action half is empty.
    #[error("permission '{0}' has an empty action")]
    EmptyAction(String),
}

/// One half of a permission: a concrete name or the `*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// Matches every name in this position (`*`).
    Any,
    /// A concrete lowercase name.
    Named(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == WILDCARD {
            Segment::Any
        } else {
            Segment::Named(raw.to_lowercase())
        }
    }

    /// Get the string form of the segment.
    pub fn as_str(&self) -> &str {
        match self {
            Segment::Any => WILDCARD,
            Segment::Named(name) => name,
        }
    }

    /// Check if this segment is the wildcard.
    pub fn is_any(&self) -> bool {
        matches!(self, Segment::Any)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A permission is a `resource:action` pair.
///
/// The string form is split on the first `:` only, so an action may itself
/// contain colons.
///
/// # Example
///
/// ```
/// use nukleo_rbac::permissions::Permission;
///
/// let perm = Permission::parse("users:read").unwrap();
/// assert_eq!(perm.to_string(), "users:read");
/// assert_eq!(perm.resource.as_str(), "users");
///
/// let wildcard = Permission::parse("reports:*").unwrap();
/// assert!(wildcard.is_resource_wildcard());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission {
    /// The resource this permission applies to.
    pub resource: Segment,
    /// The action allowed on the resource.
    pub action: Segment,
}

impl Permission {
    /// Create a permission from concrete resource and action names.
    ///
    /// `*` in either position is interpreted as the wildcard.
    pub fn new(resource: &str, action: &str) -> Self {
        Self {
            resource: Segment::parse(resource),
            action: Segment::parse(action),
        }
    }

    /// The master permission `admin:*`, which grants everything.
    pub fn master() -> Self {
        Self {
            resource: Segment::Named(MASTER_RESOURCE.to_string()),
            action: Segment::Any,
        }
    }

    /// The resource wildcard `resource:*` for the given resource segment.
    pub fn wildcard_for(resource: &Segment) -> Self {
        Self {
            resource: resource.clone(),
            action: Segment::Any,
        }
    }

    /// Parse from a `resource:action` string.
    ///
    /// # Example
    ///
    /// ```
    /// use nukleo_rbac::permissions::{Permission, Segment};
    ///
    /// let perm = Permission::parse("Invoices:Send").unwrap();
    /// assert_eq!(perm.action, Segment::Named("send".into()));
    /// assert!(Permission::parse("invoices").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PermissionParseError> {
        let (resource, action) = s
            .split_once(':')
            .ok_or_else(|| PermissionParseError::MissingSeparator(s.to_string()))?;

        if resource.trim().is_empty() {
            return Err(PermissionParseError::EmptyResource(s.to_string()));
        }
        if action.trim().is_empty() {
            return Err(PermissionParseError::EmptyAction(s.to_string()));
        }

        Ok(Self::new(resource, action))
    }

    /// Check if this is the master permission `admin:*`.
    pub fn is_master(&self) -> bool {
        *self == Self::master()
    }

    /// Check if this permission grants every action on its resource.
    pub fn is_resource_wildcard(&self) -> bool {
        self.action.is_any()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

impl std::str::FromStr for Permission {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Permission {
    type Error = PermissionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.to_string()
    }
}

/// An effective permission set for a user or role.
///
/// Membership checks follow a fixed order:
/// 1. exact match
/// 2. the master permission `admin:*`
/// 3. the resource wildcard `resource:*`
///
/// A stored `*:action` entry is only ever matched exactly; it is not a
/// crossed wildcard.
///
/// # Example
///
/// ```
/// use nukleo_rbac::permissions::{Permission, PermissionSet};
///
/// let set = PermissionSet::from_strings(&["users:read", "reports:*"]);
///
/// assert!(set.has(&Permission::parse("users:read").unwrap()));
/// assert!(set.has(&Permission::parse("reports:export").unwrap()));
/// assert!(!set.has(&Permission::parse("users:delete").unwrap()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    permissions: HashSet<Permission>,
}

impl PermissionSet {
    /// Create a new empty permission set.
    pub fn new() -> Self {
        Self {
            permissions: HashSet::new(),
        }
    }

    /// The single-element set `{admin:*}`.
    pub fn master() -> Self {
        let mut set = Self::new();
        set.insert(Permission::master());
        set
    }

    /// Add a permission to the set.
    ///
    /// # Returns
    ///
    /// `true` if the permission was not already present
    pub fn insert(&mut self, permission: Permission) -> bool {
        self.permissions.insert(permission)
    }

    /// Remove a permission from the set.
    pub fn remove(&mut self, permission: &Permission) -> bool {
        self.permissions.remove(permission)
    }

    /// Exact membership, without wildcard expansion.
    pub fn contains(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// Check if the set grants a permission.
    pub fn has(&self, permission: &Permission) -> bool {
        if self.permissions.contains(permission) {
            return true;
        }

        if self.is_master() {
            return true;
        }

        self.permissions
            .contains(&Permission::wildcard_for(&permission.resource))
    }

    /// Check a permission given in string form.
    ///
    /// The string is compared verbatim: it must already be in canonical
    /// `resource:action` form to match an exact or `resource:*` entry.
    /// Anything else, including a string that does not parse, can only be
    /// granted by `admin:*`.
    pub fn has_str(&self, permission: &str) -> bool {
        match Permission::parse(permission) {
            Ok(perm) if perm.to_string() == permission => self.has(&perm),
            _ => self.is_master(),
        }
    }

    /// True if any of the given permissions is granted.
    pub fn has_any<'a, I>(&self, permissions: I) -> bool
    where
        I: IntoIterator<Item = &'a Permission>,
    {
        permissions.into_iter().any(|perm| self.has(perm))
    }

    /// True only if every given permission is granted.
    pub fn has_all<'a, I>(&self, permissions: I) -> bool
    where
        I: IntoIterator<Item = &'a Permission>,
    {
        permissions.into_iter().all(|perm| self.has(perm))
    }

    /// Check if the set contains the master permission.
    pub fn is_master(&self) -> bool {
        self.permissions.contains(&Permission::master())
    }

    /// Merge another permission set into this one.
    pub fn merge(&mut self, other: &PermissionSet) {
        self.permissions.extend(other.permissions.iter().cloned());
    }

    /// Create from a list of permission strings, skipping any that do not parse.
    pub fn from_strings(perms: &[&str]) -> Self {
        perms
            .iter()
            .filter_map(|p| Permission::parse(p).ok())
            .collect()
    }

    /// Permission names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.permissions.iter().map(|p| p.to_string()).collect();
        names.sort();
        names
    }

    /// Iterate over the permissions in the set.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    /// Get the count of permissions.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self {
            permissions: iter.into_iter().collect(),
        }
    }
}

impl Extend<Permission> for PermissionSet {
    fn extend<T: IntoIterator<Item = Permission>>(&mut self, iter: T) {
        self.permissions.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perm(s: &str) -> Permission {
        Permission::parse(s).unwrap()
    }

    #[test]
    fn test_permission_parsing() {
        let p = perm("users:read");
        assert_eq!(p.resource, Segment::Named("users".to_string()));
        assert_eq!(p.action, Segment::Named("read".to_string()));

        let p = perm("reports:*");
        assert!(p.action.is_any());
        assert!(p.is_resource_wildcard());

        // Only the first colon separates
        let p = perm("settings:theme:dark");
        assert_eq!(p.resource.as_str(), "settings");
        assert_eq!(p.action.as_str(), "theme:dark");
        assert_eq!(p.to_string(), "settings:theme:dark");
    }

    #[test]
    fn test_permission_parse_errors() {
        assert_eq!(
            Permission::parse("users"),
            Err(PermissionParseError::MissingSeparator("users".to_string()))
        );
        assert!(matches!(
            Permission::parse(":read"),
            Err(PermissionParseError::EmptyResource(_))
        ));
        assert!(matches!(
            Permission::parse("users: "),
            Err(PermissionParseError::EmptyAction(_))
        ));
    }

    #[test]
    fn test_permission_normalizes_case() {
        assert_eq!(perm("Users:READ"), perm("users:read"));
    }

    #[test]
    fn test_master_permission() {
        assert_eq!(Permission::master().to_string(), "admin:*");
        assert!(perm("admin:*").is_master());
        assert!(!perm("admin:read").is_master());
    }

    #[test]
    fn test_serde_uses_string_form() {
        let json = serde_json::to_string(&perm("teams:create")).unwrap();
        assert_eq!(json, "\"teams:create\"");

        let back: Permission = serde_json::from_str("\"teams:*\"").unwrap();
        assert_eq!(back, perm("teams:*"));

        assert!(serde_json::from_str::<Permission>("\"teams\"").is_err());
    }

    #[test]
    fn test_set_exact_match() {
        let set = PermissionSet::from_strings(&["users:read"]);
        assert!(set.has(&perm("users:read")));
        assert!(!set.has(&perm("users:update")));
    }

    #[test]
    fn test_set_master_match() {
        let set = PermissionSet::master();
        assert!(set.has(&perm("anything:whatever")));
        assert!(set.has_str("not-a-permission"));
    }

    #[test]
    fn test_set_resource_wildcard_match() {
        let set = PermissionSet::from_strings(&["invoices:*"]);
        assert!(set.has(&perm("invoices:send")));
        assert!(set.has(&perm("invoices:delete")));
        assert!(!set.has(&perm("quotes:read")));
    }

    #[test]
    fn test_set_no_crossed_wildcards() {
        let set = PermissionSet::from_strings(&["*:read"]);
        assert!(!set.has(&perm("users:read")));
        assert!(set.has(&perm("*:read")));
    }

    #[test]
    fn test_set_malformed_request_denied_without_master() {
        let set = PermissionSet::from_strings(&["users:*"]);
        assert!(!set.has_str("users"));
    }

    #[test]
    fn test_set_str_requires_canonical_form() {
        let set = PermissionSet::from_strings(&["users:read", "reports:*"]);
        assert!(set.has_str("users:read"));
        assert!(set.has_str("reports:export"));
        assert!(!set.has_str("Users:READ"));
        assert!(!set.has_str(" users : read "));
        assert!(!set.has_str("REPORTS:export"));

        let master = PermissionSet::master();
        assert!(master.has_str("Users:READ"));
        assert!(master.has_str(" users : read "));
    }

    #[test]
    fn test_set_any_all() {
        let set = PermissionSet::from_strings(&["users:read", "users:list"]);
        let read = perm("users:read");
        let list = perm("users:list");
        let delete = perm("users:delete");

        assert!(set.has_any([&delete, &read]));
        assert!(!set.has_any([&delete]));
        assert!(set.has_all([&read, &list]));
        assert!(!set.has_all([&read, &delete]));

        let none: [&Permission; 0] = [];
        assert!(!set.has_any(none));
        assert!(set.has_all(none));
    }

    #[test]
    fn test_set_merge_collapses_duplicates() {
        let mut a = PermissionSet::from_strings(&["users:read", "users:list"]);
        let b = PermissionSet::from_strings(&["users:read", "teams:create"]);
        a.merge(&b);

        assert_eq!(a.len(), 3);
        assert_eq!(a.names(), vec!["teams:create", "users:list", "users:read"]);
    }
}
