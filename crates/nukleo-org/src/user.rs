//! User domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user account within a Nukleo tenant.
///
/// Users own role assignments and permission overrides; both live in
/// [`crate::assignment`].
///
/// # Examples
///
/// ```
/// use nukleo_org::User;
///
/// let user = User::new("ada@example.com").with_name("Ada", "Lovelace");
/// assert!(user.is_active);
/// assert_eq!(user.full_name().as_deref(), Some("Ada Lovelace"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Login email
    pub email: String,

    /// Given name
    pub first_name: Option<String>,

    /// Family name
    pub last_name: Option<String>,

    /// Whether the account is active
    pub is_active: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new active user with a UUID v7 ID.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            email: email.into(),
            first_name: None,
            last_name: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Set the user's given and family names.
    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    /// Mark the account inactive.
    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Full display name, if any name part is set.
    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(first), None) => Some(first.clone()),
            (None, Some(last)) => Some(last.clone()),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let user = User::new("bob@example.com");
        assert_eq!(user.email, "bob@example.com");
        assert!(user.is_active);
        assert!(user.full_name().is_none());
    }

    #[test]
    fn test_user_partial_name() {
        let mut user = User::new("bob@example.com");
        user.first_name = Some("Bob".to_string());
        assert_eq!(user.full_name().as_deref(), Some("Bob"));
    }

    #[test]
    fn test_user_deactivated() {
        let user = User::new("bob@example.com").deactivated();
        assert!(!user.is_active);
    }
}
