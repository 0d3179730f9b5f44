use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Role tag carried by principals and session claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Normal,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Normal => "normal",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "normal" => Ok(Self::Normal),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// A user as seen by the gateway
///
/// Owned by the external user registry. The gateway only reads it and
/// refreshes `last_seen_at` after a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl Principal {
    pub fn new(username: impl Into<String>, role: UserRole) -> Self {
        let username = username.into();
        Self {
            id: Uuid::new_v4(),
            display_name: username.clone(),
            username,
            role,
            is_active: true,
            last_seen_at: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Partial profile change; absent fields are left as they are
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UserUpdate {
    /// Role and activation are administrative fields
    pub fn changes_role_or_status(&self) -> bool {
        self.role.is_some() || self.is_active.is_some()
    }

    pub fn apply(&self, principal: &mut Principal) {
        if let Some(display_name) = &self.display_name {
            principal.display_name = display_name.clone();
        }
        if let Some(role) = self.role {
            principal.role = role;
        }
        if let Some(is_active) = self.is_active {
            principal.is_active = is_active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
        assert_eq!("normal".parse::<UserRole>().unwrap(), UserRole::Normal);
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_update_applies_only_present_fields() {
        let mut alice = Principal::new("alice", UserRole::Normal);
        let update: UserUpdate = serde_json::from_str(r#"{"is_active": false}"#).unwrap();

        assert!(update.changes_role_or_status());
        update.apply(&mut alice);
        assert!(!alice.is_active);
        assert_eq!(alice.display_name, "alice");
        assert_eq!(alice.role, UserRole::Normal);

        let rename = UserUpdate {
            display_name: Some("Alice".into()),
            ..Default::default()
        };
        assert!(!rename.changes_role_or_status());
    }
}
