//! Account types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SyncConfig;

/// Account status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Active.
    Active,
    /// Error state (invalid credentials, etc.).
    Error,
}

/// A remote provider account known to the control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account id (UUID).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Sync settings for this account.
    #[serde(default)]
    pub config: SyncConfig,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Account status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AccountStatus>,
    /// Error message, when status is `Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Account {
    /// New active account with default sync settings.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            config: SyncConfig::default(),
            created_at: now,
            updated_at: now,
            status: Some(AccountStatus::Active),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_is_active() {
        let account = Account::new("primary");
        assert_eq!(account.status, Some(AccountStatus::Active));
        assert!(account.error.is_none());
        assert!(account.config.sync_enabled);
    }
}
