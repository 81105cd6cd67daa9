//! Per-account sync configuration.

use serde::{Deserialize, Serialize};

use super::ConflictPolicy;

fn default_true() -> bool {
    true
}

fn default_sync_interval() -> u64 {
    900
}

fn default_freshness_max_age() -> u64 {
    900
}

fn default_run_timeout() -> u64 {
    120
}

fn default_worker_count() -> usize {
    4
}

fn default_requests_per_minute() -> u32 {
    60
}

/// Sync settings for one account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Master switch; a disabled account is skipped by scheduler and CLI.
    #[serde(default = "default_true")]
    pub sync_enabled: bool,
    /// Conflict resolution policy.
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
    /// This server's public IP, used by the classifier. Unset means no
    /// domain can classify as server-hosted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_ip: Option<String>,
    /// Scheduler tick interval in seconds.
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,
    /// A domain synced within this window is skipped unless forced.
    #[serde(default = "default_freshness_max_age")]
    pub freshness_max_age_secs: u64,
    /// Wall-clock budget for one domain run.
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,
    /// Maximum concurrent domain runs.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Remote API request budget shared by all workers.
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_enabled: true,
            conflict_policy: ConflictPolicy::default(),
            server_ip: None,
            sync_interval_secs: default_sync_interval(),
            freshness_max_age_secs: default_freshness_max_age(),
            run_timeout_secs: default_run_timeout(),
            worker_count: default_worker_count(),
            requests_per_minute: default_requests_per_minute(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_schedule() {
        let config = SyncConfig::default();
        assert!(config.sync_enabled);
        assert_eq!(config.sync_interval_secs, 900);
        assert_eq!(config.freshness_max_age_secs, 900);
        assert_eq!(config.run_timeout_secs, 120);
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.requests_per_minute, 60);
        assert_eq!(config.conflict_policy, ConflictPolicy::RemotePrecedence);
    }

    #[test]
    fn empty_json_uses_defaults() {
        let config: SyncConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SyncConfig::default());
    }
}
