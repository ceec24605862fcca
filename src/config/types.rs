//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::store::{
    PricingTable, StoreConfig, DEFAULT_IDLE_THRESHOLD_SECS, DEFAULT_MESSAGE_LIMIT,
    DEFAULT_MESSAGE_TRUNCATE_CHARS, DEFAULT_REMOVAL_TIMEOUT_SECS, DEFAULT_TOOL_HISTORY_LIMIT,
};
use crate::watcher::{WatchConfig, DEFAULT_POLL_INTERVAL, DEFAULT_SWEEP_INTERVAL, ID_SCAN_LINES};

/// Top-level configuration for the monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Claude home directory; `~/.claude` when unset.
    pub claude_dir: Option<PathBuf>,
    /// Filesystem watching knobs.
    pub watcher: WatcherSection,
    /// Session store limits.
    pub store: StoreSection,
    /// HTTP server settings.
    pub server: ServerSection,
    /// Cost estimation tiers.
    pub pricing: PricingTable,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            claude_dir: None,
            watcher: WatcherSection::default(),
            store: StoreSection::default(),
            server: ServerSection::default(),
            pricing: PricingTable::default(),
        }
    }
}

impl MonitorConfig {
    /// Resolved Claude home directory.
    #[must_use]
    pub fn claude_dir(&self) -> PathBuf {
        if let Some(dir) = &self.claude_dir {
            return dir.clone();
        }
        dirs::home_dir().map_or_else(|| PathBuf::from(".claude"), |home| home.join(".claude"))
    }

    /// Store limits and pricing assembled from this config.
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_tool_history: self.store.max_tool_history,
            max_messages: self.store.max_messages,
            max_message_chars: self.store.max_message_chars,
            idle_threshold: chrono::Duration::seconds(self.store.idle_threshold_secs),
            removal_timeout: chrono::Duration::seconds(self.store.removal_timeout_secs),
            pricing: self.pricing.clone(),
        }
    }

    /// Watch surfaces and intervals assembled from this config.
    #[must_use]
    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig {
            poll_interval: std::time::Duration::from_secs(self.watcher.poll_interval_secs),
            sweep_interval: std::time::Duration::from_secs(self.watcher.sweep_interval_secs),
            max_file_age: chrono::Duration::hours(self.watcher.max_file_age_hours),
            id_scan_lines: self.watcher.id_scan_lines,
            ..WatchConfig::for_claude_dir(&self.claude_dir())
        }
    }
}

/// Filesystem watching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherSection {
    /// Notify poll interval in seconds.
    pub poll_interval_secs: u64,
    /// Interval between staleness sweeps in seconds.
    pub sweep_interval_secs: u64,
    /// Discovery age window in hours.
    pub max_file_age_hours: i64,
    /// Head lines probed per file when deriving session ids.
    pub id_scan_lines: usize,
}

impl Default for WatcherSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL.as_secs(),
            max_file_age_hours: crate::watcher::DEFAULT_MAX_FILE_AGE_HOURS,
            id_scan_lines: ID_SCAN_LINES,
        }
    }
}

/// Session store limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Inactivity in seconds before an active session idles.
    pub idle_threshold_secs: i64,
    /// Inactivity in seconds before a session is removed.
    pub removal_timeout_secs: i64,
    /// Cap for completed tool executions kept per session.
    pub max_tool_history: usize,
    /// Cap for retained messages per session.
    pub max_messages: usize,
    /// Truncation length for message and prompt text, in chars.
    pub max_message_chars: usize,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            idle_threshold_secs: DEFAULT_IDLE_THRESHOLD_SECS,
            removal_timeout_secs: DEFAULT_REMOVAL_TIMEOUT_SECS,
            max_tool_history: DEFAULT_TOOL_HISTORY_LIMIT,
            max_messages: DEFAULT_MESSAGE_LIMIT,
            max_message_chars: DEFAULT_MESSAGE_TRUNCATE_CHARS,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to allow cross-origin requests.
    pub cors: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors: true,
        }
    }
}
