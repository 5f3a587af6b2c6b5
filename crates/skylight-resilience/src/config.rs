//! Configuration types for the resilience layer

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::record::Channel;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// Element id of the mount point
    #[serde(default = "default_mount_point_id")]
    pub mount_point_id: String,
    /// CSS selector of the pre-rendered loading placeholder
    #[serde(default = "default_placeholder_selector")]
    pub placeholder_selector: String,
    #[serde(default = "default_storage_key_prefix")]
    pub storage_key_prefix: String,
    /// Global slot name exposing the latest render-boundary failure
    #[serde(default = "default_debug_slot")]
    pub debug_slot: String,
    #[serde(default = "default_export_file_prefix")]
    pub export_file_prefix: String,
    #[serde(default = "default_health_check_delay", with = "humantime_serde")]
    pub health_check_delay: Duration,
    /// Maximum level of log events forwarded to the console
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            mount_point_id: default_mount_point_id(),
            placeholder_selector: default_placeholder_selector(),
            storage_key_prefix: default_storage_key_prefix(),
            debug_slot: default_debug_slot(),
            export_file_prefix: default_export_file_prefix(),
            health_check_delay: default_health_check_delay(),
            log_level: default_log_level(),
        }
    }
}

impl ResilienceConfig {
    /// Storage key holding the record for `channel`
    pub fn storage_key(&self, channel: Channel) -> String {
        format!("{}{}", self.storage_key_prefix, channel.as_str())
    }

    /// File name of an exported record captured at `epoch_ms`
    pub fn export_file_name(&self, epoch_ms: i64) -> String {
        format!("{}-{}.json", self.export_file_prefix, epoch_ms)
    }
}

fn default_mount_point_id() -> String {
    "root".to_string()
}

fn default_placeholder_selector() -> String {
    ".loading-screen".to_string()
}

fn default_storage_key_prefix() -> String {
    "skylight.diagnostics.".to_string()
}

fn default_debug_slot() -> String {
    "__ERROR_BOUNDARY_ERROR__".to_string()
}

fn default_export_file_prefix() -> String {
    "error-log".to_string()
}

fn default_health_check_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Parse configuration from JSON text
pub fn parse_config(json: &str) -> crate::Result<ResilienceConfig> {
    serde_json::from_str(json)
        .map_err(|e| crate::ResilienceError::Config(format!("Invalid configuration: {}", e)))
}
