//! Application configuration.
//!
//! A small JSON document (`config.json`) under the platform config directory
//! holding where data lives and the engine tunables. Sync credentials are not
//! kept here; they live in the settings store next to the sync status.

use anyhow::{Context, Result};
use pgk_sync::{SchedulerConfig, SyncEngineConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_DIR: &str = "pagekeep";
pub const CONFIG_FILE: &str = "config.json";
pub const SETTINGS_FILE: &str = "settings.json";
pub const LIBRARY_FILE: &str = "library.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Directory holding the settings store and the bookmark library.
    pub data_dir: PathBuf,
    pub lock_timeout_ms: u64,
    pub debounce_ms: u64,
    pub request_timeout_secs: u64,
    /// 0 disables scheduled syncs.
    pub schedule_interval_secs: u64,
    pub max_backoff_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            lock_timeout_ms: 300_000,
            debounce_ms: 5_000,
            request_timeout_secs: 60,
            schedule_interval_secs: 900,
            max_backoff_secs: 3_600,
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    pub fn library_path(&self) -> PathBuf {
        self.data_dir.join(LIBRARY_FILE)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn engine_config(&self) -> SyncEngineConfig {
        SyncEngineConfig {
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
            debounce: Duration::from_millis(self.debounce_ms),
        }
    }

    /// `None` when scheduled syncs are turned off.
    pub fn scheduler_config(&self) -> Option<SchedulerConfig> {
        if self.schedule_interval_secs == 0 {
            return None;
        }
        Some(SchedulerConfig {
            interval: Duration::from_secs(self.schedule_interval_secs),
            max_backoff: Duration::from_secs(self.max_backoff_secs),
        })
    }
}

/// `--config` if given, otherwise `<config dir>/pagekeep/config.json`.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p),
        None => {
            let dir = dirs::config_dir().context("Config directory not found")?;
            Ok(dir.join(APP_DIR).join(CONFIG_FILE))
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}
