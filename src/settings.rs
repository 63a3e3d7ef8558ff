//! # Settings Store
//!
//! JSON-file backed store for the sync settings and the persisted sync status.
//!
//! ## Features
//!
//! - One document holding `sync` (endpoint, credentials, policy) and
//!   `syncStatus` (last sync time / error)
//! - Whole-document writes through a temp file and rename
//! - Writers serialised with an async mutex so a status save never races a
//!   settings save
//!
//! ## Data Structure
//!
//! ```json
//! {
//!   "sync": { "enabled": true, "url": "https://dav.example.com/dav", "username": "alice",
//!             "password": "…", "path": "PageKeep", "allowInsecureHttp": false },
//!   "syncStatus": { "lastSyncTime": "2024-06-01T12:00:00Z", "lastSyncError": null }
//! }
//! ```
//!
//! `isSyncing` is never trusted from disk; it is always written as `false`
//! and recomputed from the live lock when read through the engine.

use crate::persist::{read_json, write_json_atomic};
use async_trait::async_trait;
use pgk_core::{SettingsStore, SyncError, SyncSettings, SyncStatus};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// On-disk layout of the settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsDocument {
    pub sync: SyncSettings,
    pub sync_status: SyncStatus,
}

pub struct JsonSettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonSettingsStore {
    /// Creates a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole settings document.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Store` if the file exists but cannot be read or
    /// parsed. A missing file is not an error.
    pub async fn load_document(&self) -> Result<SettingsDocument, SyncError> {
        read_json(&self.path).await
    }

    /// Replaces the sync settings, keeping the stored status.
    ///
    /// # Arguments
    ///
    /// * `settings` - The new endpoint, credentials and policy
    pub async fn save_sync_settings(&self, settings: &SyncSettings) -> Result<(), SyncError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load_document().await?;
        doc.sync = settings.clone();
        write_json_atomic(&self.path, &doc).await
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn load_sync_settings(&self) -> Result<SyncSettings, SyncError> {
        Ok(self.load_document().await?.sync)
    }

    async fn load_sync_status(&self) -> Result<SyncStatus, SyncError> {
        let mut status = self.load_document().await?.sync_status;
        status.is_syncing = false;
        Ok(status)
    }

    async fn save_sync_status(&self, status: &SyncStatus) -> Result<(), SyncError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load_document().await?;
        doc.sync_status = SyncStatus {
            is_syncing: false,
            ..status.clone()
        };
        write_json_atomic(&self.path, &doc).await
    }
}
