// ──────────────────────────────────────────────────────────────────────────────
// pgk-core · traits
// ──────────────────────────────────────────────────────────────────────────────
// Narrow contracts between the sync engine and its collaborators:
//  • RemoteStore   : probe / ensure folder / download / upload
//  • LocalLibrary  : export, union import, last local change
//  • SettingsStore : sync settings & persisted status
//  • StatusNotifier: best-effort status broadcast
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::SyncError;
use crate::types::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Remote snapshot storage. Implementations never retry internally; the next
/// sync trigger is the retry.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Lightweight existence check. Fails open: any error reads as absent.
    async fn probe(&self, target: &RemoteTarget) -> RemoteMetadata;

    /// Make sure the target collection exists, creating parents as needed.
    async fn ensure_folder(&self, target: &RemoteTarget) -> Result<(), SyncError>;

    /// Fetch the snapshot. `Ok(None)` when the file does not exist.
    async fn download(
        &self,
        target: &RemoteTarget,
    ) -> Result<Option<BookmarkExportBundle>, SyncError>;

    /// Replace the snapshot with `bundle`.
    async fn upload(
        &self,
        target: &RemoteTarget,
        bundle: &BookmarkExportBundle,
    ) -> Result<(), SyncError>;
}

/// The local bookmark store as seen by the sync engine.
#[async_trait]
pub trait LocalLibrary: Send + Sync {
    async fn export_all(&self) -> Result<BookmarkExportBundle, SyncError>;

    /// Import with skip-on-duplicate-URL semantics. Existing bookmarks are
    /// never overwritten.
    async fn import_bookmarks(
        &self,
        bundle: &BookmarkExportBundle,
    ) -> Result<ImportSummary, SyncError>;

    async fn last_local_update(&self) -> Result<Option<DateTime<Utc>>, SyncError>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load_sync_settings(&self) -> Result<SyncSettings, SyncError>;

    async fn load_sync_status(&self) -> Result<SyncStatus, SyncError>;

    /// Overwrites the stored status as a whole.
    async fn save_sync_status(&self, status: &SyncStatus) -> Result<(), SyncError>;
}

/// Fire-and-forget status side channel. Must not block; errors are logged by
/// the caller and otherwise ignored.
pub trait StatusNotifier: Send + Sync {
    fn notify(&self, status: &SyncStatus) -> Result<(), String>;
}
