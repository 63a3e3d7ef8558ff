// ──────────────────────────────────────────────────────────────────────────────
// pgk-sync · policy
// ──────────────────────────────────────────────────────────────────────────────
// Pure decision logic:
//  • decide(): upload / download-merge / no-change from remote and local state
//  • merge_outcome(): which remote bookmarks a union import would add
//
// Conflicts resolve on `exportedAt` against the local last-update time; ties
// and "remote not newer" go to upload.
// ──────────────────────────────────────────────────────────────────────────────

use chrono::{DateTime, Utc};
use pgk_core::{BookmarkExportBundle, ExportedBookmark, RemoteMetadata};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncDecision {
    /// Push the local export, replacing the remote file.
    Upload,
    /// Import the carried remote bundle, then upload the merged local set.
    DownloadMerge(BookmarkExportBundle),
    NoChange,
}

impl SyncDecision {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::DownloadMerge(_) => "download-merge",
            Self::NoChange => "no-change",
        }
    }
}

/// Choose what a sync attempt does.
///
/// `remote_bundle` is `None` when the remote file could not be read; with
/// `remote.exists` set that means local is authoritative.
///
/// An upload stamps `exportedAt` at export time, which is later than any
/// local change it carries. The attempt after a device's own upload therefore
/// takes `DownloadMerge`, imports nothing and re-uploads the same set.
pub fn decide(
    remote: &RemoteMetadata,
    remote_bundle: Option<BookmarkExportBundle>,
    local: &BookmarkExportBundle,
    local_last_update: Option<DateTime<Utc>>,
) -> SyncDecision {
    if !remote.exists {
        return if local.bookmark_count > 0 {
            SyncDecision::Upload
        } else {
            SyncDecision::NoChange
        };
    }

    match remote_bundle {
        None => SyncDecision::Upload,
        Some(bundle) => {
            let local_time = local_last_update.unwrap_or(DateTime::UNIX_EPOCH);
            if bundle.exported_at > local_time {
                SyncDecision::DownloadMerge(bundle)
            } else {
                SyncDecision::Upload
            }
        }
    }
}

/// Remote bookmarks split into what a union import adds and what it skips.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub to_import: Vec<ExportedBookmark>,
    /// URLs already present locally, or repeated within the remote set.
    pub duplicates: Vec<String>,
}

impl MergeOutcome {
    pub fn is_noop(&self) -> bool {
        self.to_import.is_empty()
    }

    /// The bookmarks to import, packaged for the local library.
    pub fn into_bundle(self, exported_at: DateTime<Utc>) -> BookmarkExportBundle {
        BookmarkExportBundle::new(self.to_import, exported_at)
    }
}

/// Union-merge plan. Existing local bookmarks always win; a remote bookmark
/// is only taken when its URL is new.
pub fn merge_outcome(local: &BookmarkExportBundle, remote: &BookmarkExportBundle) -> MergeOutcome {
    let mut seen: HashSet<&str> = local.urls().collect();
    let mut outcome = MergeOutcome::default();
    for bm in &remote.bookmarks {
        if seen.insert(bm.url.as_str()) {
            outcome.to_import.push(bm.clone());
        } else {
            outcome.duplicates.push(bm.url.clone());
        }
    }
    outcome
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
