// ──────────────────────────────────────────────────────────────────────────────
// pgk-core · types
// ──────────────────────────────────────────────────────────────────────────────
// Type catalogue for the sync engine:
//  • Export bundle & bookmark payloads
//  • Remote metadata & remote target
//  • Sync settings
//  • Persisted status & per-attempt results
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::SyncError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format version written into every bundle this build produces.
pub const BUNDLE_VERSION: u32 = 1;

/// File name of the snapshot inside the remote collection.
pub const REMOTE_FILE_NAME: &str = "bookmarks.json";

/// Topic name used when broadcasting status changes.
pub const SYNC_STATUS_TOPIC: &str = "sync-status";

// ── Bookmarks & bundles ─────────────────────────────────────────────────────

/// A question/answer pair attached to a bookmark.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QaPair {
    pub question: String,
    pub answer: String,
    /// Base64 of little-endian `f32` values (see [`crate::embedding`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A bookmark as it appears in an export bundle. `url` is the natural key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportedBookmark {
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Captured page HTML.
    #[serde(default)]
    pub html: String,
    /// Extracted markdown, when extraction has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub qa_pairs: Vec<QaPair>,
}

impl ExportedBookmark {
    /// Minimal bookmark with only a URL and title; timestamps set to `at`.
    pub fn new(url: &str, title: &str, at: DateTime<Utc>) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            html: String::new(),
            markdown: None,
            created_at: at,
            updated_at: at,
            qa_pairs: Vec::new(),
        }
    }
}

/// The unit exchanged with the remote file.
///
/// `exported_at` is the clock used for conflict resolution; transport
/// metadata such as `Last-Modified` is never consulted for that.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkExportBundle {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub bookmark_count: usize,
    pub bookmarks: Vec<ExportedBookmark>,
}

impl BookmarkExportBundle {
    /// Build a bundle, deriving `bookmark_count` from the list.
    pub fn new(bookmarks: Vec<ExportedBookmark>, exported_at: DateTime<Utc>) -> Self {
        Self {
            version: BUNDLE_VERSION,
            exported_at,
            bookmark_count: bookmarks.len(),
            bookmarks,
        }
    }

    pub fn empty(exported_at: DateTime<Utc>) -> Self {
        Self::new(Vec::new(), exported_at)
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.bookmarks.iter().map(|b| b.url.as_str())
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.bookmarks.iter().any(|b| b.url == url)
    }

    /// Parse a bundle from raw JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, SyncError> {
        let bundle: Self = serde_json::from_slice(bytes)?;
        if bundle.version > BUNDLE_VERSION {
            return Err(SyncError::Serialization(format!(
                "bundle version {} is newer than supported version {}",
                bundle.version, BUNDLE_VERSION
            )));
        }
        Ok(bundle)
    }

    /// Serialize to pretty JSON bytes for upload.
    pub fn to_json_vec(&self) -> Result<Vec<u8>, SyncError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

/// Outcome of importing a bundle into the local library.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

// ── Remote ──────────────────────────────────────────────────────────────────

/// Fresh snapshot of the remote file's metadata. Never cached.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMetadata {
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl RemoteMetadata {
    pub fn absent() -> Self {
        Self::default()
    }
}

/// Where the snapshot lives and how to authenticate against it.
///
/// Credentials ride along with every call; transports keep none.
#[derive(Clone, PartialEq)]
pub struct RemoteTarget {
    /// WebDAV root, e.g. `https://dav.example.com/remote.php/dav/files/alice`.
    pub base_url: String,
    /// Collection path below the root, e.g. `Apps/PageKeep`.
    pub folder_path: String,
    pub username: String,
    pub password: String,
}

impl RemoteTarget {
    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self {
            base_url: settings.url.trim().trim_end_matches('/').to_string(),
            folder_path: settings.path.trim().trim_matches('/').to_string(),
            username: settings.username.clone(),
            password: settings.password.clone(),
        }
    }

    /// Non-empty path segments of `folder_path`, left to right.
    pub fn folder_segments(&self) -> Vec<&str> {
        self.folder_path
            .split('/')
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl std::fmt::Debug for RemoteTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTarget")
            .field("base_url", &self.base_url)
            .field("folder_path", &self.folder_path)
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

// ── Settings ────────────────────────────────────────────────────────────────

/// User-facing sync settings as persisted by the settings store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSettings {
    pub enabled: bool,
    /// WebDAV root URL.
    pub url: String,
    pub username: String,
    pub password: String,
    /// Remote collection path that holds `bookmarks.json`.
    pub path: String,
    /// Permit `http://` URLs. Off unless the user opts in.
    pub allow_insecure_http: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            username: String::new(),
            password: String::new(),
            path: "PageKeep".to_string(),
            allow_insecure_http: false,
        }
    }
}

impl SyncSettings {
    pub fn has_credentials(&self) -> bool {
        !self.url.trim().is_empty()
            && !self.username.trim().is_empty()
            && !self.password.is_empty()
    }
}

// ── Status & results ────────────────────────────────────────────────────────

/// Persisted sync status. `is_syncing` is recomputed from the lock on read;
/// whatever value storage holds is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub last_sync_time: Option<DateTime<Utc>>,
    pub last_sync_error: Option<String>,
    #[serde(default)]
    pub is_syncing: bool,
}

/// What a sync attempt ended up doing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SyncAction {
    Uploaded,
    Downloaded,
    NoChange,
    Skipped,
    Error,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Downloaded => "downloaded",
            Self::NoChange => "no-change",
            Self::Skipped => "skipped",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured result of `perform_sync`. Failures are reported here, never
/// raised.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    pub action: SyncAction,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark_count: Option<usize>,
}

impl SyncResult {
    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            success: true,
            action: SyncAction::Skipped,
            message: message.into(),
            timestamp: None,
            bookmark_count: None,
        }
    }

    pub fn error(message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            success: false,
            action: SyncAction::Error,
            message: message.into(),
            timestamp: Some(at),
            bookmark_count: None,
        }
    }

    pub fn completed(
        action: SyncAction,
        message: impl Into<String>,
        at: DateTime<Utc>,
        bookmark_count: usize,
    ) -> Self {
        Self {
            success: true,
            action,
            message: message.into(),
            timestamp: Some(at),
            bookmark_count: Some(bookmark_count),
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.action == SyncAction::Skipped
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
