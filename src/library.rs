//! JSON-file bookmark library implementing the sync engine's local-store
//! contract.

use crate::persist::{read_json, write_json_atomic};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use pgk_core::embedding::decode_embedding;
use pgk_core::{BookmarkExportBundle, ExportedBookmark, ImportSummary, LocalLibrary, SyncError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use url::Url;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryDocument {
    pub bookmarks: Vec<ExportedBookmark>,
    /// When an import last added anything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_import_at: Option<DateTime<Utc>>,
}

pub struct JsonLibrary {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLibrary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<LibraryDocument, SyncError> {
        read_json(&self.path).await
    }

    pub async fn len(&self) -> Result<usize, SyncError> {
        Ok(self.load().await?.bookmarks.len())
    }

    pub async fn is_empty(&self) -> Result<bool, SyncError> {
        Ok(self.len().await? == 0)
    }
}

/// Reject bookmarks the library cannot store: no URL, a URL that is not
/// absolute, or an embedding that does not decode. Any scheme is accepted.
pub fn validate_bookmark(bm: &ExportedBookmark) -> Result<(), String> {
    let raw = bm.url.trim();
    if raw.is_empty() {
        return Err("empty URL".to_string());
    }
    Url::parse(raw).map_err(|e| format!("invalid URL: {}", e))?;
    for (i, qa) in bm.qa_pairs.iter().enumerate() {
        if let Some(embedding) = &qa.embedding {
            decode_embedding(embedding).map_err(|e| format!("Q&A pair {}: {}", i, e))?;
        }
    }
    Ok(())
}

#[async_trait]
impl LocalLibrary for JsonLibrary {
    async fn export_all(&self) -> Result<BookmarkExportBundle, SyncError> {
        let doc = self.load().await?;
        Ok(BookmarkExportBundle::new(doc.bookmarks, Utc::now()))
    }

    async fn import_bookmarks(&self, bundle: &BookmarkExportBundle) -> Result<ImportSummary, SyncError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        let mut known: HashSet<String> = doc.bookmarks.iter().map(|b| b.url.clone()).collect();
        let mut summary = ImportSummary::default();

        for bm in &bundle.bookmarks {
            if let Err(e) = validate_bookmark(bm) {
                summary.errors.push(format!("{}: {}", bm.url, e));
                continue;
            }
            if !known.insert(bm.url.clone()) {
                debug!("skipping duplicate {}", bm.url);
                summary.skipped += 1;
                continue;
            }
            doc.bookmarks.push(bm.clone());
            summary.imported += 1;
        }

        if summary.imported > 0 {
            doc.last_import_at = Some(Utc::now());
            write_json_atomic(&self.path, &doc).await?;
        }
        info!(
            "imported {} bookmarks ({} skipped, {} rejected)",
            summary.imported,
            summary.skipped,
            summary.errors.len()
        );
        Ok(summary)
    }

    async fn last_local_update(&self) -> Result<Option<DateTime<Utc>>, SyncError> {
        let doc = self.load().await?;
        let newest_edit = doc.bookmarks.iter().map(|b| b.updated_at).max();
        Ok(newest_edit.max(doc.last_import_at))
    }
}
