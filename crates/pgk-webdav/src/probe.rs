// ──────────────────────────────────────────────────────────────────────────────
// pgk-webdav · probe
// ──────────────────────────────────────────────────────────────────────────────
// Cheap HEAD against the snapshot file. Fails open: anything other than a
// 2xx reads as "absent" so the caller falls through to a fresh upload.
// ──────────────────────────────────────────────────────────────────────────────

use crate::client::{file_url, WebDavClient};
use crate::types::HeadInfo;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use pgk_core::{RemoteMetadata, RemoteTarget};
use reqwest::StatusCode;

pub async fn probe(client: &WebDavClient, target: &RemoteTarget) -> RemoteMetadata {
    let url = match file_url(target) {
        Ok(u) => u,
        Err(e) => {
            warn!("probe skipped: {}", e);
            return RemoteMetadata::absent();
        }
    };

    match client.head(&url, target).await {
        Ok(info) => metadata_from_head(&info),
        Err(e) => {
            warn!("probe of {} failed, treating as absent: {}", url, e);
            RemoteMetadata::absent()
        }
    }
}

/// Map a HEAD response onto `RemoteMetadata`.
pub fn metadata_from_head(info: &HeadInfo) -> RemoteMetadata {
    if info.status.is_success() {
        return RemoteMetadata {
            exists: true,
            last_modified: info.last_modified.as_deref().and_then(parse_http_date),
            etag: info.etag.clone(),
        };
    }
    if info.status == StatusCode::NOT_FOUND {
        debug!("remote snapshot not found");
    } else {
        warn!("probe returned {}, treating as absent", info.status);
    }
    RemoteMetadata::absent()
}

/// Parse an HTTP-date (`Tue, 15 Nov 1994 08:12:31 GMT`).
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
