// ──────────────────────────────────────────────────────────────────────────────
// pgk-webdav · files
// ──────────────────────────────────────────────────────────────────────────────
// Snapshot file operations:
//  • Download (GET, 404 → none)
//  • Upload (PUT, full replace)
// ──────────────────────────────────────────────────────────────────────────────

use crate::client::{file_url, WebDavClient};
use pgk_core::RemoteTarget;

pub const SNAPSHOT_CONTENT_TYPE: &str = "application/json";

/// Download the raw snapshot. `Ok(None)` when the file does not exist.
pub async fn download_snapshot(
    client: &WebDavClient,
    target: &RemoteTarget,
) -> Result<Option<Vec<u8>>, String> {
    let url = file_url(target)?;
    client.get(&url, target).await
}

/// Replace the remote snapshot with `data`.
pub async fn upload_snapshot(
    client: &WebDavClient,
    target: &RemoteTarget,
    data: Vec<u8>,
) -> Result<(), String> {
    let url = file_url(target)?;
    client.put(&url, target, data, SNAPSHOT_CONTENT_TYPE).await
}
