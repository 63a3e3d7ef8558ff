//! Whole-file JSON persistence shared by the settings store and the library.

use pgk_core::SyncError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Read and parse `path`. A missing file yields `T::default()`.
pub async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, SyncError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(SyncError::store(format!("read {}: {}", path.display(), e))),
    };
    serde_json::from_slice(&bytes)
        .map_err(|e| SyncError::store(format!("parse {}: {}", path.display(), e)))
}

/// Replace `path` with the pretty JSON of `value`: write a sibling temp file,
/// then rename over the target.
pub async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), SyncError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SyncError::store(format!("create {}: {}", parent.display(), e)))?;
    }
    let body = serde_json::to_vec_pretty(value)?;
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, body)
        .await
        .map_err(|e| SyncError::store(format!("write {}: {}", tmp.display(), e)))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| SyncError::store(format!("replace {}: {}", path.display(), e)))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
