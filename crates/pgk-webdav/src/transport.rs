// ──────────────────────────────────────────────────────────────────────────────
// pgk-webdav · transport
// ──────────────────────────────────────────────────────────────────────────────
// `RemoteStore` over WebDAV. String errors from the low-level client become
// `SyncError::Transport`; undecodable snapshots become `Serialization`.
// ──────────────────────────────────────────────────────────────────────────────

use crate::client::WebDavClient;
use crate::{files, folders, probe};
use async_trait::async_trait;
use log::info;
use pgk_core::{BookmarkExportBundle, RemoteMetadata, RemoteStore, RemoteTarget, SyncError};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WebDavTransport {
    client: WebDavClient,
}

impl WebDavTransport {
    pub fn new(request_timeout: Duration) -> Result<Self, String> {
        Ok(Self {
            client: WebDavClient::with_timeout(request_timeout)?,
        })
    }

    pub fn from_client(client: WebDavClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &WebDavClient {
        &self.client
    }
}

#[async_trait]
impl RemoteStore for WebDavTransport {
    async fn probe(&self, target: &RemoteTarget) -> RemoteMetadata {
        probe::probe(&self.client, target).await
    }

    async fn ensure_folder(&self, target: &RemoteTarget) -> Result<(), SyncError> {
        folders::ensure_folder(&self.client, target)
            .await
            .map_err(SyncError::Transport)
    }

    async fn download(
        &self,
        target: &RemoteTarget,
    ) -> Result<Option<BookmarkExportBundle>, SyncError> {
        let raw = files::download_snapshot(&self.client, target)
            .await
            .map_err(SyncError::Transport)?;
        match raw {
            Some(bytes) => BookmarkExportBundle::from_json(&bytes).map(Some),
            None => Ok(None),
        }
    }

    async fn upload(
        &self,
        target: &RemoteTarget,
        bundle: &BookmarkExportBundle,
    ) -> Result<(), SyncError> {
        let body = bundle.to_json_vec()?;
        files::upload_snapshot(&self.client, target, body)
            .await
            .map_err(SyncError::Transport)?;
        info!("uploaded {} bookmarks to {}", bundle.bookmark_count, target.base_url);
        Ok(())
    }
}
