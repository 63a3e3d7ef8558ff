// ──────────────────────────────────────────────────────────────────────────────
// pgk-webdav · folders
// ──────────────────────────────────────────────────────────────────────────────
// Collection provisioning:
//  • PROPFIND depth 0 to check whether the target collection exists; a plain
//    file at that path is an error, not a folder to write into
//  • MKCOL on the target; on 409 create each ancestor left to right
//  • 405 ("already exists") is success everywhere
// ──────────────────────────────────────────────────────────────────────────────

use crate::client::{ancestor_urls, folder_url, WebDavClient};
use crate::types::*;
use log::{debug, info};
use pgk_core::RemoteTarget;
use url::Url;

/// Make sure the target collection exists, creating parents as needed
/// (like `mkdir -p`). An empty folder path means the WebDAV root, which is
/// assumed to exist.
pub async fn ensure_folder(client: &WebDavClient, target: &RemoteTarget) -> Result<(), String> {
    if target.folder_segments().is_empty() {
        return Ok(());
    }
    let url = folder_url(target)?;

    match client.propfind(&url, target).await {
        Ok(Some(resources)) if resources.iter().any(DavResource::is_collection) => return Ok(()),
        Ok(Some(resources)) if !resources.is_empty() => {
            return Err(format!("{} exists but is not a collection", url))
        }
        Ok(_) => debug!("collection {} missing, creating", url),
        // Some servers refuse PROPFIND on paths they'd happily MKCOL.
        Err(e) => debug!("PROPFIND {} failed ({}), attempting MKCOL", url, e),
    }

    match client.mkcol(&url, target).await? {
        MkcolOutcome::Created => {
            info!("created collection {}", url);
            Ok(())
        }
        MkcolOutcome::AlreadyExists => Ok(()),
        MkcolOutcome::ParentMissing => create_ancestors(client, target).await,
    }
}

/// Create every collection from the first segment down to the target.
pub async fn create_ancestors(client: &WebDavClient, target: &RemoteTarget) -> Result<(), String> {
    for url in ancestor_urls(target)? {
        mkcol_tolerant(client, target, &url).await?;
    }
    Ok(())
}

async fn mkcol_tolerant(client: &WebDavClient, target: &RemoteTarget, url: &Url) -> Result<(), String> {
    match client.mkcol(url, target).await? {
        MkcolOutcome::Created => {
            info!("created collection {}", url);
            Ok(())
        }
        MkcolOutcome::AlreadyExists => Ok(()),
        MkcolOutcome::ParentMissing => Err(format!("MKCOL {} → 409: parent collection missing", url)),
    }
}
