// ──────────────────────────────────────────────────────────────────────────────
// pgk-webdav · types
// ──────────────────────────────────────────────────────────────────────────────
// WebDAV resource metadata and per-request outcomes.
// ──────────────────────────────────────────────────────────────────────────────

use reqwest::StatusCode;

/// The type of a WebDAV resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DavResourceType {
    File,
    Folder,
}

/// A single WebDAV resource returned from a PROPFIND.
#[derive(Debug, Clone, PartialEq)]
pub struct DavResource {
    /// Full href from the DAV response (URL-encoded path).
    pub href: String,
    pub resource_type: DavResourceType,
}

impl DavResource {
    pub fn is_collection(&self) -> bool {
        self.resource_type == DavResourceType::Folder
    }
}

/// How the server answered a MKCOL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MkcolOutcome {
    /// 201 (or another 2xx).
    Created,
    /// 405: something already lives at that URL.
    AlreadyExists,
    /// 409: an intermediate collection is missing.
    ParentMissing,
}

impl MkcolOutcome {
    pub fn from_status(status: StatusCode) -> Option<Self> {
        if status.is_success() {
            Some(Self::Created)
        } else if status == StatusCode::METHOD_NOT_ALLOWED {
            Some(Self::AlreadyExists)
        } else if status == StatusCode::CONFLICT {
            Some(Self::ParentMissing)
        } else {
            None
        }
    }
}

/// Status and validators from a HEAD response.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadInfo {
    pub status: StatusCode,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}
