// ──────────────────────────────────────────────────────────────────────────────
// pgk-webdav · client
// ──────────────────────────────────────────────────────────────────────────────
// Low-level WebDAV HTTP client covering:
//  • HEAD, PROPFIND, MKCOL, GET, PUT
//  • Basic auth attached per request from the caller's target
//  • URL building for the snapshot collection and its ancestors
//  • WebDAV multistatus XML parsing
//
// No retries happen here: a failed request surfaces immediately and the next
// sync trigger is the retry. The only bounded wait is the per-request timeout.
// ──────────────────────────────────────────────────────────────────────────────

use crate::types::*;
use log::debug;
use pgk_core::{RemoteTarget, REMOTE_FILE_NAME};
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use url::Url;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Low-level WebDAV client. Holds no credentials; every call authenticates
/// with the target it is given.
#[derive(Debug, Clone)]
pub struct WebDavClient {
    http: Client,
}

impl WebDavClient {
    // ── Constructors ─────────────────────────────────────────────────────

    pub fn new() -> Result<Self, String> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, String> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pagekeep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| format!("build http client: {}", e))?;
        Ok(Self { http })
    }

    // ── Auth header injection ────────────────────────────────────────────

    fn apply_auth(&self, req: RequestBuilder, target: &RemoteTarget) -> RequestBuilder {
        if target.username.is_empty() {
            req
        } else {
            req.basic_auth(&target.username, Some(&target.password))
        }
    }

    async fn send(&self, req: RequestBuilder, method: &str, url: &Url) -> Result<Response, String> {
        debug!("{} {}", method, url);
        req.send()
            .await
            .map_err(|e| format!("{} {}: {}", method, url, e))
    }

    // ── WebDAV methods ───────────────────────────────────────────────────

    /// HEAD a resource and return its status and validators.
    pub async fn head(&self, url: &Url, target: &RemoteTarget) -> Result<HeadInfo, String> {
        let req = self.apply_auth(self.http.head(url.clone()), target);
        let resp = self.send(req, "HEAD", url).await?;
        Ok(HeadInfo {
            status: resp.status(),
            etag: header_string(&resp, header::ETAG).map(|v| v.trim_matches('"').to_string()),
            last_modified: header_string(&resp, header::LAST_MODIFIED),
        })
    }

    /// PROPFIND a single resource (`Depth: 0`). `Ok(None)` when the server
    /// answers 404.
    pub async fn propfind(&self, url: &Url, target: &RemoteTarget) -> Result<Option<Vec<DavResource>>, String> {
        let req = self
            .http
            .request(dav_method("PROPFIND")?, url.clone())
            .header("Depth", "0")
            .header(header::CONTENT_TYPE, "application/xml; charset=utf-8")
            .body(propfind_body());
        let resp = self.send(self.apply_auth(req, target), "PROPFIND", url).await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let text = resp.text().await.map_err(|e| format!("read body: {}", e))?;

        if status == StatusCode::MULTI_STATUS || status.is_success() {
            parse_multistatus_xml(&text).map(Some)
        } else {
            Err(format!("PROPFIND {} → {}: {}", url, status, truncate(&text)))
        }
    }

    /// WebDAV MKCOL (create collection).
    pub async fn mkcol(&self, url: &Url, target: &RemoteTarget) -> Result<MkcolOutcome, String> {
        let req = self.http.request(dav_method("MKCOL")?, url.clone());
        let resp = self.send(self.apply_auth(req, target), "MKCOL", url).await?;
        let status = resp.status();
        match MkcolOutcome::from_status(status) {
            Some(outcome) => Ok(outcome),
            None => {
                let text = resp.text().await.unwrap_or_default();
                Err(format!("MKCOL {} → {}: {}", url, status, truncate(&text)))
            }
        }
    }

    /// WebDAV GET. `Ok(None)` when the server answers 404.
    pub async fn get(&self, url: &Url, target: &RemoteTarget) -> Result<Option<Vec<u8>>, String> {
        let req = self.apply_auth(self.http.get(url.clone()), target);
        let resp = self.send(req, "GET", url).await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status.is_success() {
            resp.bytes()
                .await
                .map(|b| Some(b.to_vec()))
                .map_err(|e| format!("read bytes: {}", e))
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(format!("GET {} → {}: {}", url, status, truncate(&text)))
        }
    }

    /// WebDAV PUT (full replace).
    pub async fn put(
        &self,
        url: &Url,
        target: &RemoteTarget,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), String> {
        let req = self
            .http
            .put(url.clone())
            .header(header::CONTENT_TYPE, content_type)
            .body(data);
        let resp = self.send(self.apply_auth(req, target), "PUT", url).await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(format!("PUT {} → {}: {}", url, status, truncate(&text)))
        }
    }
}

// ── URL builders ─────────────────────────────────────────────────────────────

/// URL of the snapshot collection, always with a trailing slash:
/// `{base}/{path}/`.
pub fn folder_url(target: &RemoteTarget) -> Result<Url, String> {
    collection_url(&target.base_url, &target.folder_segments())
}

/// URL of the snapshot file: `{base}/{path}/bookmarks.json`.
pub fn file_url(target: &RemoteTarget) -> Result<Url, String> {
    let folder = folder_url(target)?;
    folder
        .join(REMOTE_FILE_NAME)
        .map_err(|e| format!("build file url: {}", e))
}

/// Every collection from the first path segment down to the target folder,
/// left to right. The WebDAV root itself is not included.
pub fn ancestor_urls(target: &RemoteTarget) -> Result<Vec<Url>, String> {
    let segments = target.folder_segments();
    (1..=segments.len())
        .map(|n| collection_url(&target.base_url, &segments[..n]))
        .collect()
}

fn collection_url(base: &str, segments: &[&str]) -> Result<Url, String> {
    let mut url = Url::parse(base).map_err(|e| format!("invalid WebDAV URL {}: {}", base, e))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| format!("{} cannot be used as a WebDAV root", base))?;
        path.pop_if_empty();
        for seg in segments {
            path.push(seg);
        }
        // trailing slash marks a collection
        path.push("");
    }
    Ok(url)
}

// ── Free-standing helpers ────────────────────────────────────────────────────

fn dav_method(name: &str) -> Result<Method, String> {
    Method::from_bytes(name.as_bytes()).map_err(|e| format!("http method {}: {}", name, e))
}

fn header_string(resp: &Response, name: header::HeaderName) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(300) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// PROPFIND body asking only for the resource type.
pub fn propfind_body() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<d:propfind xmlns:d="DAV:">
  <d:prop>
    <d:resourcetype/>
  </d:prop>
</d:propfind>"#
        .to_string()
}

// ── WebDAV XML Parser ────────────────────────────────────────────────────────

/// Parse a WebDAV multistatus XML body into `DavResource` entries.
pub fn parse_multistatus_xml(xml: &str) -> Result<Vec<DavResource>, String> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut resources: Vec<DavResource> = Vec::new();
    let mut current_href: Option<String> = None;
    let mut in_href = false;
    let mut buf = Vec::new();
    let mut is_collection = false;
    let mut in_resourcetype = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local = local_name(e.name().as_ref());
                match local.as_str() {
                    "response" => {
                        current_href = Some(String::new());
                        is_collection = false;
                    }
                    "resourcetype" => in_resourcetype = true,
                    "collection" if in_resourcetype => is_collection = true,
                    "href" => in_href = true,
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let local = local_name(e.name().as_ref());
                if local == "collection" && in_resourcetype {
                    is_collection = true;
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(href) = current_href.as_mut().filter(|_| in_href) {
                    *href = e.unescape().unwrap_or_default().to_string();
                }
            }
            Ok(Event::End(ref e)) => {
                let local = local_name(e.name().as_ref());
                match local.as_str() {
                    "response" => {
                        if let Some(href) = current_href.take() {
                            resources.push(DavResource {
                                href,
                                resource_type: if is_collection {
                                    DavResourceType::Folder
                                } else {
                                    DavResourceType::File
                                },
                            });
                        }
                    }
                    "resourcetype" => in_resourcetype = false,
                    "href" => in_href = false,
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML parse error: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(resources)
}

/// Extract the local name from a possibly-namespaced XML tag.
fn local_name(raw: &[u8]) -> String {
    let s = String::from_utf8_lossy(raw);
    match s.rfind(':') {
        Some(pos) => s[pos + 1..].to_string(),
        None => s.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
