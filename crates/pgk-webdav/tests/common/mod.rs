//! In-process WebDAV server for transport tests.
//!
//! Understands just enough of HEAD / GET / PUT / MKCOL / PROPFIND to behave
//! like a real server for `bookmarks.json`: 404 for missing resources, 409
//! when a parent collection is missing, 405 for MKCOL on an existing path,
//! 207 multistatus for PROPFIND.
#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::Response;
use axum::Router;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const ROOT: &str = "/dav/";

pub struct StoredFile {
    pub body: Vec<u8>,
    pub modified: DateTime<Utc>,
}

#[derive(Default)]
pub struct DavState {
    pub files: BTreeMap<String, StoredFile>,
    pub collections: BTreeSet<String>,
    /// `(method, path)` of every request, in arrival order.
    pub requests: Vec<(String, String)>,
    /// Force a status for every request with this method.
    pub fail: BTreeMap<String, u16>,
    /// Exact `Authorization` header required, if any.
    pub require_auth: Option<String>,
}

type Shared = Arc<Mutex<DavState>>;

pub struct DavServer {
    pub base_url: String,
    pub state: Shared,
    handle: JoinHandle<()>,
}

impl DavServer {
    pub async fn start() -> Self {
        let mut state = DavState::default();
        state.collections.insert(ROOT.to_string());
        let state: Shared = Arc::new(Mutex::new(state));

        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/dav", addr),
            state,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_with(&self, method: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p)
            .collect()
    }

    pub fn clear_requests(&self) {
        self.state.lock().unwrap().requests.clear();
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().files.get(path).map(|f| f.body.clone())
    }

    pub fn put_file(&self, path: &str, body: &[u8]) {
        self.state.lock().unwrap().files.insert(
            path.to_string(),
            StoredFile {
                body: body.to_vec(),
                modified: Utc::now(),
            },
        );
    }

    pub fn has_collection(&self, path: &str) -> bool {
        self.state.lock().unwrap().collections.contains(path)
    }

    pub fn add_collection(&self, path: &str) {
        self.state.lock().unwrap().collections.insert(path.to_string());
    }

    pub fn fail(&self, method: &str, status: u16) {
        self.state.lock().unwrap().fail.insert(method.to_string(), status);
    }

    pub fn heal(&self, method: &str) {
        self.state.lock().unwrap().fail.remove(method);
    }

    pub fn require_auth(&self, header_value: &str) {
        self.state.lock().unwrap().require_auth = Some(header_value.to_string());
    }
}

impl Drop for DavServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn parent_of(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => trimmed[..=idx].to_string(),
        None => "/".to_string(),
    }
}

fn as_collection(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

fn etag(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    format!("\"{}\"", &hex::encode(digest)[..16])
}

fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn status(code: StatusCode) -> Response {
    Response::builder().status(code).body(Body::empty()).unwrap()
}

fn multistatus(href: &str, is_collection: bool, file: Option<&StoredFile>) -> String {
    let resourcetype = if is_collection { "<d:collection/>" } else { "" };
    let file_props = file
        .map(|f| {
            format!(
                "<d:getcontentlength>{}</d:getcontentlength><d:getetag>{}</d:getetag><d:getlastmodified>{}</d:getlastmodified>",
                f.body.len(),
                etag(&f.body),
                http_date(f.modified)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:">
  <d:response>
    <d:href>{}</d:href>
    <d:propstat>
      <d:prop><d:resourcetype>{}</d:resourcetype>{}</d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#,
        href, resourcetype, file_props
    )
}

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let mut st = state.lock().unwrap();
    st.requests.push((method.as_str().to_string(), path.clone()));

    if let Some(code) = st.fail.get(method.as_str()) {
        return status(StatusCode::from_u16(*code).unwrap());
    }
    if let Some(expected) = &st.require_auth {
        let sent = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
        if sent != Some(expected.as_str()) {
            return status(StatusCode::UNAUTHORIZED);
        }
    }

    match method.as_str() {
        "HEAD" => match st.files.get(&path) {
            Some(f) => Response::builder()
                .status(StatusCode::OK)
                .header(header::ETAG, etag(&f.body))
                .header(header::LAST_MODIFIED, http_date(f.modified))
                .header(header::CONTENT_LENGTH, f.body.len())
                .body(Body::empty())
                .unwrap(),
            None if st.collections.contains(&as_collection(&path)) => status(StatusCode::OK),
            None => status(StatusCode::NOT_FOUND),
        },
        "GET" => match st.files.get(&path) {
            Some(f) => Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(f.body.clone()))
                .unwrap(),
            None => status(StatusCode::NOT_FOUND),
        },
        "PUT" => {
            if !st.collections.contains(&parent_of(&path)) {
                return status(StatusCode::CONFLICT);
            }
            let replaced = st
                .files
                .insert(
                    path,
                    StoredFile {
                        body: body.to_vec(),
                        modified: Utc::now(),
                    },
                )
                .is_some();
            status(if replaced { StatusCode::NO_CONTENT } else { StatusCode::CREATED })
        }
        "MKCOL" => {
            let coll = as_collection(&path);
            if st.collections.contains(&coll) || st.files.contains_key(path.trim_end_matches('/')) {
                return status(StatusCode::METHOD_NOT_ALLOWED);
            }
            if !st.collections.contains(&parent_of(&coll)) {
                return status(StatusCode::CONFLICT);
            }
            st.collections.insert(coll);
            status(StatusCode::CREATED)
        }
        "PROPFIND" => {
            let coll = as_collection(&path);
            let xml = if st.collections.contains(&coll) {
                multistatus(&coll, true, None)
            } else if let Some(f) = st.files.get(path.trim_end_matches('/')) {
                multistatus(path.trim_end_matches('/'), false, Some(f))
            } else {
                return status(StatusCode::NOT_FOUND);
            };
            Response::builder()
                .status(StatusCode::MULTI_STATUS)
                .header(header::CONTENT_TYPE, "application/xml; charset=utf-8")
                .body(Body::from(xml))
                .unwrap()
        }
        _ => status(StatusCode::METHOD_NOT_ALLOWED),
    }
}
