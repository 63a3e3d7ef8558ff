//! # PageKeep – WebDAV transport
//!
//! Generic WebDAV client used to keep `bookmarks.json` on a remote collection:
//!
//! - **Client**: HEAD, PROPFIND, MKCOL, GET, PUT with per-call basic auth
//! - **Probe**: fail-open existence/freshness check of the snapshot
//! - **Folders**: collection provisioning, parents created left to right
//! - **Files**: snapshot download / full-replace upload
//! - **Transport**: [`pgk_core::RemoteStore`] implementation tying it together

pub mod types;
pub mod client;
pub mod probe;
pub mod folders;
pub mod files;
pub mod transport;

pub use client::WebDavClient;
pub use transport::WebDavTransport;
