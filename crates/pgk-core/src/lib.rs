//! # PageKeep – Core
//!
//! Types shared by every part of the bookmark sync engine:
//!
//! - **Bundles**: the `bookmarks.json` document exchanged with the remote
//! - **Status**: persisted `SyncStatus` and the per-attempt `SyncResult`
//! - **Settings**: WebDAV endpoint, credentials and transport policy
//! - **Errors**: the sync error taxonomy (`SyncError`)
//! - **Contracts**: traits for the remote store, local library, settings
//!   store and status notifier
//! - **Embeddings**: base64 codec for Q&A embedding vectors

pub mod types;
pub mod error;
pub mod traits;
pub mod embedding;

pub use error::{SyncError, SyncErrorKind};
pub use traits::{LocalLibrary, RemoteStore, SettingsStore, StatusNotifier};
pub use types::*;
