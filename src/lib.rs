//! # PageKeep
//!
//! Personal bookmark archive sync. Keeps a local bookmark library converged
//! with a single `bookmarks.json` snapshot on a WebDAV server.
//!
//! - **config**: `config.json` with data paths and engine tunables
//! - **logging**: tracing subscriber with `PAGEKEEP_LOG` filtering
//! - **settings**: JSON settings store (credentials + persisted status)
//! - **library**: JSON bookmark library (export / union import)
//! - **app**: engine, transport, notifier and scheduler wired together

pub mod app;
pub mod config;
pub mod library;
pub mod logging;
pub mod persist;
pub mod settings;

pub use app::App;
pub use config::AppConfig;
pub use library::JsonLibrary;
pub use settings::JsonSettingsStore;
