#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgk_core::*;
use pgk_sync::{Clock, LockManager, ManualClock, SyncCollaborators, SyncEngine, SyncEngineConfig};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const T0_MS: i64 = 1_700_000_000_000;

pub fn at_ms(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}

pub fn bookmark(url: &str) -> ExportedBookmark {
    ExportedBookmark::new(url, url, at_ms(T0_MS))
}

pub fn bundle(urls: &[&str], exported_at: DateTime<Utc>) -> BookmarkExportBundle {
    BookmarkExportBundle::new(urls.iter().map(|u| bookmark(u)).collect(), exported_at)
}

pub fn enabled_settings(url: &str) -> SyncSettings {
    SyncSettings {
        enabled: true,
        url: url.into(),
        username: "alice".into(),
        password: "secret".into(),
        path: "Apps/PageKeep".into(),
        allow_insecure_http: false,
    }
}

// ── Remote ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryRemote {
    pub file: Mutex<Option<BookmarkExportBundle>>,
    pub probes: AtomicUsize,
    pub ensure_calls: AtomicUsize,
    pub downloads: AtomicUsize,
    pub uploads: AtomicUsize,
    pub fail_ensure: AtomicBool,
    pub fail_download: AtomicBool,
    pub fail_upload: AtomicBool,
    /// Sleep inside upload, to hold the lock across an await.
    pub upload_delay: Mutex<Option<Duration>>,
}

impl MemoryRemote {
    pub fn with_file(bundle: BookmarkExportBundle) -> Self {
        let remote = Self::default();
        *remote.file.lock().unwrap() = Some(bundle);
        remote
    }

    pub fn stored(&self) -> Option<BookmarkExportBundle> {
        self.file.lock().unwrap().clone()
    }

    pub fn stored_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self
            .stored()
            .map(|b| b.bookmarks.into_iter().map(|bm| bm.url).collect())
            .unwrap_or_default();
        urls.sort();
        urls
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn probe(&self, _target: &RemoteTarget) -> RemoteMetadata {
        self.probes.fetch_add(1, Ordering::SeqCst);
        match self.file.lock().unwrap().as_ref() {
            Some(b) => RemoteMetadata {
                exists: true,
                last_modified: Some(b.exported_at),
                etag: Some(format!("v{}", self.uploads.load(Ordering::SeqCst))),
            },
            None => RemoteMetadata::absent(),
        }
    }

    async fn ensure_folder(&self, _target: &RemoteTarget) -> Result<(), SyncError> {
        self.ensure_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_ensure.load(Ordering::SeqCst) {
            return Err(SyncError::transport("MKCOL → 403 Forbidden"));
        }
        Ok(())
    }

    async fn download(&self, _target: &RemoteTarget) -> Result<Option<BookmarkExportBundle>, SyncError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if self.fail_download.load(Ordering::SeqCst) {
            return Err(SyncError::transport("GET → 500 Internal Server Error"));
        }
        Ok(self.stored())
    }

    async fn upload(&self, _target: &RemoteTarget, bundle: &BookmarkExportBundle) -> Result<(), SyncError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let delay = *self.upload_delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(SyncError::transport("PUT → 507 Insufficient Storage"));
        }
        *self.file.lock().unwrap() = Some(bundle.clone());
        Ok(())
    }
}

// ── Library ──────────────────────────────────────────────────────────────────

pub struct MemoryLibrary {
    clock: ManualClock,
    pub bookmarks: Mutex<Vec<ExportedBookmark>>,
    pub last_update: Mutex<Option<DateTime<Utc>>>,
    pub last_summary: Mutex<Option<ImportSummary>>,
    pub import_calls: AtomicUsize,
    pub fail_import: AtomicBool,
    /// Reject these URLs on import, reporting them in `errors`.
    pub reject_urls: Mutex<Vec<String>>,
}

impl MemoryLibrary {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            bookmarks: Mutex::new(Vec::new()),
            last_update: Mutex::new(None),
            last_summary: Mutex::new(None),
            import_calls: AtomicUsize::new(0),
            fail_import: AtomicBool::new(false),
            reject_urls: Mutex::new(Vec::new()),
        }
    }

    pub fn seed(&self, urls: &[&str], last_update: Option<DateTime<Utc>>) {
        *self.bookmarks.lock().unwrap() = urls.iter().map(|u| bookmark(u)).collect();
        *self.last_update.lock().unwrap() = last_update;
    }

    pub fn urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.bookmarks.lock().unwrap().iter().map(|b| b.url.clone()).collect();
        urls.sort();
        urls
    }
}

#[async_trait]
impl LocalLibrary for MemoryLibrary {
    async fn export_all(&self) -> Result<BookmarkExportBundle, SyncError> {
        Ok(BookmarkExportBundle::new(self.bookmarks.lock().unwrap().clone(), self.clock.now()))
    }

    async fn import_bookmarks(&self, bundle: &BookmarkExportBundle) -> Result<ImportSummary, SyncError> {
        self.import_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_import.load(Ordering::SeqCst) {
            return Err(SyncError::store("database is locked"));
        }
        let rejected = self.reject_urls.lock().unwrap().clone();
        let mut local = self.bookmarks.lock().unwrap();
        let mut summary = ImportSummary::default();
        for bm in &bundle.bookmarks {
            if rejected.contains(&bm.url) {
                summary.errors.push(format!("{}: rejected", bm.url));
            } else if local.iter().any(|b| b.url == bm.url) {
                summary.skipped += 1;
            } else {
                local.push(bm.clone());
                summary.imported += 1;
            }
        }
        *self.last_summary.lock().unwrap() = Some(summary.clone());
        Ok(summary)
    }

    async fn last_local_update(&self) -> Result<Option<DateTime<Utc>>, SyncError> {
        Ok(*self.last_update.lock().unwrap())
    }
}

// ── Settings ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemorySettings {
    pub sync: Mutex<SyncSettings>,
    pub status: Mutex<SyncStatus>,
    pub saves: AtomicUsize,
    pub fail_save: AtomicBool,
}

impl MemorySettings {
    pub fn new(sync: SyncSettings) -> Self {
        Self {
            sync: Mutex::new(sync),
            ..Self::default()
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status.lock().unwrap().clone()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn load_sync_settings(&self) -> Result<SyncSettings, SyncError> {
        Ok(self.sync.lock().unwrap().clone())
    }

    async fn load_sync_status(&self) -> Result<SyncStatus, SyncError> {
        Ok(self.status())
    }

    async fn save_sync_status(&self, status: &SyncStatus) -> Result<(), SyncError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(SyncError::store("read-only settings"));
        }
        *self.status.lock().unwrap() = status.clone();
        Ok(())
    }
}

// ── Notifier ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<SyncStatus>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<SyncStatus> {
        self.events.lock().unwrap().clone()
    }
}

impl StatusNotifier for RecordingNotifier {
    fn notify(&self, status: &SyncStatus) -> Result<(), String> {
        self.events.lock().unwrap().push(status.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err("event bus closed".into());
        }
        Ok(())
    }
}

// ── Harness ──────────────────────────────────────────────────────────────────

pub struct Fakes {
    pub clock: ManualClock,
    pub remote: Arc<MemoryRemote>,
    pub library: Arc<MemoryLibrary>,
    pub settings: Arc<MemorySettings>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Fakes {
    pub fn new() -> Self {
        Self::with_remote(MemoryRemote::default())
    }

    pub fn with_remote(remote: MemoryRemote) -> Self {
        let clock = ManualClock::new(T0_MS);
        Self {
            library: Arc::new(MemoryLibrary::new(clock.clone())),
            clock,
            remote: Arc::new(remote),
            settings: Arc::new(MemorySettings::new(enabled_settings("https://dav.test/dav"))),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    pub fn collaborators(&self, remote: Arc<dyn RemoteStore>) -> SyncCollaborators {
        SyncCollaborators {
            remote,
            library: self.library.clone(),
            settings: self.settings.clone(),
            notifier: self.notifier.clone(),
        }
    }

    pub fn clock_arc(&self) -> Arc<dyn Clock> {
        Arc::new(self.clock.clone())
    }

    pub fn engine(&self) -> SyncEngine {
        self.engine_with(SyncEngineConfig::default())
    }

    pub fn engine_with(&self, config: SyncEngineConfig) -> SyncEngine {
        SyncEngine::with_clock(config, self.collaborators(self.remote.clone()), self.clock_arc())
    }

    pub fn engine_with_remote(&self, remote: Arc<dyn RemoteStore>) -> SyncEngine {
        SyncEngine::with_clock(SyncEngineConfig::default(), self.collaborators(remote), self.clock_arc())
    }

    pub fn engine_with_lock(&self, lock: LockManager) -> SyncEngine {
        SyncEngine::with_lock(
            SyncEngineConfig::default(),
            self.collaborators(self.remote.clone()),
            self.clock_arc(),
            lock,
        )
    }

    pub fn target(&self) -> RemoteTarget {
        RemoteTarget::from_settings(&self.settings.sync.lock().unwrap())
    }
}
