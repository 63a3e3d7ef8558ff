// ──────────────────────────────────────────────────────────────────────────────
// pgk-sync · engine
// ──────────────────────────────────────────────────────────────────────────────
// Sync orchestrator. One attempt runs:
//  debounce → configuration gate → lock → validate → probe + local export
//  → decide → transport → persist status → release lock → broadcast
//
// Every failure after the lock is taken becomes a `SyncResult` with
// action `error` and a persisted `lastSyncError`; nothing is raised.
// ──────────────────────────────────────────────────────────────────────────────

use crate::clock::{Clock, SystemClock};
use crate::lock::LockManager;
use crate::policy::{decide, merge_outcome, SyncDecision};
use log::{debug, info, warn};
use pgk_core::*;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use url::Url;

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncEngineConfig {
    /// How long a same-session lock is honoured before it counts as stale.
    /// Must exceed the slowest plausible sync.
    pub lock_timeout: Duration,
    /// Minimum spacing between non-forced attempts.
    pub debounce: Duration,
}

impl Default for SyncEngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Everything the engine talks to.
#[derive(Clone)]
pub struct SyncCollaborators {
    pub remote: Arc<dyn RemoteStore>,
    pub library: Arc<dyn LocalLibrary>,
    pub settings: Arc<dyn SettingsStore>,
    pub notifier: Arc<dyn StatusNotifier>,
}

/// What a successful locked run did.
struct Completed {
    action: SyncAction,
    message: String,
    bookmark_count: usize,
}

pub struct SyncEngine {
    config: SyncEngineConfig,
    remote: Arc<dyn RemoteStore>,
    library: Arc<dyn LocalLibrary>,
    settings: Arc<dyn SettingsStore>,
    notifier: Arc<dyn StatusNotifier>,
    clock: Arc<dyn Clock>,
    lock: LockManager,
    last_attempt_ms: Mutex<Option<i64>>,
}

impl SyncEngine {
    pub fn new(config: SyncEngineConfig, collaborators: SyncCollaborators) -> Self {
        Self::with_clock(config, collaborators, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: SyncEngineConfig,
        collaborators: SyncCollaborators,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let lock = LockManager::new(config.lock_timeout, clock.clone());
        Self::with_lock(config, collaborators, clock, lock)
    }

    /// Build around an existing lock manager. The manager's timeout wins over
    /// `config.lock_timeout`.
    pub fn with_lock(
        config: SyncEngineConfig,
        collaborators: SyncCollaborators,
        clock: Arc<dyn Clock>,
        lock: LockManager,
    ) -> Self {
        Self {
            config,
            remote: collaborators.remote,
            library: collaborators.library,
            settings: collaborators.settings,
            notifier: collaborators.notifier,
            clock,
            lock,
            last_attempt_ms: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SyncEngineConfig {
        &self.config
    }

    pub fn lock_manager(&self) -> &LockManager {
        &self.lock
    }

    /// Persisted status with `is_syncing` taken from the live lock.
    pub async fn status(&self) -> Result<SyncStatus, SyncError> {
        let mut status = self.settings.load_sync_status().await?;
        status.is_syncing = self.lock.is_active();
        Ok(status)
    }

    // ── Entry point ──────────────────────────────────────────────────────

    /// Run one sync attempt. `force` bypasses the debounce gate only.
    pub async fn perform_sync(&self, force: bool) -> SyncResult {
        if !self.pass_debounce(force) {
            debug!("sync debounced");
            return SyncResult::skipped("sync requested too soon after the previous attempt");
        }

        let settings = match self.settings.load_sync_settings().await {
            Ok(s) => s,
            Err(e) => {
                warn!("could not load sync settings: {}", e);
                return SyncResult::skipped(format!("sync settings unavailable: {}", e));
            }
        };
        let target = match check_configured(&settings) {
            Ok(t) => t,
            Err(e) => {
                debug!("{}", e);
                return SyncResult::skipped(e.to_string());
            }
        };

        let Some(guard) = self.lock.try_lock() else {
            info!("sync already in progress, skipping");
            return SyncResult::skipped("sync already in progress");
        };

        let previous = match self.settings.load_sync_status().await {
            Ok(s) => s,
            Err(e) => {
                warn!("could not load sync status: {}", e);
                SyncStatus::default()
            }
        };
        self.broadcast(&SyncStatus {
            is_syncing: true,
            ..previous.clone()
        });

        let outcome = self.run_locked(&settings, &target).await;

        let now = self.clock.now();
        let (result, status) = match outcome {
            Ok(done) => {
                info!("sync finished: {} ({})", done.action, done.message);
                let status = SyncStatus {
                    last_sync_time: Some(now),
                    last_sync_error: None,
                    is_syncing: false,
                };
                let result = SyncResult::completed(done.action, done.message, now, done.bookmark_count);
                (result, status)
            }
            Err(e) => {
                let message = e.to_string();
                warn!("sync failed ({:?}): {}", e.kind(), message);
                let status = SyncStatus {
                    last_sync_time: previous.last_sync_time,
                    last_sync_error: Some(message.clone()),
                    is_syncing: false,
                };
                (SyncResult::error(message, now), status)
            }
        };

        if let Err(e) = self.settings.save_sync_status(&status).await {
            warn!("could not persist sync status: {}", e);
        }

        drop(guard);
        self.broadcast(&SyncStatus {
            is_syncing: self.lock.is_active(),
            ..status
        });
        result
    }

    // ── Steps ────────────────────────────────────────────────────────────

    fn pass_debounce(&self, force: bool) -> bool {
        let now = self.clock.now_ms();
        let window = i64::try_from(self.config.debounce.as_millis()).unwrap_or(i64::MAX);
        let mut last = self
            .last_attempt_ms
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !force {
            if let Some(prev) = *last {
                if now.saturating_sub(prev) < window {
                    return false;
                }
            }
        }
        *last = Some(now);
        true
    }

    async fn run_locked(
        &self,
        settings: &SyncSettings,
        target: &RemoteTarget,
    ) -> Result<Completed, SyncError> {
        validate_endpoint(settings)?;

        let remote = self.remote.probe(target).await;
        let local = self.library.export_all().await?;
        let local_last_update = self.library.last_local_update().await?;
        debug!(
            "remote exists={} etag={:?}; local has {} bookmarks, last update {:?}",
            remote.exists, remote.etag, local.bookmark_count, local_last_update
        );

        let remote_bundle = if remote.exists {
            match self.remote.download(target).await {
                Ok(bundle) => bundle,
                Err(e) => {
                    warn!("remote snapshot unreadable, keeping local as authoritative: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let decision = decide(&remote, remote_bundle, &local, local_last_update);
        debug!("sync decision: {}", decision.label());

        match decision {
            SyncDecision::NoChange => Ok(Completed {
                action: SyncAction::NoChange,
                message: "nothing to sync".to_string(),
                bookmark_count: local.bookmark_count,
            }),
            SyncDecision::Upload => {
                self.push(target, &local).await?;
                Ok(Completed {
                    action: SyncAction::Uploaded,
                    message: format!("uploaded {} bookmarks", local.bookmark_count),
                    bookmark_count: local.bookmark_count,
                })
            }
            SyncDecision::DownloadMerge(remote_bundle) => {
                self.merge_and_push(target, &local, remote_bundle).await
            }
        }
    }

    /// Import new remote bookmarks, then upload the merged local set so the
    /// remote converges to the union. Nothing is uploaded if the import fails.
    async fn merge_and_push(
        &self,
        target: &RemoteTarget,
        local: &BookmarkExportBundle,
        remote: BookmarkExportBundle,
    ) -> Result<Completed, SyncError> {
        let exported_at = remote.exported_at;
        let plan = merge_outcome(local, &remote);
        let already_present = plan.duplicates.len();

        let summary = self
            .library
            .import_bookmarks(&plan.into_bundle(exported_at))
            .await
            .map_err(as_merge_error)?;
        if !summary.errors.is_empty() {
            return Err(SyncError::Merge(format!(
                "{} bookmarks could not be imported: {}",
                summary.errors.len(),
                summary.errors.join("; ")
            )));
        }

        let merged = self.library.export_all().await?;
        self.push(target, &merged).await?;

        Ok(Completed {
            action: SyncAction::Downloaded,
            message: format!(
                "imported {} bookmarks from remote ({} already present), uploaded {}",
                summary.imported,
                already_present + summary.skipped,
                merged.bookmark_count
            ),
            bookmark_count: merged.bookmark_count,
        })
    }

    async fn push(&self, target: &RemoteTarget, bundle: &BookmarkExportBundle) -> Result<(), SyncError> {
        self.remote.ensure_folder(target).await?;
        self.remote.upload(target, bundle).await
    }

    fn broadcast(&self, status: &SyncStatus) {
        if let Err(e) = self.notifier.notify(status) {
            warn!("sync status broadcast failed: {}", e);
        }
    }
}

// ── Gates ────────────────────────────────────────────────────────────────────

fn check_configured(settings: &SyncSettings) -> Result<RemoteTarget, SyncError> {
    if !settings.enabled {
        return Err(SyncError::Configuration("sync is disabled".into()));
    }
    if !settings.has_credentials() {
        return Err(SyncError::Configuration(
            "WebDAV URL, username and password are required".into(),
        ));
    }
    Ok(RemoteTarget::from_settings(settings))
}

/// Refuse plaintext transport unless the user opted in.
pub fn validate_endpoint(settings: &SyncSettings) -> Result<(), SyncError> {
    let url = Url::parse(settings.url.trim())
        .map_err(|e| SyncError::Validation(format!("invalid WebDAV URL: {}", e)))?;
    match url.scheme() {
        "https" => Ok(()),
        "http" if settings.allow_insecure_http => {
            warn!("syncing over plaintext HTTP to {}", url.host_str().unwrap_or("?"));
            Ok(())
        }
        "http" => Err(SyncError::Validation(
            "refusing to sync over plaintext HTTP; enable allowInsecureHttp to permit it".into(),
        )),
        other => Err(SyncError::Validation(format!(
            "unsupported WebDAV URL scheme: {}",
            other
        ))),
    }
}

fn as_merge_error(e: SyncError) -> SyncError {
    match e {
        SyncError::Merge(_) => e,
        other => SyncError::Merge(other.to_string()),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
