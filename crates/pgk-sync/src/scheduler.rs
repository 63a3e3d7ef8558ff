// ──────────────────────────────────────────────────────────────────────────────
// pgk-sync · scheduler
// ──────────────────────────────────────────────────────────────────────────────
// Periodic trigger around `SyncEngine::perform_sync`. The engine never retries
// on its own; this loop spaces attempts out and backs off exponentially while
// they keep failing.
// ──────────────────────────────────────────────────────────────────────────────

use crate::engine::SyncEngine;
use log::{debug, info};
use pgk_core::SyncAction;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub interval: Duration,
    /// Upper bound on the delay after repeated failures.
    pub max_backoff: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

/// Delay before the next attempt: `interval * 2^failures`, capped.
pub fn next_delay(config: &SchedulerConfig, consecutive_failures: u32) -> Duration {
    if consecutive_failures == 0 {
        return config.interval;
    }
    let cap = config.max_backoff.max(config.interval);
    let factor = 1u32 << consecutive_failures.min(16);
    config
        .interval
        .checked_mul(factor)
        .map_or(cap, |d| d.min(cap))
}

/// Background sync loop. Aborted when stopped or dropped.
pub struct SyncScheduler {
    handle: JoinHandle<()>,
}

impl SyncScheduler {
    /// Start the loop on the current tokio runtime. The first attempt runs
    /// immediately.
    pub fn spawn(engine: Arc<SyncEngine>, config: SchedulerConfig) -> Self {
        info!(
            "sync scheduler started (interval {:?}, max backoff {:?})",
            config.interval, config.max_backoff
        );
        let handle = tokio::spawn(async move {
            let mut failures: u32 = 0;
            loop {
                let result = engine.perform_sync(false).await;
                if result.action == SyncAction::Error {
                    failures = failures.saturating_add(1);
                } else {
                    failures = 0;
                }
                let delay = next_delay(&config, failures);
                debug!(
                    "scheduled sync: {} ({} consecutive failures), next in {:?}",
                    result.action, failures, delay
                );
                tokio::time::sleep(delay).await;
            }
        });
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(self) {
        self.handle.abort();
        info!("sync scheduler stopped");
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
