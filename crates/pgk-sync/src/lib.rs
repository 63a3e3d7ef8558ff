//! # PageKeep – Sync
//!
//! Keeps the local bookmark library and a single remote snapshot converged:
//!
//! - **Lock**: in-memory, session-bound, self-healing after restarts and
//!   timeouts
//! - **Policy**: pure upload / download-merge / no-change decision and the
//!   union-merge plan
//! - **Engine**: `perform_sync`, the debounced, lock-guarded orchestrator
//! - **Notifier**: best-effort `sync-status` broadcast
//! - **Scheduler**: periodic trigger with exponential backoff on failure

pub mod clock;
pub mod lock;
pub mod policy;
pub mod notifier;
pub mod engine;
pub mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{SyncCollaborators, SyncEngine, SyncEngineConfig};
pub use lock::{LockManager, SessionId, SyncLock, SyncLockGuard};
pub use notifier::{BroadcastNotifier, StatusEvent};
pub use policy::{decide, merge_outcome, MergeOutcome, SyncDecision};
pub use scheduler::{next_delay, SchedulerConfig, SyncScheduler};
