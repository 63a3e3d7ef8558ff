// ──────────────────────────────────────────────────────────────────────────────
// pgk-sync · lock
// ──────────────────────────────────────────────────────────────────────────────
// In-memory sync lock:
//  • Bound to a per-process session id, so a lock left by a previous process
//    is void on sight
//  • Ages out after a configurable timeout, so a hung same-session attempt
//    cannot block sync forever
//  • Never persisted
//  • Scope guard that releases on drop, unless the lock was re-seized since
// ──────────────────────────────────────────────────────────────────────────────

use crate::clock::Clock;
use log::{debug, warn};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

/// Identity of the running process, regenerated on every start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The id no live session ever has.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncLock {
    pub held_by: SessionId,
    pub acquired_at_ms: i64,
    pub active: bool,
}

impl SyncLock {
    /// State at process start.
    pub fn idle() -> Self {
        Self {
            held_by: SessionId::nil(),
            acquired_at_ms: 0,
            active: false,
        }
    }
}

struct LockState {
    lock: SyncLock,
    /// Bumped on every successful acquire; lets a guard tell whether the lock
    /// it took is still the one in place.
    generation: u64,
}

pub struct LockManager {
    session: SessionId,
    timeout_ms: i64,
    clock: Arc<dyn Clock>,
    state: Mutex<LockState>,
}

impl LockManager {
    pub fn new(timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self::with_session(SessionId::generate(), SyncLock::idle(), timeout, clock)
    }

    /// Start from an explicit session and lock state, e.g. a lock inherited
    /// from a session that no longer exists.
    pub fn with_session(
        session: SessionId,
        lock: SyncLock,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            session,
            timeout_ms: i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX),
            clock,
            state: Mutex::new(LockState { lock, generation: 0 }),
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(0) as u64)
    }

    fn state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn held_by_me(&self, lock: &SyncLock, now: i64) -> bool {
        lock.active
            && lock.held_by == self.session
            && now.saturating_sub(lock.acquired_at_ms) <= self.timeout_ms
    }

    fn acquire_inner(&self) -> Option<u64> {
        let now = self.clock.now_ms();
        let mut st = self.state();
        if self.held_by_me(&st.lock, now) {
            return None;
        }
        if st.lock.active {
            if st.lock.held_by != self.session {
                debug!("voiding sync lock left by session {}", st.lock.held_by);
            } else {
                warn!(
                    "sync lock held for {} ms exceeds timeout, seizing",
                    now.saturating_sub(st.lock.acquired_at_ms)
                );
            }
        }
        st.lock = SyncLock {
            held_by: self.session,
            acquired_at_ms: now,
            active: true,
        };
        st.generation += 1;
        Some(st.generation)
    }

    /// Take the lock. `false` only when this session holds a live lock.
    pub fn acquire(&self) -> bool {
        self.acquire_inner().is_some()
    }

    /// Drop the lock, stamping the release time.
    ///
    /// Panics if this session never acquired the lock: that is a caller bug.
    pub fn release(&self) {
        let now = self.clock.now_ms();
        let mut st = self.state();
        Self::release_locked(&mut st, self.session, now);
    }

    fn release_locked(st: &mut LockState, session: SessionId, now: i64) {
        assert!(
            st.lock.held_by == session,
            "release of a sync lock never acquired by session {}",
            session
        );
        st.lock.active = false;
        st.lock.acquired_at_ms = now;
    }

    pub fn is_active(&self) -> bool {
        let now = self.clock.now_ms();
        self.held_by_me(&self.state().lock, now)
    }

    pub fn snapshot(&self) -> SyncLock {
        self.state().lock
    }

    /// Acquire and return a guard that releases on drop.
    pub fn try_lock(&self) -> Option<SyncLockGuard<'_>> {
        self.acquire_inner().map(|generation| SyncLockGuard {
            manager: self,
            generation,
        })
    }

    fn release_generation(&self, generation: u64) {
        let now = self.clock.now_ms();
        let mut st = self.state();
        if st.generation != generation {
            warn!("sync lock was re-seized after timeout; leaving it to the new holder");
            return;
        }
        Self::release_locked(&mut st, self.session, now);
    }
}

impl fmt::Debug for LockManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockManager")
            .field("session", &self.session)
            .field("timeout_ms", &self.timeout_ms)
            .field("lock", &self.snapshot())
            .finish()
    }
}

/// Releases the lock it took when dropped.
#[must_use = "the sync lock is released as soon as the guard is dropped"]
pub struct SyncLockGuard<'a> {
    manager: &'a LockManager,
    generation: u64,
}

impl Drop for SyncLockGuard<'_> {
    fn drop(&mut self) {
        self.manager.release_generation(self.generation);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const TIMEOUT: Duration = Duration::from_secs(300);
    const TIMEOUT_MS: i64 = 300_000;

    fn manager(clock: &ManualClock) -> LockManager {
        LockManager::new(TIMEOUT, Arc::new(clock.clone()))
    }

    #[test]
    fn starts_inactive() {
        let clock = ManualClock::new(1_000);
        let m = manager(&clock);
        assert!(!m.is_active());
        assert!(!m.snapshot().active);
    }

    #[test]
    fn second_acquire_is_refused() {
        let clock = ManualClock::new(1_000);
        let m = manager(&clock);
        assert!(m.acquire());
        assert!(!m.acquire());
        assert!(m.is_active());
    }

    #[test]
    fn release_allows_reacquire() {
        let clock = ManualClock::new(1_000);
        let m = manager(&clock);
        assert!(m.acquire());
        clock.advance_ms(250);
        m.release();
        let snap = m.snapshot();
        assert!(!snap.active);
        assert_eq!(snap.held_by, m.session());
        assert_eq!(snap.acquired_at_ms, 1_250);
        assert!(m.acquire());
    }

    #[test]
    fn foreign_session_lock_is_void() {
        let clock = ManualClock::new(10_000);
        let stale = SyncLock {
            held_by: SessionId::generate(),
            acquired_at_ms: 10_000,
            active: true,
        };
        let m = LockManager::with_session(SessionId::generate(), stale, TIMEOUT, Arc::new(clock.clone()));
        assert!(!m.is_active());
        assert!(m.acquire());
        assert_eq!(m.snapshot().held_by, m.session());
    }

    #[test]
    fn foreign_lock_void_regardless_of_age() {
        let clock = ManualClock::new(10_000);
        for acquired_at_ms in [i64::MIN, -5, 0, 10_000, 10_001, i64::MAX] {
            let lock = SyncLock {
                held_by: SessionId::generate(),
                acquired_at_ms,
                active: true,
            };
            let m = LockManager::with_session(SessionId::generate(), lock, TIMEOUT, Arc::new(clock.clone()));
            assert!(!m.is_active(), "acquired_at_ms = {}", acquired_at_ms);
        }
    }

    #[test]
    fn timed_out_lock_is_seized() {
        let clock = ManualClock::new(1_000_000);
        let session = SessionId::generate();
        let lock = SyncLock {
            held_by: session,
            acquired_at_ms: 1_000_000 - TIMEOUT_MS - 1,
            active: true,
        };
        let m = LockManager::with_session(session, lock, TIMEOUT, Arc::new(clock.clone()));
        assert!(!m.is_active());
        assert!(m.acquire());
        assert_eq!(m.snapshot().acquired_at_ms, 1_000_000);
    }

    #[test]
    fn lock_at_exact_timeout_still_held() {
        let clock = ManualClock::new(0);
        let m = manager(&clock);
        assert!(m.acquire());
        clock.advance_ms(TIMEOUT_MS);
        assert!(m.is_active());
        assert!(!m.acquire());
        clock.advance_ms(1);
        assert!(!m.is_active());
        assert!(m.acquire());
    }

    #[test]
    #[should_panic(expected = "never acquired")]
    fn release_without_acquire_panics() {
        let clock = ManualClock::new(0);
        manager(&clock).release();
    }

    #[test]
    fn guard_releases_on_drop() {
        let clock = ManualClock::new(0);
        let m = manager(&clock);
        {
            let _guard = m.try_lock().expect("free lock");
            assert!(m.is_active());
            assert!(m.try_lock().is_none());
        }
        assert!(!m.is_active());
        assert!(m.acquire());
    }

    #[test]
    fn stale_guard_leaves_new_holder_alone() {
        let clock = ManualClock::new(0);
        let m = manager(&clock);
        let old = m.try_lock().expect("free lock");
        clock.advance_ms(TIMEOUT_MS + 1);
        let fresh = m.try_lock().expect("timed-out lock is seized");
        drop(old);
        assert!(m.is_active());
        drop(fresh);
        assert!(!m.is_active());
    }
}
