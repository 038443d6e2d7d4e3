//! The spam guard: tracks request windows for every actor.
//!
//! # Concurrency note
//!
//! `SpamGuard` is NOT thread-safe by itself. The controller owns one behind
//! a mutex and only holds the lock for the duration of a single
//! [`record_and_check`](SpamGuard::record_and_check) call, never across a
//! platform request.

use std::collections::HashMap;

use autorooms_model::ActorId;
use tokio::time::Instant;

use crate::{SpamConfig, SpamWindow};

/// Per-actor sliding-window rate limiter.
///
/// ## Lifecycle
///
/// ```text
/// first stamp() ──→ [window created] ──→ stamp() … stamp()
///                                              │
///                                              ▼ (no stamp within retention)
///                                         evict_idle() ──→ [window removed]
/// ```
#[derive(Debug)]
pub struct SpamGuard {
    config: SpamConfig,
    windows: HashMap<ActorId, SpamWindow>,
}

impl SpamGuard {
    /// Creates an empty guard. The config is validated first.
    pub fn new(config: SpamConfig) -> Self {
        Self {
            config: config.validated(),
            windows: HashMap::new(),
        }
    }

    pub fn config(&self) -> &SpamConfig {
        &self.config
    }

    /// Records a request from `actor` at the current instant.
    pub fn stamp(&mut self, actor: ActorId) {
        self.stamp_at(actor, Instant::now());
    }

    /// Records a request from `actor` at `now`, creating its window on
    /// first use and pruning stamps that fell out of the retention period.
    pub fn stamp_at(&mut self, actor: ActorId, now: Instant) {
        let retention = self.config.retention();
        self.windows
            .entry(actor)
            .or_default()
            .stamp(now, retention);
    }

    /// Returns `true` if any threshold is currently met for `actor`.
    pub fn is_spammy(&self, actor: ActorId) -> bool {
        self.is_spammy_at(actor, Instant::now())
    }

    /// Evaluates every threshold against `actor`'s window as of `now`.
    /// Unknown actors are never spammy.
    pub fn is_spammy_at(&self, actor: ActorId, now: Instant) -> bool {
        let Some(window) = self.windows.get(&actor) else {
            return false;
        };
        self.config
            .thresholds
            .iter()
            .any(|t| window.count_within(now, t.window()) >= t.max_events)
    }

    /// Stamps, then checks. Returns `true` if this request should be
    /// dropped.
    ///
    /// Dropped requests are still stamped, so an actor who keeps hammering
    /// stays throttled until they back off.
    pub fn record_and_check(&mut self, actor: ActorId) -> bool {
        self.record_and_check_at(actor, Instant::now())
    }

    pub fn record_and_check_at(&mut self, actor: ActorId, now: Instant) -> bool {
        self.stamp_at(actor, now);
        self.is_spammy_at(actor, now)
    }

    /// Removes windows with no stamp inside the retention period.
    pub fn evict_idle(&mut self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    /// Removes windows idle as of `now`; returns how many were removed.
    pub fn evict_idle_at(&mut self, now: Instant) -> usize {
        let retention = self.config.retention();
        let before = self.windows.len();
        self.windows
            .retain(|_, window| !window.is_idle(now, retention));
        let evicted = before - self.windows.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.windows.len(), "evicted idle spam windows");
        }
        evicted
    }

    /// Looks up an actor's window.
    pub fn window(&self, actor: &ActorId) -> Option<&SpamWindow> {
        self.windows.get(actor)
    }

    /// Number of actors currently tracked.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl Default for SpamGuard {
    fn default() -> Self {
        Self::new(SpamConfig::default())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SpamGuard` with explicit instants.
    //!
    //! Naming: `test_{function}_{scenario}_{expected}`.

    use std::time::Duration;

    use super::*;
    use crate::SpamThreshold;

    fn aid(id: u64) -> ActorId {
        ActorId(id)
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    // =====================================================================
    // is_spammy_at()
    // =====================================================================

    #[test]
    fn test_is_spammy_unknown_actor_returns_false() {
        let guard = SpamGuard::default();
        assert!(!guard.is_spammy_at(aid(1), Instant::now()));
    }

    #[test]
    fn test_is_spammy_three_stamps_in_five_seconds_returns_true() {
        let mut guard = SpamGuard::default();
        let t0 = Instant::now();
        guard.stamp_at(aid(1), t0);
        guard.stamp_at(aid(1), t0 + secs(1));
        guard.stamp_at(aid(1), t0 + secs(2));

        assert!(guard.is_spammy_at(aid(1), t0 + secs(2)));
    }

    #[test]
    fn test_is_spammy_two_stamps_in_five_seconds_returns_false() {
        let mut guard = SpamGuard::default();
        let t0 = Instant::now();
        guard.stamp_at(aid(1), t0);
        guard.stamp_at(aid(1), t0 + secs(1));

        assert!(!guard.is_spammy_at(aid(1), t0 + secs(1)));
    }

    #[test]
    fn test_is_spammy_five_stamps_in_a_minute_returns_true() {
        let mut guard = SpamGuard::default();
        let t0 = Instant::now();
        // 10 s apart: never 3 within 5 s, but 5 within a minute.
        for i in 0..5 {
            guard.stamp_at(aid(1), t0 + secs(i * 10));
        }

        assert!(guard.is_spammy_at(aid(1), t0 + secs(40)));
        assert!(!guard.is_spammy_at(aid(1), t0 + secs(61)));
    }

    #[test]
    fn test_is_spammy_thirty_stamps_in_an_hour_returns_true() {
        let mut guard = SpamGuard::default();
        let t0 = Instant::now();
        // 100 s apart: clears both short windows, trips the hourly one.
        for i in 0..30 {
            guard.stamp_at(aid(1), t0 + secs(i * 100));
        }
        let last = t0 + secs(29 * 100);

        assert!(guard.is_spammy_at(aid(1), last));
    }

    #[test]
    fn test_is_spammy_window_expires() {
        let mut guard = SpamGuard::default();
        let t0 = Instant::now();
        for i in 0..3 {
            guard.stamp_at(aid(1), t0 + secs(i));
        }
        assert!(guard.is_spammy_at(aid(1), t0 + secs(2)));
        // 5 s after the first stamp it leaves the short window.
        assert!(!guard.is_spammy_at(aid(1), t0 + secs(5)));
    }

    #[test]
    fn test_is_spammy_actors_are_independent() {
        let mut guard = SpamGuard::default();
        let t0 = Instant::now();
        for _ in 0..3 {
            guard.stamp_at(aid(1), t0);
        }
        guard.stamp_at(aid(2), t0);

        assert!(guard.is_spammy_at(aid(1), t0));
        assert!(!guard.is_spammy_at(aid(2), t0));
    }

    // =====================================================================
    // record_and_check_at()
    // =====================================================================

    #[test]
    fn test_record_and_check_third_request_is_dropped() {
        let mut guard = SpamGuard::default();
        let t0 = Instant::now();

        assert!(!guard.record_and_check_at(aid(1), t0));
        assert!(!guard.record_and_check_at(aid(1), t0 + secs(1)));
        assert!(guard.record_and_check_at(aid(1), t0 + secs(2)));
    }

    #[test]
    fn test_record_and_check_dropped_requests_still_count() {
        let mut guard = SpamGuard::new(SpamConfig {
            thresholds: vec![SpamThreshold::new(60, 2)],
        });
        let t0 = Instant::now();
        guard.record_and_check_at(aid(1), t0);
        guard.record_and_check_at(aid(1), t0 + secs(30));

        // The first stamp has aged out, the dropped one has not.
        assert!(guard.record_and_check_at(aid(1), t0 + secs(70)));
    }

    // =====================================================================
    // Pruning / eviction
    // =====================================================================

    #[test]
    fn test_stamp_prunes_stamps_older_than_an_hour() {
        let mut guard = SpamGuard::default();
        let t0 = Instant::now();
        guard.stamp_at(aid(1), t0);
        guard.stamp_at(aid(1), t0 + secs(1800));

        guard.stamp_at(aid(1), t0 + secs(3601));

        assert_eq!(guard.window(&aid(1)).map(SpamWindow::len), Some(2));
    }

    #[test]
    fn test_pruning_does_not_undercount_hourly_window() {
        let mut guard = SpamGuard::default();
        let t0 = Instant::now();
        // 29 stamps spread over the first 58 minutes.
        for i in 0..29 {
            guard.stamp_at(aid(1), t0 + secs(i * 120));
        }
        let now = t0 + secs(3599);

        // The 30th, still inside the hour of the first one.
        assert!(guard.record_and_check_at(aid(1), now));
        assert_eq!(guard.window(&aid(1)).map(SpamWindow::len), Some(30));
    }

    #[test]
    fn test_evict_idle_removes_only_quiet_actors() {
        let mut guard = SpamGuard::default();
        let t0 = Instant::now();
        guard.stamp_at(aid(1), t0);
        guard.stamp_at(aid(2), t0 + secs(1800));

        let evicted = guard.evict_idle_at(t0 + secs(3600));

        assert_eq!(evicted, 1);
        assert!(guard.window(&aid(1)).is_none());
        assert!(guard.window(&aid(2)).is_some());
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn test_evict_idle_on_empty_guard_returns_zero() {
        let mut guard = SpamGuard::default();
        assert_eq!(guard.evict_idle_at(Instant::now()), 0);
        assert!(guard.is_empty());
    }
}
