//! Spam guard thresholds.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// SpamThreshold
// ---------------------------------------------------------------------------

/// One rate rule: `max_events` or more stamps within the trailing
/// `window_secs` marks the actor spammy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpamThreshold {
    /// Length of the trailing window, in seconds.
    pub window_secs: u64,
    /// Stamp count at which the rule trips.
    pub max_events: usize,
}

impl SpamThreshold {
    pub const fn new(window_secs: u64, max_events: usize) -> Self {
        Self {
            window_secs,
            max_events,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

// ---------------------------------------------------------------------------
// SpamConfig
// ---------------------------------------------------------------------------

/// Configuration for the spam guard.
///
/// The defaults allow at most 2 rooms per 5 seconds, 4 per minute, and
/// 29 per hour for a single actor (the request that reaches a threshold is
/// the one that gets dropped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpamConfig {
    pub thresholds: Vec<SpamThreshold>,
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            thresholds: vec![
                SpamThreshold::new(5, 3),
                SpamThreshold::new(60, 5),
                SpamThreshold::new(3600, 30),
            ],
        }
    }
}

impl SpamConfig {
    /// Drops rules that can never be meaningful.
    ///
    /// Called automatically by [`SpamGuard::new`](crate::SpamGuard::new).
    /// A zero-length window never contains a stamp, and a zero event count
    /// would mark every actor spammy forever.
    pub fn validated(mut self) -> Self {
        self.thresholds.retain(|t| {
            let keep = t.window_secs > 0 && t.max_events > 0;
            if !keep {
                warn!(
                    window_secs = t.window_secs,
                    max_events = t.max_events,
                    "ignoring degenerate spam threshold"
                );
            }
            keep
        });
        self
    }

    /// How long a stamp stays relevant: the longest threshold window.
    pub fn retention(&self) -> Duration {
        self.thresholds
            .iter()
            .map(SpamThreshold::window)
            .max()
            .unwrap_or(Duration::ZERO)
    }
}
