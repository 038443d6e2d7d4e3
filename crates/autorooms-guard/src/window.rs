//! A single actor's request history.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// Ordered timestamps of one actor's clone requests, oldest first.
///
/// Uses Tokio's monotonic [`Instant`] so tests can drive it with
/// `tokio::time::pause()` and `advance()`.
#[derive(Debug, Clone, Default)]
pub struct SpamWindow {
    stamps: VecDeque<Instant>,
}

impl SpamWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `now` and discards every stamp at least `retention` old.
    ///
    /// Stamps are appended in clock order, so pruning only ever pops from
    /// the front.
    pub fn stamp(&mut self, now: Instant, retention: Duration) {
        self.stamps.push_back(now);
        while let Some(oldest) = self.stamps.front() {
            if now.saturating_duration_since(*oldest) < retention {
                break;
            }
            self.stamps.pop_front();
        }
    }

    /// Number of stamps strictly younger than `window`.
    pub fn count_within(&self, now: Instant, window: Duration) -> usize {
        self.stamps
            .iter()
            .filter(|stamp| now.saturating_duration_since(**stamp) < window)
            .count()
    }

    /// Returns `true` if no stamp is younger than `retention`.
    pub fn is_idle(&self, now: Instant, retention: Duration) -> bool {
        self.count_within(now, retention) == 0
    }

    /// Total stamps currently held, pruned or not.
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_stamp_prunes_entries_older_than_retention() {
        let t0 = Instant::now();
        let mut window = SpamWindow::new();
        window.stamp(t0, HOUR);
        window.stamp(t0 + Duration::from_secs(10), HOUR);

        window.stamp(t0 + HOUR + Duration::from_secs(1), HOUR);

        // t0 is gone, t0+10s is still inside the hour.
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_stamp_keeps_entries_just_inside_retention() {
        let t0 = Instant::now();
        let mut window = SpamWindow::new();
        window.stamp(t0, HOUR);

        window.stamp(t0 + HOUR - Duration::from_millis(1), HOUR);

        assert_eq!(window.len(), 2);
        assert_eq!(window.count_within(t0 + HOUR - Duration::from_millis(1), HOUR), 2);
    }

    #[test]
    fn test_count_within_only_counts_recent_stamps() {
        let t0 = Instant::now();
        let mut window = SpamWindow::new();
        for secs in [0, 2, 4, 30] {
            window.stamp(t0 + Duration::from_secs(secs), HOUR);
        }
        let now = t0 + Duration::from_secs(31);

        assert_eq!(window.count_within(now, Duration::from_secs(5)), 1);
        assert_eq!(window.count_within(now, Duration::from_secs(60)), 4);
    }

    #[test]
    fn test_is_idle() {
        let t0 = Instant::now();
        let mut window = SpamWindow::new();
        assert!(window.is_idle(t0, HOUR));

        window.stamp(t0, HOUR);
        assert!(!window.is_idle(t0 + Duration::from_secs(1), HOUR));
        assert!(window.is_idle(t0 + HOUR, HOUR));
    }
}
