//! One-second repeating clock.
//!
//! The ticker owns no thread. The runtime asks it when the next tick is due
//! and calls [`Ticker::poll`] once that instant has passed. Pausing keeps the
//! clock armed but freezes the time left until the next tick, so a resumed
//! clock does not fire early.

use std::time::{Duration, Instant};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickerState {
    Disarmed,
    Armed { next_due: Instant },
    Paused { left: Duration },
}

#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    state: TickerState,
}

impl Ticker {
    pub fn new() -> Self {
        Self::with_interval(TICK_INTERVAL)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            state: TickerState::Disarmed,
        }
    }

    pub fn is_armed(&self) -> bool {
        !matches!(self.state, TickerState::Disarmed)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, TickerState::Paused { .. })
    }

    /// Start (or restart) the clock; the first tick is one interval away.
    pub fn arm(&mut self, now: Instant) {
        self.state = TickerState::Armed {
            next_due: now + self.interval,
        };
    }

    pub fn disarm(&mut self) {
        self.state = TickerState::Disarmed;
    }

    pub fn pause(&mut self, now: Instant) {
        if let TickerState::Armed { next_due } = self.state {
            self.state = TickerState::Paused {
                left: next_due.saturating_duration_since(now),
            };
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if let TickerState::Paused { left } = self.state {
            self.state = TickerState::Armed {
                next_due: now + left,
            };
        }
    }

    /// Instant of the next tick, if the clock is running.
    pub fn next_due(&self) -> Option<Instant> {
        match self.state {
            TickerState::Armed { next_due } => Some(next_due),
            _ => None,
        }
    }

    /// Returns `true` when a tick fires at `now`. At most one tick per call;
    /// a clock that fell far behind skips the backlog instead of bursting.
    pub fn poll(&mut self, now: Instant) -> bool {
        let TickerState::Armed { next_due } = self.state else {
            return false;
        };
        if now < next_due {
            return false;
        }
        let mut next = next_due + self.interval;
        if next <= now {
            next = now + self.interval;
        }
        self.state = TickerState::Armed { next_due: next };
        true
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disarmed_ticker_never_fires() {
        let mut t = Ticker::new();
        let now = Instant::now();
        assert!(!t.poll(now + Duration::from_secs(10)));
        assert!(t.next_due().is_none());
    }

    #[test]
    fn fires_once_per_interval() {
        let mut t = Ticker::new();
        let start = Instant::now();
        t.arm(start);
        assert!(!t.poll(start + Duration::from_millis(500)));
        assert!(t.poll(start + Duration::from_secs(1)));
        assert!(!t.poll(start + Duration::from_millis(1500)));
        assert!(t.poll(start + Duration::from_secs(2)));
    }

    #[test]
    fn backlog_is_not_replayed() {
        let mut t = Ticker::new();
        let start = Instant::now();
        t.arm(start);
        let late = start + Duration::from_secs(10);
        assert!(t.poll(late));
        assert!(!t.poll(late));
        assert_eq!(t.next_due(), Some(late + TICK_INTERVAL));
    }

    #[test]
    fn pause_freezes_remaining_interval() {
        let mut t = Ticker::new();
        let start = Instant::now();
        t.arm(start);
        t.pause(start + Duration::from_millis(300));
        assert!(t.is_paused());
        assert!(!t.poll(start + Duration::from_secs(5)));

        let resumed_at = start + Duration::from_secs(5);
        t.resume(resumed_at);
        assert_eq!(t.next_due(), Some(resumed_at + Duration::from_millis(700)));
    }
}
