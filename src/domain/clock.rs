// SPDX-License-Identifier: MIT OR Apache-2.0

//! Injectable time source.
//!
//! Cache expiry is judged against a [`Clock`] so that tests can move time
//! forward explicitly instead of sleeping.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A monotonic time source.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// The real monotonic clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same timeline.
///
/// # Examples
///
/// ```
/// use layercfg::domain::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let start = clock.now();
/// clock.advance(Duration::from_secs(5));
/// assert_eq!(clock.now() - start, Duration::from_secs(5));
/// ```
#[derive(Clone, Debug)]
pub struct ManualClock {
    state: Arc<Mutex<(Instant, Duration)>>,
}

impl ManualClock {
    /// Creates a clock anchored at the current instant.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new((Instant::now(), Duration::ZERO))),
        }
    }

    /// Moves the clock forward. The clock stops at the latest instant the
    /// platform can represent.
    pub fn advance(&self, delta: Duration) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.1 = furthest(state.0, state.1.saturating_add(delta));
    }

    /// Time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).1
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.0.checked_add(state.1) {
            Some(now) => now,
            None => state.0 + furthest(state.0, state.1),
        }
    }
}

// Largest offset up to `want` that can be added to `anchor`.
fn furthest(anchor: Instant, want: Duration) -> Duration {
    if anchor.checked_add(want).is_some() {
        return want;
    }
    let (mut lo, mut hi) = (Duration::ZERO, want);
    while hi - lo > Duration::from_nanos(1) {
        let mid = lo + (hi - lo) / 2;
        if anchor.checked_add(mid).is_some() {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_is_frozen() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        let before = other.now();
        clock.advance(Duration::from_millis(250));
        assert_eq!(other.now() - before, Duration::from_millis(250));
    }

    #[test]
    fn test_manual_clock_saturates() {
        let clock = ManualClock::new();
        clock.advance(Duration::MAX);
        let end = clock.now();
        clock.advance(Duration::MAX);
        clock.advance(Duration::from_secs(1));

        assert_eq!(clock.now(), end);
        assert!(clock.elapsed() > Duration::ZERO);
        assert_eq!(
            crate::domain::CacheLength::millis(1).expiry_from(end),
            crate::domain::Expiry::Never
        );
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
