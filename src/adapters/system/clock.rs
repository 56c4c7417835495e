//! Clock adapters.

use std::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::ports::Clock;

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<Timestamp>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Create a clock frozen at the given Unix time.
    pub fn at_unix_secs(secs: i64) -> Self {
        Self::new(Timestamp::from_unix_secs(secs).unwrap_or_default())
    }

    /// Move the clock forward.
    pub fn advance_secs(&self, secs: u64) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now = now.plus_secs(secs);
    }

    /// Jump to an absolute instant.
    pub fn set(&self, to: Timestamp) {
        *self.now.write().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}
