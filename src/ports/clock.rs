//! Clock port.
//!
//! Handlers read the current time through this port so expiry can be tested
//! with a simulated clock.

use crate::domain::foundation::Timestamp;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}
