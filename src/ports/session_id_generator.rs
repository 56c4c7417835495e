//! Session id generation port.

use crate::domain::foundation::SessionId;

/// Produces candidate keys for sessions created without a caller-supplied id.
///
/// Implementations should be collision resistant; the create handler still
/// retries on collision a bounded number of times.
pub trait SessionIdGenerator: Send + Sync {
    fn generate(&self) -> SessionId;
}
