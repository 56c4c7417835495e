//! Session id generator adapters.

use crate::domain::foundation::SessionId;
use crate::ports::SessionIdGenerator;

/// Generates 128-bit random tokens (UUID v4, simple form).
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSessionIdGenerator;

impl SessionIdGenerator for RandomSessionIdGenerator {
    fn generate(&self) -> SessionId {
        SessionId::generate()
    }
}
