//! Process-local adapters: wall clock and random id generation.

mod clock;
mod id_generator;

pub use clock::{ManualClock, SystemClock};
pub use id_generator::RandomSessionIdGenerator;
