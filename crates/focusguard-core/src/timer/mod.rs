//! Timer state machine.

mod engine;

pub use engine::{Phase, Snapshot, TimerEngine};
