//! Time system for the map scene
//!
//! The host drives the scene with one update per game tick and tells it how
//! many milliseconds elapsed:
//! - `Tick` - Logical tick counter
//! - `Clock` - Tick count, cumulative elapsed time and the current tick's delta

use serde::{Deserialize, Serialize};

/// A discrete tick identifier (logical time unit)
pub type Tick = u64;

/// Scene clock state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    /// Number of ticks processed so far
    pub tick: Tick,
    /// Total milliseconds elapsed across all ticks
    pub elapsed_ms: u64,
    /// Milliseconds elapsed during the current tick
    pub delta_ms: u32,
}

impl Clock {
    /// Create a new clock at tick 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to the next tick
    pub fn advance(&mut self, delta_ms: u32) {
        self.tick += 1;
        self.delta_ms = delta_ms;
        self.elapsed_ms += u64::from(delta_ms);
    }

    /// Milliseconds elapsed during the current tick
    pub fn delta(&self) -> u32 {
        self.delta_ms
    }
}
