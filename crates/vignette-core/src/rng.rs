//! Deterministic random number generator
//!
//! Wandering sprites draw their headings from here. A seeded xorshift64 keeps
//! the same map + seed walking the same route, so scenes replay identically.

use crate::sprite::Direction;
use serde::{Deserialize, Serialize};

/// Seeded xorshift64 generator owned by the map state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRng {
    state: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        // xorshift is stuck at zero forever
        Self {
            state: seed.max(1),
        }
    }

    /// Current internal state
    pub fn state(&self) -> u64 {
        self.state
    }

    /// Generate the next raw u64 value
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform index in `0..len`; `len` must be non-zero
    pub fn index(&mut self, len: usize) -> usize {
        (self.next_u64() % len as u64) as usize
    }

    /// Pick a random element from a slice
    pub fn pick<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            None
        } else {
            let i = self.index(slice.len());
            Some(&slice[i])
        }
    }

    /// Random heading, never equal to `avoid`
    ///
    /// Used when a wandering sprite bumps into something and must turn away.
    pub fn direction_except(&mut self, avoid: Option<Direction>) -> Direction {
        let choices: Vec<Direction> = Direction::ALL
            .iter()
            .copied()
            .filter(|d| Some(*d) != avoid)
            .collect();
        choices[self.index(choices.len())]
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::new(12345)
    }
}
