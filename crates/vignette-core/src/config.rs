//! Scene configuration
//!
//! Tunables for the scheduler diagnostics and the built-in sprite events.
//! Every field has a default, so map files only need to mention the values
//! they change.

use serde::{Deserialize, Serialize};

/// Configuration for a map scene
///
/// # Example
///
/// ```
/// use vignette_core::SceneConfig;
///
/// let config = SceneConfig::default();
/// assert_eq!(config.diagnostics_capacity(), 64);
///
/// let config = SceneConfig::default().with_diagnostics_capacity(0);
/// assert_eq!(config.diagnostics_capacity(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Number of scheduler warnings kept for inspection
    ///
    /// Clamped to at least 1.
    diagnostics_capacity: usize,
    /// How often a wandering sprite picks a new heading
    pub wander_direction_change_ms: u32,
    /// How often a path toward a moving sprite is re-planned
    pub path_recompute_ms: u32,
    /// Distance (tiles) at which a path node counts as reached
    pub arrival_tolerance: f32,
    /// Distance (tiles) at which a sprite chasing another has caught up
    pub target_reach_distance: f32,
    /// Seed for the map RNG
    pub rng_seed: u64,
}

impl SceneConfig {
    /// Set the diagnostics capacity
    ///
    /// The value is clamped to at least 1.
    pub fn with_diagnostics_capacity(mut self, capacity: usize) -> Self {
        self.set_diagnostics_capacity(capacity);
        self
    }

    /// Get the diagnostics capacity
    pub fn diagnostics_capacity(&self) -> usize {
        self.diagnostics_capacity.max(1)
    }

    /// Set the diagnostics capacity (clamped to at least 1)
    pub fn set_diagnostics_capacity(&mut self, capacity: usize) {
        self.diagnostics_capacity = capacity.max(1);
    }

    /// Set the RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            diagnostics_capacity: 64,
            wander_direction_change_ms: 1500,
            path_recompute_ms: 500,
            arrival_tolerance: 0.05,
            target_reach_distance: 1.0,
            rng_seed: 12345,
        }
    }
}
