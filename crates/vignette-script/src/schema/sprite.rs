//! Sprite placement schema

use serde::{Deserialize, Serialize};
use vignette_core::{speed, Direction, Position, SpriteId, VirtualSprite};

/// A sprite placed on the map when it loads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteDef {
    /// Unique identifier for this sprite
    pub id: SpriteId,
    /// Display name
    pub name: String,
    /// Starting tile position as `(x, y)`
    pub position: (f32, f32),
    /// Starting facing direction
    #[serde(default)]
    pub direction: Direction,
    /// Milliseconds per tile
    #[serde(default = "default_speed")]
    pub speed: f32,
}

fn default_speed() -> f32 {
    speed::NORMAL
}

impl SpriteDef {
    /// Create a new sprite definition
    pub fn new(id: u64, name: impl Into<String>, position: (f32, f32)) -> Self {
        Self {
            id: SpriteId::new(id),
            name: name.into(),
            position,
            direction: Direction::default(),
            speed: default_speed(),
        }
    }

    /// Build the runtime sprite
    pub fn to_sprite(&self) -> VirtualSprite {
        VirtualSprite::new(self.id, self.name.clone(), Position::from(self.position))
            .with_direction(self.direction)
            .with_speed(self.speed)
    }
}
