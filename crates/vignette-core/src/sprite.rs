//! Mobile entities driven by sprite events

use crate::{EventId, SpriteId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Walking speeds in milliseconds per tile
pub mod speed {
    pub const VERY_SLOW: f32 = 225.0;
    pub const SLOW: f32 = 190.0;
    pub const NORMAL: f32 = 150.0;
    pub const FAST: f32 = 110.0;
    pub const VERY_FAST: f32 = 75.0;
}

/// A position on the map, in tiles
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    /// Create a new position
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in tiles
    pub fn distance(&self, other: Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(f32, f32)> for Position {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Facing / walking direction. The y axis grows southward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    North,
    #[default]
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    /// All eight directions
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    /// Unit displacement for one tile of movement in this direction
    pub fn unit(&self) -> (f32, f32) {
        const D: f32 = std::f32::consts::FRAC_1_SQRT_2;
        match self {
            Direction::North => (0.0, -1.0),
            Direction::South => (0.0, 1.0),
            Direction::East => (1.0, 0.0),
            Direction::West => (-1.0, 0.0),
            Direction::NorthEast => (D, -D),
            Direction::NorthWest => (-D, -D),
            Direction::SouthEast => (D, D),
            Direction::SouthWest => (-D, D),
        }
    }

    /// The direction pointing from `from` toward `to`
    ///
    /// Picks the dominant axis, or a diagonal when neither axis is more than
    /// twice the other. Returns `None` if both points coincide.
    pub fn toward(from: Position, to: Position) -> Option<Direction> {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let (ax, ay) = (dx.abs(), dy.abs());
        if ax < f32::EPSILON && ay < f32::EPSILON {
            return None;
        }

        let direction = if ax > 2.0 * ay {
            if dx > 0.0 {
                Direction::East
            } else {
                Direction::West
            }
        } else if ay > 2.0 * ax {
            if dy > 0.0 {
                Direction::South
            } else {
                Direction::North
            }
        } else {
            match (dx > 0.0, dy > 0.0) {
                (true, true) => Direction::SouthEast,
                (true, false) => Direction::NorthEast,
                (false, true) => Direction::SouthWest,
                (false, false) => Direction::NorthWest,
            }
        };
        Some(direction)
    }
}

/// A scripted animation overriding the sprite's walk cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomAnimation {
    /// Animation name known to the renderer
    pub name: String,
    /// Time left to play; `None` loops until cleared
    pub remaining_ms: Option<u32>,
}

/// Motion state put aside while something else (a dialogue) holds the sprite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedState {
    pub direction: Direction,
    pub movement_speed: f32,
    pub moving: bool,
    pub running: bool,
    pub custom_animation: Option<CustomAnimation>,
}

/// A mobile entity that sprite events take control of
///
/// The sprite never owns its controller: `control_event` is only an id that
/// is resolved through the event supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualSprite {
    /// Unique identifier for this sprite
    pub id: SpriteId,
    /// Display name
    pub name: String,
    /// Current position in tiles
    pub position: Position,
    /// Facing direction
    pub direction: Direction,
    /// Milliseconds needed to walk one tile
    pub movement_speed: f32,
    /// Whether the sprite is walking
    pub moving: bool,
    /// Whether the sprite runs (twice the walking speed)
    pub running: bool,
    /// Scripted animation, if any
    pub custom_animation: Option<CustomAnimation>,
    control_event: Option<EventId>,
    saved_state: Option<SavedState>,
}

impl VirtualSprite {
    /// Create a new sprite at rest
    pub fn new(id: SpriteId, name: impl Into<String>, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            direction: Direction::South,
            movement_speed: speed::NORMAL,
            moving: false,
            running: false,
            custom_animation: None,
            control_event: None,
            saved_state: None,
        }
    }

    /// Set the facing direction
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Set the walking speed (milliseconds per tile)
    pub fn with_speed(mut self, movement_speed: f32) -> Self {
        self.movement_speed = movement_speed;
        self
    }

    /// The event currently directing this sprite
    pub fn control_event(&self) -> Option<&EventId> {
        self.control_event.as_ref()
    }

    /// Record `event` as the controller
    pub fn acquire_control(&mut self, event: EventId) {
        self.control_event = Some(event);
    }

    /// Clear the controller, but only if `event` still holds it
    ///
    /// Returns whether control was released.
    pub fn release_control(&mut self, event: &EventId) -> bool {
        if self.control_event.as_ref() == Some(event) {
            self.control_event = None;
            true
        } else {
            false
        }
    }

    /// Effective milliseconds per tile
    pub fn ms_per_tile(&self) -> f32 {
        if self.running {
            self.movement_speed / 2.0
        } else {
            self.movement_speed
        }
    }

    /// Stop walking
    pub fn halt(&mut self) {
        self.moving = false;
        self.running = false;
    }

    /// Put the current motion state aside
    pub fn save_state(&mut self) {
        self.saved_state = Some(SavedState {
            direction: self.direction,
            movement_speed: self.movement_speed,
            moving: self.moving,
            running: self.running,
            custom_animation: self.custom_animation.clone(),
        });
    }

    /// Restore the state put aside by `save_state`, if any
    pub fn restore_state(&mut self) -> bool {
        match self.saved_state.take() {
            Some(saved) => {
                self.direction = saved.direction;
                self.movement_speed = saved.movement_speed;
                self.moving = saved.moving;
                self.running = saved.running;
                self.custom_animation = saved.custom_animation;
                true
            }
            None => false,
        }
    }

    /// Whether a state is currently saved
    pub fn is_state_saved(&self) -> bool {
        self.saved_state.is_some()
    }
}

/// Storage for all sprites on the map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpriteStore {
    sprites: IndexMap<SpriteId, VirtualSprite>,
}

impl SpriteStore {
    /// Create a new empty sprite store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sprite, returning the one it replaced
    pub fn insert(&mut self, sprite: VirtualSprite) -> Option<VirtualSprite> {
        self.sprites.insert(sprite.id, sprite)
    }

    /// Get a sprite by ID
    pub fn get(&self, id: SpriteId) -> Option<&VirtualSprite> {
        self.sprites.get(&id)
    }

    /// Get a mutable reference to a sprite
    pub fn get_mut(&mut self, id: SpriteId) -> Option<&mut VirtualSprite> {
        self.sprites.get_mut(&id)
    }

    /// Remove a sprite
    pub fn remove(&mut self, id: SpriteId) -> Option<VirtualSprite> {
        self.sprites.shift_remove(&id)
    }

    /// Check if a sprite exists
    pub fn contains(&self, id: SpriteId) -> bool {
        self.sprites.contains_key(&id)
    }

    /// Iterate over all sprites
    pub fn iter(&self) -> impl Iterator<Item = &VirtualSprite> {
        self.sprites.values()
    }

    /// Sprites currently directed by `event`
    pub fn controlled_by<'a>(&'a self, event: &'a EventId) -> impl Iterator<Item = &'a VirtualSprite> {
        self.sprites
            .values()
            .filter(move |s| s.control_event.as_ref() == Some(event))
    }

    /// Get the number of sprites
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}
