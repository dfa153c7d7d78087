//! Map state shared with every event
//!
//! `MapState` is the explicit context an event works against: the sprites,
//! the clock, the RNG, and the collaborators that live outside this crate
//! (path finding, collision, dialogue playback). Events receive it through
//! [`EventContext`](crate::EventContext) instead of reaching for a global.

use crate::{
    Clock, Direction, GameRng, Position, SceneCommand, SceneConfig, SpriteId, SpriteStore,
    VirtualSprite,
};
use std::collections::HashSet;
use std::fmt;

/// Computes walkable routes. Internals are opaque to the scheduler.
pub trait PathFinder {
    /// Nodes leading from the sprite's position to `destination`, or `None`
    /// if it cannot be reached
    fn find_path(&self, sprite: &VirtualSprite, destination: Position) -> Option<Vec<Position>>;
}

/// Answers whether a sprite may stand at a position
pub trait CollisionMap {
    fn is_blocked(&self, sprites: &SpriteStore, sprite: SpriteId, position: Position) -> bool;
}

/// Dialogue playback, owned by the dialogue layer
pub trait DialogueHost {
    /// Begin a dialogue. Returns false if it does not exist or cannot start.
    fn begin(&mut self, dialogue: &str) -> bool;

    /// Whether the dialogue is still being shown
    fn is_running(&self, dialogue: &str) -> bool;
}

/// Straight line to the destination
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectPath;

impl PathFinder for DirectPath {
    fn find_path(&self, _sprite: &VirtualSprite, destination: Position) -> Option<Vec<Position>> {
        Some(vec![destination])
    }
}

/// Nothing ever blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGround;

impl CollisionMap for OpenGround {
    fn is_blocked(&self, _sprites: &SpriteStore, _sprite: SpriteId, _position: Position) -> bool {
        false
    }
}

/// Whole tiles that no sprite may enter
#[derive(Debug, Clone, Default)]
pub struct TileGrid {
    blocked: HashSet<(i32, i32)>,
}

impl TileGrid {
    /// Create an empty grid
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a tile as blocked
    pub fn block(mut self, x: i32, y: i32) -> Self {
        self.blocked.insert((x, y));
        self
    }
}

impl CollisionMap for TileGrid {
    fn is_blocked(&self, _sprites: &SpriteStore, _sprite: SpriteId, position: Position) -> bool {
        let tile = (position.x.floor() as i32, position.y.floor() as i32);
        self.blocked.contains(&tile)
    }
}

/// Used when the map has no dialogue layer
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDialogue;

impl DialogueHost for NoDialogue {
    fn begin(&mut self, _dialogue: &str) -> bool {
        false
    }

    fn is_running(&self, _dialogue: &str) -> bool {
        false
    }
}

/// Result of moving a sprite for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The sprite moved
    Moved,
    /// The sprite reached the requested point
    Arrived,
    /// Collision stopped the sprite where it stood
    Blocked,
    /// No such sprite
    Missing,
}

/// Everything on the map that events read and write
pub struct MapState {
    /// All sprites on the map
    pub sprites: SpriteStore,
    /// Scene clock
    pub clock: Clock,
    /// Deterministic RNG
    pub rng: GameRng,
    /// Tunables
    pub config: SceneConfig,
    pathfinder: Box<dyn PathFinder>,
    collision: Box<dyn CollisionMap>,
    dialogues: Box<dyn DialogueHost>,
    commands: Vec<SceneCommand>,
}

impl MapState {
    /// Create an empty map with default collaborators
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    /// Create an empty map with a specific configuration
    pub fn with_config(config: SceneConfig) -> Self {
        Self {
            sprites: SpriteStore::new(),
            clock: Clock::new(),
            rng: GameRng::new(config.rng_seed),
            config,
            pathfinder: Box::new(DirectPath),
            collision: Box::new(OpenGround),
            dialogues: Box::new(NoDialogue),
            commands: Vec::new(),
        }
    }

    /// Use a different path finder
    pub fn with_pathfinder(mut self, pathfinder: impl PathFinder + 'static) -> Self {
        self.pathfinder = Box::new(pathfinder);
        self
    }

    /// Use a different collision map
    pub fn with_collision(mut self, collision: impl CollisionMap + 'static) -> Self {
        self.collision = Box::new(collision);
        self
    }

    /// Use a dialogue layer
    pub fn with_dialogues(mut self, dialogues: impl DialogueHost + 'static) -> Self {
        self.dialogues = Box::new(dialogues);
        self
    }

    /// Add a sprite
    pub fn add_sprite(&mut self, sprite: VirtualSprite) {
        self.sprites.insert(sprite);
    }

    /// Ask the path finder for a route
    pub fn find_path(&self, sprite: SpriteId, destination: Position) -> Option<Vec<Position>> {
        let sprite = self.sprites.get(sprite)?;
        self.pathfinder.find_path(sprite, destination)
    }

    /// The dialogue layer
    pub fn dialogues(&self) -> &dyn DialogueHost {
        self.dialogues.as_ref()
    }

    /// The dialogue layer, mutably
    pub fn dialogues_mut(&mut self) -> &mut dyn DialogueHost {
        self.dialogues.as_mut()
    }

    /// Queue a request for the host
    pub fn push_command(&mut self, command: SceneCommand) {
        self.commands.push(command);
    }

    /// Pending host requests
    pub fn commands(&self) -> &[SceneCommand] {
        &self.commands
    }

    /// Drain pending host requests
    pub fn take_commands(&mut self) -> Vec<SceneCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Whether `position` is free for `sprite`
    pub fn is_blocked(&self, sprite: SpriteId, position: Position) -> bool {
        self.collision.is_blocked(&self.sprites, sprite, position)
    }

    /// Walk a sprite in `direction` for `elapsed_ms`
    ///
    /// The sprite faces `direction` either way; it only moves if the
    /// destination is free.
    pub fn step_sprite(&mut self, id: SpriteId, direction: Direction, elapsed_ms: u32) -> StepOutcome {
        let Some(sprite) = self.sprites.get(id) else {
            return StepOutcome::Missing;
        };
        let distance = tiles_for(sprite, elapsed_ms);
        let (ux, uy) = direction.unit();
        let next = Position::new(
            sprite.position.x + ux * distance,
            sprite.position.y + uy * distance,
        );
        let blocked = self.is_blocked(id, next);

        let Some(sprite) = self.sprites.get_mut(id) else {
            return StepOutcome::Missing;
        };
        sprite.direction = direction;
        if blocked {
            sprite.moving = false;
            return StepOutcome::Blocked;
        }
        sprite.position = next;
        sprite.moving = true;
        StepOutcome::Moved
    }

    /// Walk a sprite straight toward `target` for `elapsed_ms`
    ///
    /// Snaps onto `target` instead of overshooting it. A sprite already
    /// within `tolerance` arrives without moving.
    pub fn step_toward(
        &mut self,
        id: SpriteId,
        target: Position,
        elapsed_ms: u32,
        tolerance: f32,
    ) -> StepOutcome {
        let Some(sprite) = self.sprites.get(id) else {
            return StepOutcome::Missing;
        };
        let from = sprite.position;
        let remaining = from.distance(target);
        if remaining <= tolerance {
            return StepOutcome::Arrived;
        }

        let distance = tiles_for(sprite, elapsed_ms);
        let (next, arrived) = if distance >= remaining {
            (target, true)
        } else {
            let scale = distance / remaining;
            (
                Position::new(
                    from.x + (target.x - from.x) * scale,
                    from.y + (target.y - from.y) * scale,
                ),
                remaining - distance <= tolerance,
            )
        };
        let blocked = self.is_blocked(id, next);

        let Some(sprite) = self.sprites.get_mut(id) else {
            return StepOutcome::Missing;
        };
        if let Some(direction) = Direction::toward(from, target) {
            sprite.direction = direction;
        }
        if blocked {
            sprite.moving = false;
            return StepOutcome::Blocked;
        }
        sprite.position = next;
        sprite.moving = true;
        if arrived {
            StepOutcome::Arrived
        } else {
            StepOutcome::Moved
        }
    }
}

fn tiles_for(sprite: &VirtualSprite, elapsed_ms: u32) -> f32 {
    let ms_per_tile = sprite.ms_per_tile();
    if ms_per_tile <= 0.0 {
        0.0
    } else {
        elapsed_ms as f32 / ms_per_tile
    }
}

impl Default for MapState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapState")
            .field("sprites", &self.sprites.len())
            .field("clock", &self.clock)
            .field("pending_commands", &self.commands.len())
            .finish()
    }
}
