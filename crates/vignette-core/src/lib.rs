//! Vignette Core - Event-chaining scheduler for interactive map scenes
//!
//! This crate drives scripted map scenes: dialogue, sprite movement, timed
//! animations, transitions and encounters.
//! - `MapEvent` - A unit of work with a start / update / terminate lifecycle
//! - `EventLink` - Launch a child event at a parent's start or finish
//! - `EventSupervisor` - Registry and per-tick driver for all events
//! - `SpriteEvent` - Exclusive control of one sprite while an action runs
//! - `MapState` - Sprites, clock, RNG and collaborators shared with events
//!
//! ## Ticking
//!
//! The host owns both halves and calls one update per game tick:
//!
//! ```
//! use vignette_core::{EventSupervisor, MapEvent, MapState, ScriptedEvent};
//!
//! let mut supervisor = EventSupervisor::new();
//! let mut map = MapState::new();
//!
//! supervisor
//!     .register(MapEvent::new("open_door", ScriptedEvent::new()))
//!     .unwrap();
//! supervisor
//!     .register(MapEvent::new("npc_greet", ScriptedEvent::new()).launch_at_finish("open_door", 0))
//!     .unwrap();
//!
//! supervisor.start_event(&mut map, "npc_greet");
//! supervisor.update(&mut map, 16);
//!
//! assert!(!supervisor.is_event_active("npc_greet"));
//! assert!(supervisor.is_event_active("open_door"));
//! ```

mod cmd;
mod config;
mod dialogue;
mod error;
mod event;
mod facing;
mod identity;
mod map;
mod movement;
mod rng;
mod scripted;
mod sprite;
mod sprite_event;
pub mod supervisor;
pub mod time;

pub use cmd::{CommandEvent, SceneCommand};
pub use config::SceneConfig;
pub use dialogue::{DialogueEvent, SpeakerHold};
pub use error::{Error, Result};
pub use event::{Anchor, EventBehavior, EventContext, EventKind, EventLink, MapEvent};
pub use facing::{AnimateAction, ChangeDirectionAction, LookAtAction};
pub use identity::{EventId, SpriteId};
pub use map::{
    CollisionMap, DialogueHost, DirectPath, MapState, NoDialogue, OpenGround, PathFinder,
    StepOutcome, TileGrid,
};
pub use movement::{PathMoveAction, RandomMoveAction};
pub use rng::GameRng;
pub use scripted::{
    BranchEvent, ScriptBridge, ScriptCondition, ScriptStart, ScriptTable, ScriptUpdate,
    ScriptedEvent, ScriptedSpriteAction, SpriteScriptStart, SpriteScriptUpdate,
};
pub use sprite::{speed, CustomAnimation, Direction, Position, SavedState, SpriteStore, VirtualSprite};
pub use sprite_event::{SpriteAction, SpriteEvent};
pub use supervisor::{DelayedEvent, EventSupervisor, Phase};
pub use time::{Clock, Tick};
