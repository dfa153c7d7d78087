//! Event definition schema

use serde::{Deserialize, Serialize};
use vignette_core::{Anchor, Direction, EventId, EventLink, SpriteId};

/// Definition of a map event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    /// Unique identifier for this event
    pub id: EventId,
    /// What the event does
    pub kind: EventKindDef,
    /// Children to launch relative to this event
    #[serde(default)]
    pub links: Vec<LinkDef>,
}

/// A link as written in map files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDef {
    pub child: EventId,
    pub anchor: Anchor,
    /// Milliseconds
    #[serde(default)]
    pub delay: u32,
}

impl From<&LinkDef> for EventLink {
    fn from(def: &LinkDef) -> Self {
        EventLink::new(def.child.clone(), def.anchor, def.delay)
    }
}

/// The built-in event kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKindDef {
    /// Script functions called on start and update
    Script {
        #[serde(default)]
        start: Option<String>,
        #[serde(default)]
        update: Option<String>,
    },
    /// Start one of two events depending on a script condition
    Branch {
        condition: String,
        #[serde(default)]
        on_true: Option<EventId>,
        #[serde(default)]
        on_false: Option<EventId>,
    },
    Dialogue {
        dialogue: String,
    },
    MapTransition {
        map: String,
        #[serde(default)]
        entrance: Option<String>,
    },
    Shop {
        shop: String,
    },
    Battle {
        enemies: Vec<u32>,
        #[serde(default)]
        music: Option<String>,
        #[serde(default)]
        background: Option<String>,
    },
    Sound {
        sound: String,
    },
    PathMove {
        sprite: SpriteId,
        destination: (f32, f32),
        #[serde(default)]
        run: bool,
    },
    PathMoveToSprite {
        sprite: SpriteId,
        target: SpriteId,
        #[serde(default)]
        run: bool,
    },
    RandomMove {
        sprite: SpriteId,
        /// Milliseconds
        duration: u32,
        /// Milliseconds between heading changes; the scene default if absent
        #[serde(default)]
        direction_change: Option<u32>,
    },
    Animate {
        sprite: SpriteId,
        animation: String,
        /// Milliseconds; loops until ended if absent
        #[serde(default)]
        duration: Option<u32>,
    },
    ChangeDirection {
        sprite: SpriteId,
        direction: Direction,
    },
    LookAtPoint {
        sprite: SpriteId,
        point: (f32, f32),
    },
    LookAtSprite {
        sprite: SpriteId,
        target: SpriteId,
    },
    /// Script functions called with the controlled sprite
    ScriptedSprite {
        sprite: SpriteId,
        #[serde(default)]
        start: Option<String>,
        #[serde(default)]
        update: Option<String>,
    },
}

impl EventKindDef {
    /// The sprite a sprite event takes control of
    pub fn controlled_sprite(&self) -> Option<SpriteId> {
        match self {
            EventKindDef::PathMove { sprite, .. }
            | EventKindDef::PathMoveToSprite { sprite, .. }
            | EventKindDef::RandomMove { sprite, .. }
            | EventKindDef::Animate { sprite, .. }
            | EventKindDef::ChangeDirection { sprite, .. }
            | EventKindDef::LookAtPoint { sprite, .. }
            | EventKindDef::LookAtSprite { sprite, .. }
            | EventKindDef::ScriptedSprite { sprite, .. } => Some(*sprite),
            _ => None,
        }
    }

    /// Every sprite the event refers to, controlled or watched
    pub fn sprites(&self) -> Vec<SpriteId> {
        let mut sprites: Vec<SpriteId> = self.controlled_sprite().into_iter().collect();
        match self {
            EventKindDef::PathMoveToSprite { target, .. }
            | EventKindDef::LookAtSprite { target, .. } => sprites.push(*target),
            _ => {}
        }
        sprites
    }

    /// Events this kind starts by itself, outside of links
    pub fn started_events(&self) -> Vec<&EventId> {
        match self {
            EventKindDef::Branch {
                on_true, on_false, ..
            } => on_true.iter().chain(on_false.iter()).collect(),
            _ => Vec::new(),
        }
    }
}

impl EventDef {
    /// Create a new event definition
    pub fn new(id: impl Into<EventId>, kind: EventKindDef) -> Self {
        Self {
            id: id.into(),
            kind,
            links: Vec::new(),
        }
    }

    /// Add a link
    pub fn with_link(mut self, child: impl Into<EventId>, anchor: Anchor, delay: u32) -> Self {
        self.links.push(LinkDef {
            child: child.into(),
            anchor,
            delay,
        });
        self
    }
}
