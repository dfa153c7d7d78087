//! Requests that map events hand to the host
//!
//! Events never switch game modes or play audio themselves. They queue a
//! `SceneCommand` on the map state and the host drains the queue after
//! each tick.

use crate::{EventBehavior, EventContext};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A request for the host to act on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneCommand {
    /// Leave this map for another
    ChangeMap {
        /// Map data to load
        map: String,
        /// Where the player arrives on the new map
        #[serde(default)]
        entrance: Option<String>,
    },

    /// Open a shop
    OpenShop { shop: String },

    /// Start a battle
    StartBattle {
        /// Enemy party identifiers
        enemies: Vec<u32>,
        #[serde(default)]
        music: Option<String>,
        #[serde(default)]
        background: Option<String>,
    },

    /// Play a sound effect
    PlaySound { sound: String },
}

impl SceneCommand {
    /// Create a map change command
    pub fn change_map(map: impl Into<String>) -> Self {
        SceneCommand::ChangeMap {
            map: map.into(),
            entrance: None,
        }
    }

    /// Create a shop command
    pub fn open_shop(shop: impl Into<String>) -> Self {
        SceneCommand::OpenShop { shop: shop.into() }
    }

    /// Create a battle command with default music and background
    pub fn battle(enemies: Vec<u32>) -> Self {
        SceneCommand::StartBattle {
            enemies,
            music: None,
            background: None,
        }
    }

    /// Create a sound command
    pub fn play_sound(sound: impl Into<String>) -> Self {
        SceneCommand::PlaySound {
            sound: sound.into(),
        }
    }

    /// Whether this command takes the player out of the map mode
    pub fn leaves_map(&self) -> bool {
        matches!(
            self,
            SceneCommand::ChangeMap { .. }
                | SceneCommand::OpenShop { .. }
                | SceneCommand::StartBattle { .. }
        )
    }
}

/// Queues a command when started and finishes on its first update
///
/// Map transitions, shops, battles and sounds are all this event with a
/// different command.
#[derive(Debug, Clone)]
pub struct CommandEvent {
    command: SceneCommand,
}

impl CommandEvent {
    pub fn new(command: SceneCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &SceneCommand {
        &self.command
    }
}

impl EventBehavior for CommandEvent {
    fn start(&mut self, ctx: &mut EventContext<'_>) {
        info!(target: "events", event = %ctx.event_id(), command = ?self.command, "Queued scene command");
        ctx.map.push_command(self.command.clone());
    }

    fn update(&mut self, _ctx: &mut EventContext<'_>) -> bool {
        true
    }
}
