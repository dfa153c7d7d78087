//! RON map content loader

use crate::error::{Error, Result};
use crate::schema::{event::EventKindDef, EventDef, SpriteDef};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use vignette_core::{
    AnimateAction, BranchEvent, ChangeDirectionAction, CommandEvent, DialogueEvent, EventId,
    EventSupervisor, LookAtAction, MapEvent, MapState, PathMoveAction, Position,
    RandomMoveAction, SceneCommand, SceneConfig, ScriptBridge, ScriptedEvent,
    ScriptedSpriteAction, SpriteId,
};

/// Shape of one map file; every section is optional
#[derive(Deserialize)]
struct MapFile {
    #[serde(default)]
    config: Option<SceneConfig>,
    #[serde(default)]
    sprites: Vec<SpriteDef>,
    #[serde(default)]
    events: Vec<EventDef>,
}

/// Loaded map definitions, in file order
#[derive(Debug, Default)]
pub struct MapDefs {
    /// Scene configuration, if a file provided one
    pub config: Option<SceneConfig>,
    /// Sprite placements
    pub sprites: Vec<SpriteDef>,
    /// Event definitions
    pub events: Vec<EventDef>,
}

impl MapDefs {
    /// Create empty map definitions
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an event definition
    pub fn get_event(&self, id: &str) -> Option<&EventDef> {
        self.events.iter().find(|e| e.id.as_str() == id)
    }

    /// Get a sprite definition
    pub fn get_sprite(&self, id: SpriteId) -> Option<&SpriteDef> {
        self.sprites.iter().find(|s| s.id == id)
    }

    /// The configuration to run the scene with
    pub fn scene_config(&self) -> SceneConfig {
        self.config.clone().unwrap_or_default()
    }

    /// Lint the content without running it
    ///
    /// Reports links and branches pointing at unknown events, and events
    /// referring to unknown sprites. None of these stop the scene; the
    /// scheduler skips them at runtime.
    pub fn validate(&self) -> Vec<Error> {
        let events: HashSet<&EventId> = self.events.iter().map(|e| &e.id).collect();
        let sprites: HashSet<SpriteId> = self.sprites.iter().map(|s| s.id).collect();
        let mut problems = Vec::new();

        for event in &self.events {
            let children = event
                .links
                .iter()
                .map(|link| &link.child)
                .chain(event.kind.started_events());
            for child in children {
                if !events.contains(child) {
                    problems.push(Error::Core(vignette_core::Error::DanglingLink {
                        parent: event.id.clone(),
                        child: child.clone(),
                    }));
                }
            }
            for sprite in event.kind.sprites() {
                if !sprites.contains(&sprite) {
                    problems.push(Error::UnknownSprite {
                        event: event.id.clone(),
                        sprite,
                    });
                }
            }
        }
        problems
    }

    /// Add the sprites to `map` and register the events with `supervisor`
    ///
    /// Script functions are resolved and event ids checked against the
    /// supervisor first, so a missing script or an id it already holds
    /// leaves both untouched. Returns the number of events registered.
    pub fn instantiate(
        &self,
        supervisor: &mut EventSupervisor,
        map: &mut MapState,
        scripts: &dyn ScriptBridge,
    ) -> Result<usize> {
        for problem in self.validate() {
            warn!(target: "content", "{}", problem);
        }

        let events = self
            .events
            .iter()
            .map(|def| build_event(def, scripts))
            .collect::<Result<Vec<_>>>()?;
        let taken = events
            .iter()
            .find(|event| supervisor.get_event(event.id().as_str()).is_some());
        if let Some(taken) = taken {
            return Err(vignette_core::Error::DuplicateEvent(taken.id().clone()).into());
        }

        for def in &self.sprites {
            map.add_sprite(def.to_sprite());
        }
        let count = events.len();
        for event in events {
            supervisor.register(event)?;
        }
        debug!(target: "content", sprites = self.sprites.len(), events = count, "Map content instantiated");
        Ok(count)
    }

    /// Build a fresh supervisor and map state for this content
    pub fn build_scene(&self, scripts: &dyn ScriptBridge) -> Result<(EventSupervisor, MapState)> {
        let config = self.scene_config();
        let mut supervisor = EventSupervisor::with_config(&config);
        let mut map = MapState::with_config(config);
        self.instantiate(&mut supervisor, &mut map, scripts)?;
        Ok((supervisor, map))
    }
}

fn resolve<T>(
    event: &EventId,
    name: Option<&String>,
    lookup: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>> {
    name.map(|name| {
        lookup(name).ok_or_else(|| Error::MissingScript {
            event: event.clone(),
            name: name.clone(),
        })
    })
    .transpose()
}

fn build_event(def: &EventDef, scripts: &dyn ScriptBridge) -> Result<MapEvent> {
    let id = def.id.clone();
    let mut event = match &def.kind {
        EventKindDef::Script { start, update } => {
            let start = resolve(&id, start.as_ref(), |n| scripts.start_fn(n))?;
            let update = resolve(&id, update.as_ref(), |n| scripts.update_fn(n))?;
            MapEvent::new(id, ScriptedEvent::from_parts(start, update))
        }
        EventKindDef::Branch {
            condition,
            on_true,
            on_false,
        } => {
            let condition = resolve(&id, Some(condition), |n| scripts.condition_fn(n))?
                .ok_or_else(|| Error::InvalidSchema(format!("Branch {id} has no condition")))?;
            let mut branch = BranchEvent::from_boxed(condition);
            if let Some(next) = on_true {
                branch = branch.on_true(next);
            }
            if let Some(next) = on_false {
                branch = branch.on_false(next);
            }
            MapEvent::new(id, branch)
        }
        EventKindDef::Dialogue { dialogue } => MapEvent::new(id, DialogueEvent::new(dialogue.clone())),
        EventKindDef::MapTransition { map, entrance } => MapEvent::new(
            id,
            CommandEvent::new(SceneCommand::ChangeMap {
                map: map.clone(),
                entrance: entrance.clone(),
            }),
        ),
        EventKindDef::Shop { shop } => {
            MapEvent::new(id, CommandEvent::new(SceneCommand::open_shop(shop.clone())))
        }
        EventKindDef::Battle {
            enemies,
            music,
            background,
        } => MapEvent::new(
            id,
            CommandEvent::new(SceneCommand::StartBattle {
                enemies: enemies.clone(),
                music: music.clone(),
                background: background.clone(),
            }),
        ),
        EventKindDef::Sound { sound } => {
            MapEvent::new(id, CommandEvent::new(SceneCommand::play_sound(sound.clone())))
        }
        EventKindDef::PathMove {
            sprite,
            destination,
            run,
        } => {
            let mut action = PathMoveAction::to_point(Position::from(*destination));
            if *run {
                action = action.running();
            }
            MapEvent::sprite(id, *sprite, action)
        }
        EventKindDef::PathMoveToSprite { sprite, target, run } => {
            let mut action = PathMoveAction::to_sprite(*target);
            if *run {
                action = action.running();
            }
            MapEvent::sprite(id, *sprite, action)
        }
        EventKindDef::RandomMove {
            sprite,
            duration,
            direction_change,
        } => {
            let mut action = RandomMoveAction::new(*duration);
            if let Some(ms) = direction_change {
                action = action.with_direction_change(*ms);
            }
            MapEvent::sprite(id, *sprite, action)
        }
        EventKindDef::Animate {
            sprite,
            animation,
            duration,
        } => MapEvent::sprite(id, *sprite, AnimateAction::new(animation.clone(), *duration)),
        EventKindDef::ChangeDirection { sprite, direction } => {
            MapEvent::sprite(id, *sprite, ChangeDirectionAction(*direction))
        }
        EventKindDef::LookAtPoint { sprite, point } => {
            MapEvent::sprite(id, *sprite, LookAtAction::point(Position::from(*point)))
        }
        EventKindDef::LookAtSprite { sprite, target } => {
            MapEvent::sprite(id, *sprite, LookAtAction::sprite(*target))
        }
        EventKindDef::ScriptedSprite {
            sprite,
            start,
            update,
        } => {
            let start = resolve(&id, start.as_ref(), |n| scripts.sprite_start_fn(n))?;
            let update = resolve(&id, update.as_ref(), |n| scripts.sprite_update_fn(n))?;
            MapEvent::sprite(id, *sprite, ScriptedSpriteAction::from_parts(start, update))
        }
    };

    for link in &def.links {
        event.add_link(link.into());
    }
    Ok(event)
}

/// Loader for RON map files
pub struct Loader {
    defs: MapDefs,
    event_ids: HashSet<EventId>,
}

impl Loader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            defs: MapDefs::new(),
            event_ids: HashSet::new(),
        }
    }

    /// Load map content from a RON string
    pub fn load_str(&mut self, content: &str) -> Result<()> {
        let file: MapFile = ron::from_str(content)?;

        if let Some(config) = file.config {
            if self.defs.config.is_some() {
                return Err(Error::DuplicateDefinition("config".to_string()));
            }
            self.defs.config = Some(config);
        }
        for sprite in file.sprites {
            if self.defs.get_sprite(sprite.id).is_some() {
                return Err(Error::DuplicateSprite(sprite.id));
            }
            self.defs.sprites.push(sprite);
        }
        for event in file.events {
            if event.id.is_empty() {
                return Err(Error::InvalidSchema("Event id must not be empty".to_string()));
            }
            if !self.event_ids.insert(event.id.clone()) {
                return Err(Error::DuplicateDefinition(event.id.to_string()));
            }
            self.defs.events.push(event);
        }
        Ok(())
    }

    /// Load a single RON file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        debug!(target: "content", path = %path.display(), "Loading map file");
        self.load_str(&content)
    }

    /// Load all RON files from a directory, recursively, in name order
    pub fn load_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {:?}", path),
            )));
        }

        let mut entries = fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        for file_path in entries {
            if file_path.extension().is_some_and(|e| e == "ron") {
                self.load_file(&file_path)?;
            } else if file_path.is_dir() {
                self.load_directory(&file_path)?;
            }
        }

        Ok(())
    }

    /// Finish loading and return the map definitions
    pub fn finish(self) -> MapDefs {
        self.defs
    }

    /// Get the current definitions (for inspection during loading)
    pub fn defs(&self) -> &MapDefs {
        &self.defs
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
