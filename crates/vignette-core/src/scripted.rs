//! Events driven by script callables
//!
//! The script layer is consumed as plain callables. Each one receives the
//! [`EventContext`], so a script can call back into the supervisor; those
//! calls are subject to the same phase checks as any other.

use crate::{EventBehavior, EventContext, EventId, SpriteAction, SpriteId};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

/// Called when a scripted event starts
pub type ScriptStart = Box<dyn FnMut(&mut EventContext<'_>)>;
/// Called every tick; returns true when finished
pub type ScriptUpdate = Box<dyn FnMut(&mut EventContext<'_>) -> bool>;
/// Evaluated by a branch event
pub type ScriptCondition = Box<dyn FnMut(&mut EventContext<'_>) -> bool>;
/// Called when a scripted sprite action starts
pub type SpriteScriptStart = Box<dyn FnMut(SpriteId, &mut EventContext<'_>)>;
/// Called every tick for a scripted sprite action
pub type SpriteScriptUpdate = Box<dyn FnMut(SpriteId, &mut EventContext<'_>) -> bool>;

/// An event whose start and update are script callables
///
/// Without an update callable the event finishes on its first update.
#[derive(Default)]
pub struct ScriptedEvent {
    start: Option<ScriptStart>,
    update: Option<ScriptUpdate>,
}

impl ScriptedEvent {
    /// An event that does nothing and finishes on its first update
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already boxed callables
    pub fn from_parts(start: Option<ScriptStart>, update: Option<ScriptUpdate>) -> Self {
        Self { start, update }
    }

    /// Set the start callable
    pub fn on_start(mut self, start: impl FnMut(&mut EventContext<'_>) + 'static) -> Self {
        self.start = Some(Box::new(start));
        self
    }

    /// Set the update callable
    pub fn on_update(mut self, update: impl FnMut(&mut EventContext<'_>) -> bool + 'static) -> Self {
        self.update = Some(Box::new(update));
        self
    }
}

impl EventBehavior for ScriptedEvent {
    fn start(&mut self, ctx: &mut EventContext<'_>) {
        if let Some(start) = self.start.as_mut() {
            start(ctx);
        }
    }

    fn update(&mut self, ctx: &mut EventContext<'_>) -> bool {
        match self.update.as_mut() {
            Some(update) => update(ctx),
            None => true,
        }
    }
}

/// Starts one of two events depending on a condition
///
/// The condition is evaluated when the branch starts. Either side may be
/// empty. The branch itself finishes on its first update.
pub struct BranchEvent {
    condition: ScriptCondition,
    on_true: Option<EventId>,
    on_false: Option<EventId>,
}

impl BranchEvent {
    /// Create a branch on `condition`
    pub fn new(condition: impl FnMut(&mut EventContext<'_>) -> bool + 'static) -> Self {
        Self::from_boxed(Box::new(condition))
    }

    /// Create a branch on an already boxed condition
    pub fn from_boxed(condition: ScriptCondition) -> Self {
        Self {
            condition,
            on_true: None,
            on_false: None,
        }
    }

    /// Event to start when the condition holds
    pub fn on_true(mut self, event: impl Into<EventId>) -> Self {
        self.on_true = Some(event.into());
        self
    }

    /// Event to start when the condition fails
    pub fn on_false(mut self, event: impl Into<EventId>) -> Self {
        self.on_false = Some(event.into());
        self
    }
}

impl EventBehavior for BranchEvent {
    fn start(&mut self, ctx: &mut EventContext<'_>) {
        let taken = (self.condition)(ctx);
        let next = if taken { &self.on_true } else { &self.on_false };
        debug!(target: "events", event = %ctx.event_id(), taken, "Branch evaluated");
        if let Some(next) = next.clone() {
            ctx.start_event(next);
        }
    }

    fn update(&mut self, _ctx: &mut EventContext<'_>) -> bool {
        true
    }
}

/// A sprite action whose start and update are script callables
///
/// Finishes on its first update when no update callable is given.
#[derive(Default)]
pub struct ScriptedSpriteAction {
    start: Option<SpriteScriptStart>,
    update: Option<SpriteScriptUpdate>,
}

impl ScriptedSpriteAction {
    /// An action that does nothing and finishes on its first update
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already boxed callables
    pub fn from_parts(start: Option<SpriteScriptStart>, update: Option<SpriteScriptUpdate>) -> Self {
        Self { start, update }
    }

    /// Set the start callable
    pub fn on_start(mut self, start: impl FnMut(SpriteId, &mut EventContext<'_>) + 'static) -> Self {
        self.start = Some(Box::new(start));
        self
    }

    /// Set the update callable
    pub fn on_update(
        mut self,
        update: impl FnMut(SpriteId, &mut EventContext<'_>) -> bool + 'static,
    ) -> Self {
        self.update = Some(Box::new(update));
        self
    }
}

impl SpriteAction for ScriptedSpriteAction {
    fn start(&mut self, sprite: SpriteId, ctx: &mut EventContext<'_>) {
        if let Some(start) = self.start.as_mut() {
            start(sprite, ctx);
        }
    }

    fn update(&mut self, sprite: SpriteId, ctx: &mut EventContext<'_>) -> bool {
        match self.update.as_mut() {
            Some(update) => update(sprite, ctx),
            None => true,
        }
    }
}

/// Resolves script functions by name
///
/// Each lookup hands out a fresh callable, so several events may share one
/// named function.
pub trait ScriptBridge {
    fn start_fn(&self, name: &str) -> Option<ScriptStart>;
    fn update_fn(&self, name: &str) -> Option<ScriptUpdate>;
    fn condition_fn(&self, name: &str) -> Option<ScriptCondition>;
    fn sprite_start_fn(&self, name: &str) -> Option<SpriteScriptStart>;
    fn sprite_update_fn(&self, name: &str) -> Option<SpriteScriptUpdate>;
}

type SharedStart = Rc<dyn Fn(&mut EventContext<'_>)>;
type SharedUpdate = Rc<dyn Fn(&mut EventContext<'_>) -> bool>;
type SharedSpriteStart = Rc<dyn Fn(SpriteId, &mut EventContext<'_>)>;
type SharedSpriteUpdate = Rc<dyn Fn(SpriteId, &mut EventContext<'_>) -> bool>;

/// In-memory script functions registered from Rust
#[derive(Default)]
pub struct ScriptTable {
    starts: HashMap<String, SharedStart>,
    updates: HashMap<String, SharedUpdate>,
    conditions: HashMap<String, SharedUpdate>,
    sprite_starts: HashMap<String, SharedSpriteStart>,
    sprite_updates: HashMap<String, SharedSpriteUpdate>,
}

impl ScriptTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a start function
    pub fn with_start(mut self, name: impl Into<String>, f: impl Fn(&mut EventContext<'_>) + 'static) -> Self {
        self.starts.insert(name.into(), Rc::new(f));
        self
    }

    /// Register an update function
    pub fn with_update(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&mut EventContext<'_>) -> bool + 'static,
    ) -> Self {
        self.updates.insert(name.into(), Rc::new(f));
        self
    }

    /// Register a condition
    pub fn with_condition(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&mut EventContext<'_>) -> bool + 'static,
    ) -> Self {
        self.conditions.insert(name.into(), Rc::new(f));
        self
    }

    /// Register a sprite start function
    pub fn with_sprite_start(
        mut self,
        name: impl Into<String>,
        f: impl Fn(SpriteId, &mut EventContext<'_>) + 'static,
    ) -> Self {
        self.sprite_starts.insert(name.into(), Rc::new(f));
        self
    }

    /// Register a sprite update function
    pub fn with_sprite_update(
        mut self,
        name: impl Into<String>,
        f: impl Fn(SpriteId, &mut EventContext<'_>) -> bool + 'static,
    ) -> Self {
        self.sprite_updates.insert(name.into(), Rc::new(f));
        self
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.starts.len()
            + self.updates.len()
            + self.conditions.len()
            + self.sprite_starts.len()
            + self.sprite_updates.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScriptBridge for ScriptTable {
    fn start_fn(&self, name: &str) -> Option<ScriptStart> {
        let f = Rc::clone(self.starts.get(name)?);
        Some(Box::new(move |ctx: &mut EventContext<'_>| f(ctx)))
    }

    fn update_fn(&self, name: &str) -> Option<ScriptUpdate> {
        let f = Rc::clone(self.updates.get(name)?);
        Some(Box::new(move |ctx: &mut EventContext<'_>| f(ctx)))
    }

    fn condition_fn(&self, name: &str) -> Option<ScriptCondition> {
        let f = Rc::clone(self.conditions.get(name)?);
        Some(Box::new(move |ctx: &mut EventContext<'_>| f(ctx)))
    }

    fn sprite_start_fn(&self, name: &str) -> Option<SpriteScriptStart> {
        let f = Rc::clone(self.sprite_starts.get(name)?);
        Some(Box::new(move |sprite, ctx: &mut EventContext<'_>| f(sprite, ctx)))
    }

    fn sprite_update_fn(&self, name: &str) -> Option<SpriteScriptUpdate> {
        let f = Rc::clone(self.sprite_updates.get(name)?);
        Some(Box::new(move |sprite, ctx: &mut EventContext<'_>| f(sprite, ctx)))
    }
}
