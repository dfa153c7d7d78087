//! Map events and the links between them
//!
//! A [`MapEvent`] pairs an id and its outgoing [`EventLink`]s with an
//! [`EventBehavior`] that does the actual work. The supervisor owns every
//! registered event and only ever calls the three lifecycle methods.

use crate::{EventId, EventSupervisor, MapState, SpriteAction, SpriteEvent, SpriteId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which transition of the parent fires a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Anchor {
    /// When the parent starts
    Start,
    /// When the parent finishes (or is ended with link triggering)
    Finish,
}

/// A declared parent -> child dependency
///
/// The child is referenced by id only; it does not need to exist when the
/// link is declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLink {
    /// Event to launch
    pub child: EventId,
    /// Parent transition the link is anchored to
    pub anchor: Anchor,
    /// Milliseconds to wait before starting the child (0 = immediately)
    #[serde(default)]
    pub delay_ms: u32,
}

impl EventLink {
    /// Create a new link
    pub fn new(child: impl Into<EventId>, anchor: Anchor, delay_ms: u32) -> Self {
        Self {
            child: child.into(),
            anchor,
            delay_ms,
        }
    }

    /// Whether the link fires when the parent starts
    pub fn launch_at_start(&self) -> bool {
        self.anchor == Anchor::Start
    }
}

/// Capability of an event, resolved once at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Ordinary event
    Plain,
    /// Takes exclusive control of a sprite while it runs
    Sprite(SpriteId),
}

/// The work an event performs
pub trait EventBehavior {
    /// Called once per activation
    fn start(&mut self, ctx: &mut EventContext<'_>);

    /// Called once per tick while active. Returns true on the tick the
    /// work is complete.
    fn update(&mut self, ctx: &mut EventContext<'_>) -> bool;

    /// Called when the supervisor ends the event before it completed
    fn terminate(&mut self, _ctx: &mut EventContext<'_>) {}

    /// The sprite this behaviour takes control of, if any
    fn controlled_sprite(&self) -> Option<SpriteId> {
        None
    }
}

/// A schedulable unit of work
pub struct MapEvent {
    id: EventId,
    kind: EventKind,
    links: Vec<EventLink>,
    /// Lent out while one of its lifecycle methods runs
    pub(crate) behavior: Option<Box<dyn EventBehavior>>,
}

impl MapEvent {
    /// Create an event from a behaviour
    pub fn new(id: impl Into<EventId>, behavior: impl EventBehavior + 'static) -> Self {
        Self::from_boxed(id, Box::new(behavior))
    }

    /// Create an event from a boxed behaviour
    pub fn from_boxed(id: impl Into<EventId>, behavior: Box<dyn EventBehavior>) -> Self {
        let kind = match behavior.controlled_sprite() {
            Some(sprite) => EventKind::Sprite(sprite),
            None => EventKind::Plain,
        };
        Self {
            id: id.into(),
            kind,
            links: Vec::new(),
            behavior: Some(behavior),
        }
    }

    /// Create a sprite event: `action` runs while the event controls `sprite`
    pub fn sprite(
        id: impl Into<EventId>,
        sprite: SpriteId,
        action: impl SpriteAction + 'static,
    ) -> Self {
        Self::new(id, SpriteEvent::new(sprite, action))
    }

    /// Launch `child` when this event starts, after `delay_ms`
    pub fn launch_at_start(mut self, child: impl Into<EventId>, delay_ms: u32) -> Self {
        self.links.push(EventLink::new(child, Anchor::Start, delay_ms));
        self
    }

    /// Launch `child` when this event finishes, after `delay_ms`
    pub fn launch_at_finish(mut self, child: impl Into<EventId>, delay_ms: u32) -> Self {
        self.links.push(EventLink::new(child, Anchor::Finish, delay_ms));
        self
    }

    /// Add a link
    pub fn add_link(&mut self, link: EventLink) {
        self.links.push(link);
    }

    /// The event's id
    pub fn id(&self) -> &EventId {
        &self.id
    }

    /// The event's capability
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Declared links, in declaration order
    pub fn links(&self) -> &[EventLink] {
        &self.links
    }

    /// Whether this is a sprite event
    pub fn is_sprite_event(&self) -> bool {
        matches!(self.kind, EventKind::Sprite(_))
    }

    /// The sprite a sprite event targets
    pub fn target_sprite(&self) -> Option<SpriteId> {
        match self.kind {
            EventKind::Sprite(sprite) => Some(sprite),
            EventKind::Plain => None,
        }
    }
}

impl fmt::Debug for MapEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapEvent")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("links", &self.links)
            .finish()
    }
}

/// What an event sees while one of its lifecycle methods runs
///
/// Calls made through `supervisor` are real scheduler calls: while the
/// active list is being updated, mutating ones are rejected.
pub struct EventContext<'a> {
    /// The scheduler driving this event
    pub supervisor: &'a mut EventSupervisor,
    /// The map the event acts on
    pub map: &'a mut MapState,
    event: &'a EventId,
}

impl<'a> EventContext<'a> {
    pub(crate) fn new(
        supervisor: &'a mut EventSupervisor,
        map: &'a mut MapState,
        event: &'a EventId,
    ) -> Self {
        Self {
            supervisor,
            map,
            event,
        }
    }

    /// Id of the event being driven
    pub fn event_id(&self) -> &'a EventId {
        self.event
    }

    /// Milliseconds elapsed during the current tick
    pub fn elapsed_ms(&self) -> u32 {
        self.map.clock.delta()
    }

    /// Start another event now
    pub fn start_event(&mut self, id: impl Into<EventId>) -> bool {
        self.supervisor.start_event(self.map, id)
    }

    /// Start another event after `delay_ms`
    pub fn start_event_delayed(&mut self, id: impl Into<EventId>, delay_ms: u32) -> bool {
        self.supervisor.start_event_delayed(self.map, id, delay_ms)
    }

    /// End another event
    pub fn end_event(&mut self, id: impl Into<EventId>, trigger_links: bool) -> bool {
        self.supervisor.end_event(self.map, id, trigger_links)
    }

    /// Pause another event
    pub fn pause_event(&mut self, id: impl Into<EventId>) -> bool {
        self.supervisor.pause_event(id)
    }

    /// Resume another event
    pub fn resume_event(&mut self, id: impl Into<EventId>) -> bool {
        self.supervisor.resume_event(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Idle;

    impl EventBehavior for Idle {
        fn start(&mut self, _ctx: &mut EventContext<'_>) {}
        fn update(&mut self, _ctx: &mut EventContext<'_>) -> bool {
            false
        }
    }

    #[test]
    fn test_links_keep_declaration_order() {
        let event = MapEvent::new("npc_greet", Idle)
            .launch_at_finish("open_door", 0)
            .launch_at_start("music", 250);

        let links = event.links();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].child, EventId::from("open_door"));
        assert!(!links[0].launch_at_start());
        assert_eq!(links[1].delay_ms, 250);
        assert!(links[1].launch_at_start());
    }

    #[test]
    fn test_plain_event_kind() {
        let event = MapEvent::new("fade_warning", Idle);
        assert_eq!(event.kind(), EventKind::Plain);
        assert!(!event.is_sprite_event());
        assert_eq!(event.target_sprite(), None);
    }

    #[test]
    fn test_link_from_ron() {
        let link: EventLink = ron::from_str("(child: \"open_door\", anchor: Finish)").unwrap();
        assert_eq!(link, EventLink::new("open_door", Anchor::Finish, 0));
    }
}
