//! The event supervisor: activation, timing, pausing and chaining
//!
//! Each call to [`EventSupervisor::update`] runs one tick in a fixed order:
//!
//! 1. count down delayed events and collect the ones that expired
//! 2. start the collected events
//! 3. update every active event once (mutations of the active list are
//!    rejected during this pass)
//! 4. examine the finish links of events that completed in step 3
//!
//! Malformed calls never abort the scene. They are logged, recorded in the
//! diagnostics buffer and ignored.

use crate::{
    event::EventContext, Anchor, Error, EventId, MapEvent, MapState, Result, SceneConfig,
    SpriteId,
};
use indexmap::IndexMap;
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

/// Where the supervisor is within a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Outside of `update`
    #[default]
    Idle,
    /// Counting down and starting delayed events
    Draining,
    /// Updating the active list; mutations are rejected
    Ticking,
    /// Examining finish links of completed events
    Linking,
}

/// An event waiting for its countdown before it starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayedEvent {
    /// Event to start
    pub event: EventId,
    /// Milliseconds left; the event starts once this reaches zero
    pub remaining_ms: i64,
}

impl DelayedEvent {
    fn new(event: EventId, delay_ms: u32) -> Self {
        Self {
            event,
            remaining_ms: i64::from(delay_ms),
        }
    }
}

/// Owns every map event and drives them tick by tick
#[derive(Debug)]
pub struct EventSupervisor {
    /// All registered events by id
    events: IndexMap<EventId, MapEvent>,
    /// Events receiving updates
    active: Vec<EventId>,
    /// Started events excluded from updates
    paused: Vec<EventId>,
    /// Countdowns that are running
    delayed_active: Vec<DelayedEvent>,
    /// Countdowns that are frozen
    delayed_paused: Vec<DelayedEvent>,
    phase: Phase,
    diagnostics: VecDeque<Error>,
    diagnostics_capacity: usize,
}

impl EventSupervisor {
    /// Create an empty supervisor
    pub fn new() -> Self {
        Self::with_config(&SceneConfig::default())
    }

    /// Create an empty supervisor using the scene configuration
    pub fn with_config(config: &SceneConfig) -> Self {
        Self {
            events: IndexMap::new(),
            active: Vec::new(),
            paused: Vec::new(),
            delayed_active: Vec::new(),
            delayed_paused: Vec::new(),
            phase: Phase::Idle,
            diagnostics: VecDeque::new(),
            diagnostics_capacity: config.diagnostics_capacity(),
        }
    }

    /// Register an event
    ///
    /// The first event registered under an id wins; a later one with the
    /// same id is dropped and reported.
    pub fn register(&mut self, event: MapEvent) -> Result<()> {
        if event.id().is_empty() {
            self.report(Error::EmptyEventId);
            return Err(Error::EmptyEventId);
        }
        if self.events.contains_key(event.id()) {
            let err = Error::DuplicateEvent(event.id().clone());
            self.report(err.clone());
            return Err(err);
        }
        debug!(target: "events", event = %event.id(), "Registered event");
        self.events.insert(event.id().clone(), event);
        Ok(())
    }

    /// Start an event now
    ///
    /// Rejected if the id is unknown, the event is already active, or the
    /// active list is being updated.
    pub fn start_event(&mut self, map: &mut MapState, id: impl Into<EventId>) -> bool {
        let id = id.into();
        if !self.events.contains_key(&id) {
            self.report(Error::EventNotFound(id));
            return false;
        }
        if self.phase == Phase::Ticking {
            self.report(Error::Reentrant {
                operation: "start",
                target: id.to_string(),
            });
            return false;
        }
        if self.active.contains(&id) {
            self.report(Error::AlreadyActive(id));
            return false;
        }

        self.paused.retain(|e| e != &id);
        self.active.push(id.clone());
        debug!(target: "events", event = %id, "Starting event");
        self.run_start(map, &id);
        self.examine_links(map, &id, Anchor::Start);
        true
    }

    /// Start an event after `delay_ms`
    ///
    /// A zero delay starts it now. Otherwise the event waits in the delayed
    /// list; queueing does not touch the active list and is accepted at any
    /// point of the tick.
    pub fn start_event_delayed(
        &mut self,
        map: &mut MapState,
        id: impl Into<EventId>,
        delay_ms: u32,
    ) -> bool {
        let id = id.into();
        if delay_ms == 0 {
            return self.start_event(map, id);
        }
        if !self.events.contains_key(&id) {
            self.report(Error::EventNotFound(id));
            return false;
        }
        // A countdown joins a frozen one for the same event
        let frozen = self.delayed_paused.iter().any(|d| d.event == id);
        debug!(target: "events", event = %id, delay_ms, frozen, "Delaying event");
        let entry = DelayedEvent::new(id, delay_ms);
        if frozen {
            self.delayed_paused.push(entry);
        } else {
            self.delayed_active.push(entry);
        }
        true
    }

    /// Exclude an event from updates
    ///
    /// Moves it from the active list to the paused list, and freezes any
    /// countdowns it has running. Returns whether anything moved.
    pub fn pause_event(&mut self, id: impl Into<EventId>) -> bool {
        let id = id.into();
        if !self.check_mutation("pause", &id) {
            return false;
        }
        let moved = Self::transfer(
            &mut self.active,
            &mut self.paused,
            &mut self.delayed_active,
            &mut self.delayed_paused,
            |e| e == &id,
        );
        if moved > 0 {
            debug!(target: "events", event = %id, "Paused event");
        }
        moved > 0
    }

    /// Undo `pause_event`
    ///
    /// Frozen countdowns resume with the time they had left.
    pub fn resume_event(&mut self, id: impl Into<EventId>) -> bool {
        let id = id.into();
        if !self.check_mutation("resume", &id) {
            return false;
        }
        let moved = Self::transfer(
            &mut self.paused,
            &mut self.active,
            &mut self.delayed_paused,
            &mut self.delayed_active,
            |e| e == &id,
        );
        if moved > 0 {
            debug!(target: "events", event = %id, "Resumed event");
        }
        moved > 0
    }

    /// Pause every sprite event targeting `sprite`
    ///
    /// Returns the number of entries paused.
    pub fn pause_all_events(&mut self, sprite: SpriteId) -> usize {
        if !self.check_bulk_mutation("pause events of", sprite) {
            return 0;
        }
        let targeting = self.targeting(sprite);
        let moved = Self::transfer(
            &mut self.active,
            &mut self.paused,
            &mut self.delayed_active,
            &mut self.delayed_paused,
            |e| targeting.contains(e),
        );
        debug!(target: "events", %sprite, moved, "Paused sprite events");
        moved
    }

    /// Resume every sprite event targeting `sprite`
    pub fn resume_all_events(&mut self, sprite: SpriteId) -> usize {
        if !self.check_bulk_mutation("resume events of", sprite) {
            return 0;
        }
        let targeting = self.targeting(sprite);
        let moved = Self::transfer(
            &mut self.paused,
            &mut self.active,
            &mut self.delayed_paused,
            &mut self.delayed_active,
            |e| targeting.contains(e),
        );
        debug!(target: "events", %sprite, moved, "Resumed sprite events");
        moved
    }

    /// End an event before it completes
    ///
    /// Removes it from whichever list holds it, countdowns included. A
    /// started event gets its `terminate` call. With `trigger_links` the
    /// finish links then fire as if it had completed, even when it was only
    /// waiting on a countdown. Returns whether anything was removed.
    pub fn end_event(
        &mut self,
        map: &mut MapState,
        id: impl Into<EventId>,
        trigger_links: bool,
    ) -> bool {
        let id = id.into();
        if !self.check_mutation("end", &id) {
            return false;
        }

        let (started, removed) = self.remove_everywhere(&id);
        if !started && removed == 0 {
            trace!(target: "events", event = %id, "End requested for an idle event");
            return false;
        }

        debug!(target: "events", event = %id, trigger_links, "Ending event");
        if started {
            self.run_terminate(map, &id);
        }
        if trigger_links {
            self.examine_links(map, &id, Anchor::Finish);
        }
        true
    }

    /// End every sprite event targeting `sprite`, without triggering links
    ///
    /// Frees the sprite so a new chain can take it over. Returns the number
    /// of events ended.
    pub fn end_all_events(&mut self, map: &mut MapState, sprite: SpriteId) -> usize {
        if !self.check_bulk_mutation("end events of", sprite) {
            return 0;
        }

        let mut ended = 0;
        for id in self.targeting(sprite) {
            let (started, removed) = self.remove_everywhere(&id);
            if started {
                self.run_terminate(map, &id);
            }
            if started || removed > 0 {
                ended += 1;
            }
        }
        debug!(target: "events", %sprite, ended, "Ended sprite events");
        ended
    }

    /// Run one tick
    pub fn update(&mut self, map: &mut MapState, elapsed_ms: u32) {
        if self.phase != Phase::Idle {
            self.report(Error::NestedUpdate);
            return;
        }
        map.clock.advance(elapsed_ms);

        self.phase = Phase::Draining;
        let elapsed = i64::from(elapsed_ms);
        let mut ready = Vec::new();
        self.delayed_active.retain_mut(|delayed| {
            delayed.remaining_ms -= elapsed;
            if delayed.remaining_ms <= 0 {
                ready.push(delayed.event.clone());
                false
            } else {
                true
            }
        });
        for id in ready {
            self.start_event(map, id);
        }

        self.phase = Phase::Ticking;
        let mut finished = Vec::new();
        for id in self.active.clone() {
            if !self.active.contains(&id) {
                continue;
            }
            if self.run_update(map, &id) {
                self.active.retain(|e| e != &id);
                debug!(target: "events", event = %id, "Event finished");
                finished.push(id);
            }
        }

        self.phase = Phase::Linking;
        for id in &finished {
            self.examine_links(map, id, Anchor::Finish);
        }
        self.phase = Phase::Idle;
        trace!(
            target: "events",
            tick = map.clock.tick,
            active = self.active.len(),
            delayed = self.delayed_active.len(),
            "Tick complete"
        );
    }

    /// Whether the event is receiving updates
    pub fn is_event_active(&self, id: &str) -> bool {
        self.active.iter().any(|e| e.as_str() == id)
    }

    /// Whether the event is paused
    pub fn is_event_paused(&self, id: &str) -> bool {
        self.paused.iter().any(|e| e.as_str() == id)
    }

    /// Whether the event is waiting on a countdown, running or frozen
    pub fn is_event_delayed(&self, id: &str) -> bool {
        self.delayed_active
            .iter()
            .chain(self.delayed_paused.iter())
            .any(|d| d.event.as_str() == id)
    }

    /// Look up a registered event
    pub fn get_event(&self, id: &str) -> Option<&MapEvent> {
        self.events.get(id)
    }

    /// Whether any event is active
    pub fn has_active_event(&self) -> bool {
        !self.active.is_empty()
    }

    /// Whether any countdown is running
    pub fn has_active_delayed_event(&self) -> bool {
        !self.delayed_active.is_empty()
    }

    /// Active events, in activation order
    pub fn active_events(&self) -> &[EventId] {
        &self.active
    }

    /// Paused events
    pub fn paused_events(&self) -> &[EventId] {
        &self.paused
    }

    /// Running countdowns
    pub fn delayed_events(&self) -> &[DelayedEvent] {
        &self.delayed_active
    }

    /// Frozen countdowns
    pub fn paused_delayed_events(&self) -> &[DelayedEvent] {
        &self.delayed_paused
    }

    /// Number of registered events
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Where the supervisor is within a tick
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Recent warnings, oldest first
    pub fn diagnostics(&self) -> impl Iterator<Item = &Error> {
        self.diagnostics.iter()
    }

    /// Drain recorded warnings
    pub fn take_diagnostics(&mut self) -> Vec<Error> {
        self.diagnostics.drain(..).collect()
    }

    /// Log a warning and keep it for inspection
    pub fn report(&mut self, error: Error) {
        warn!(target: "events", "{}", error);
        if self.diagnostics.len() >= self.diagnostics_capacity {
            self.diagnostics.pop_front();
        }
        self.diagnostics.push_back(error);
    }

    fn check_mutation(&mut self, operation: &'static str, id: &EventId) -> bool {
        if !self.events.contains_key(id) {
            self.report(Error::EventNotFound(id.clone()));
            return false;
        }
        if self.phase == Phase::Ticking {
            self.report(Error::Reentrant {
                operation,
                target: id.to_string(),
            });
            return false;
        }
        true
    }

    fn check_bulk_mutation(&mut self, operation: &'static str, sprite: SpriteId) -> bool {
        if self.phase == Phase::Ticking {
            self.report(Error::Reentrant {
                operation,
                target: sprite.to_string(),
            });
            return false;
        }
        true
    }

    /// Ids of the sprite events targeting `sprite`
    fn targeting(&self, sprite: SpriteId) -> Vec<EventId> {
        self.events
            .values()
            .filter(|e| e.target_sprite() == Some(sprite))
            .map(|e| e.id().clone())
            .collect()
    }

    /// Move matching entries between a list pair and a countdown pair
    fn transfer(
        from: &mut Vec<EventId>,
        to: &mut Vec<EventId>,
        delayed_from: &mut Vec<DelayedEvent>,
        delayed_to: &mut Vec<DelayedEvent>,
        matches: impl Fn(&EventId) -> bool,
    ) -> usize {
        let mut moved = 0;
        from.retain(|id| {
            if matches(id) {
                if !to.contains(id) {
                    to.push(id.clone());
                }
                moved += 1;
                false
            } else {
                true
            }
        });
        delayed_from.retain(|delayed| {
            if matches(&delayed.event) {
                delayed_to.push(delayed.clone());
                moved += 1;
                false
            } else {
                true
            }
        });
        moved
    }

    /// Drop `id` from all four lists
    ///
    /// Returns whether it had started (active or paused) and how many
    /// countdowns were dropped.
    fn remove_everywhere(&mut self, id: &EventId) -> (bool, usize) {
        let before = self.active.len() + self.paused.len();
        self.active.retain(|e| e != id);
        self.paused.retain(|e| e != id);
        let started = self.active.len() + self.paused.len() < before;

        let before = self.delayed_active.len() + self.delayed_paused.len();
        self.delayed_active.retain(|d| &d.event != id);
        self.delayed_paused.retain(|d| &d.event != id);
        let removed = before - self.delayed_active.len() - self.delayed_paused.len();
        (started, removed)
    }

    /// Start or queue the children linked to `anchor` of `parent`
    fn examine_links(&mut self, map: &mut MapState, parent: &EventId, anchor: Anchor) {
        let links: Vec<_> = match self.events.get(parent) {
            Some(event) => event
                .links()
                .iter()
                .filter(|link| link.anchor == anchor)
                .cloned()
                .collect(),
            None => return,
        };

        for link in links {
            if !self.events.contains_key(&link.child) {
                self.report(Error::DanglingLink {
                    parent: parent.clone(),
                    child: link.child,
                });
                continue;
            }
            if link.delay_ms == 0 {
                self.start_event(map, link.child);
            } else {
                debug!(
                    target: "events",
                    parent = %parent,
                    child = %link.child,
                    delay_ms = link.delay_ms,
                    "Delaying linked event"
                );
                self.delayed_active
                    .push(DelayedEvent::new(link.child, link.delay_ms));
            }
        }
    }

    fn run_start(&mut self, map: &mut MapState, id: &EventId) {
        self.with_behavior(map, id, |behavior, ctx| behavior.start(ctx));
    }

    fn run_update(&mut self, map: &mut MapState, id: &EventId) -> bool {
        self.with_behavior(map, id, |behavior, ctx| behavior.update(ctx))
            .unwrap_or(false)
    }

    fn run_terminate(&mut self, map: &mut MapState, id: &EventId) {
        self.with_behavior(map, id, |behavior, ctx| behavior.terminate(ctx));
    }

    /// Lend an event's behaviour out of the registry for one lifecycle call
    ///
    /// The behaviour can then reach the supervisor through its context.
    /// Returns `None` if the behaviour is already lent out further up the
    /// call stack.
    fn with_behavior<T>(
        &mut self,
        map: &mut MapState,
        id: &EventId,
        call: impl FnOnce(&mut dyn crate::EventBehavior, &mut EventContext<'_>) -> T,
    ) -> Option<T> {
        let Some(mut behavior) = self.events.get_mut(id).and_then(|e| e.behavior.take()) else {
            trace!(target: "events", event = %id, "Behaviour busy, skipping call");
            return None;
        };
        let result = {
            let mut ctx = EventContext::new(self, map, id);
            call(&mut *behavior, &mut ctx)
        };
        if let Some(event) = self.events.get_mut(id) {
            event.behavior = Some(behavior);
        }
        Some(result)
    }
}

impl Default for EventSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventBehavior, ScriptedEvent};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Journal = Rc<RefCell<Vec<String>>>;

    /// Records its lifecycle calls; finishes after `finish_after` updates
    struct Probe {
        name: &'static str,
        finish_after: Option<u32>,
        updates: u32,
        journal: Journal,
    }

    impl Probe {
        fn new(name: &'static str, finish_after: Option<u32>, journal: &Journal) -> MapEvent {
            MapEvent::new(
                name,
                Probe {
                    name,
                    finish_after,
                    updates: 0,
                    journal: Rc::clone(journal),
                },
            )
        }
    }

    impl EventBehavior for Probe {
        fn start(&mut self, _ctx: &mut EventContext<'_>) {
            self.updates = 0;
            self.journal.borrow_mut().push(format!("start:{}", self.name));
        }

        fn update(&mut self, _ctx: &mut EventContext<'_>) -> bool {
            self.updates += 1;
            self.journal.borrow_mut().push(format!("update:{}", self.name));
            self.finish_after.is_some_and(|n| self.updates >= n)
        }

        fn terminate(&mut self, _ctx: &mut EventContext<'_>) {
            self.journal.borrow_mut().push(format!("terminate:{}", self.name));
        }
    }

    fn count(journal: &Journal, entry: &str) -> usize {
        journal.borrow().iter().filter(|e| *e == entry).count()
    }

    fn setup() -> (EventSupervisor, MapState, Journal) {
        (EventSupervisor::new(), MapState::new(), Rc::new(RefCell::new(Vec::new())))
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor.register(Probe::new("a", None, &journal)).unwrap();

        let duplicate = MapEvent::new("a", ScriptedEvent::new());
        assert_eq!(
            supervisor.register(duplicate),
            Err(Error::DuplicateEvent(EventId::from("a")))
        );
        assert_eq!(supervisor.event_count(), 1);

        // The surviving event is the first one
        supervisor.start_event(&mut map, "a");
        assert_eq!(count(&journal, "start:a"), 1);
    }

    #[test]
    fn test_empty_id_rejected() {
        let (mut supervisor, _map, _journal) = setup();
        assert_eq!(
            supervisor.register(MapEvent::new("", ScriptedEvent::new())),
            Err(Error::EmptyEventId)
        );
        assert_eq!(supervisor.event_count(), 0);
    }

    #[test]
    fn test_start_event_activates_once() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor.register(Probe::new("a", None, &journal)).unwrap();

        assert!(supervisor.start_event(&mut map, "a"));
        assert!(!supervisor.start_event(&mut map, "a"));

        assert_eq!(supervisor.active_events().len(), 1);
        assert_eq!(count(&journal, "start:a"), 1);
        assert_eq!(
            supervisor.take_diagnostics(),
            vec![Error::AlreadyActive(EventId::from("a"))]
        );
    }

    #[test]
    fn test_start_unknown_event() {
        let (mut supervisor, mut map, _journal) = setup();
        assert!(!supervisor.start_event(&mut map, "ghost"));
        assert!(!supervisor.start_event_delayed(&mut map, "ghost", 100));
        assert!(!supervisor.has_active_event());
        assert!(!supervisor.has_active_delayed_event());
        assert_eq!(supervisor.diagnostics().count(), 2);
    }

    #[test]
    fn test_start_link_without_delay() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor
            .register(Probe::new("parent", None, &journal).launch_at_start("child", 0))
            .unwrap();
        supervisor.register(Probe::new("child", None, &journal)).unwrap();

        supervisor.start_event(&mut map, "parent");
        assert!(supervisor.is_event_active("child"));
        assert_eq!(*journal.borrow(), vec!["start:parent", "start:child"]);
    }

    #[test]
    fn test_start_link_with_delay() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor
            .register(Probe::new("parent", None, &journal).launch_at_start("child", 300))
            .unwrap();
        supervisor.register(Probe::new("child", None, &journal)).unwrap();

        supervisor.start_event(&mut map, "parent");
        assert!(!supervisor.is_event_active("child"));
        assert!(supervisor.is_event_delayed("child"));

        supervisor.update(&mut map, 100);
        assert!(!supervisor.is_event_active("child"), "100ms < 300ms");
        supervisor.update(&mut map, 100);
        assert!(!supervisor.is_event_active("child"), "200ms < 300ms");
        supervisor.update(&mut map, 100);
        assert!(supervisor.is_event_active("child"), "300ms reached");
        assert!(!supervisor.is_event_delayed("child"));
    }

    #[test]
    fn test_finish_link_scenario() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor.register(Probe::new("open_door", None, &journal)).unwrap();
        supervisor
            .register(Probe::new("npc_greet", Some(1), &journal).launch_at_finish("open_door", 0))
            .unwrap();

        supervisor.start_event(&mut map, "npc_greet");
        supervisor.update(&mut map, 16);

        assert!(!supervisor.is_event_active("npc_greet"));
        assert!(supervisor.is_event_active("open_door"));
    }

    #[test]
    fn test_delayed_start_scenario() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor.register(Probe::new("fade_warning", None, &journal)).unwrap();

        supervisor.start_event_delayed(&mut map, "fade_warning", 2000);
        assert_eq!(count(&journal, "start:fade_warning"), 0, "start must wait for the countdown");

        supervisor.update(&mut map, 1200);
        assert!(!supervisor.is_event_active("fade_warning"));

        supervisor.update(&mut map, 900);
        assert!(supervisor.is_event_active("fade_warning"));
        assert_eq!(count(&journal, "start:fade_warning"), 1);
    }

    #[test]
    fn test_pause_resume_round_trip() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor.register(Probe::new("a", None, &journal)).unwrap();
        supervisor.start_event(&mut map, "a");
        supervisor.start_event_delayed(&mut map, "a", 500);
        supervisor.update(&mut map, 200);

        assert!(supervisor.pause_event("a"));
        assert!(supervisor.is_event_paused("a"));
        assert!(!supervisor.is_event_active("a"));
        assert_eq!(supervisor.paused_delayed_events()[0].remaining_ms, 300);
        assert!(!supervisor.has_active_delayed_event());

        assert!(supervisor.resume_event("a"));
        assert!(supervisor.is_event_active("a"));
        assert!(!supervisor.is_event_paused("a"));
        assert_eq!(supervisor.delayed_events()[0].remaining_ms, 300);
    }

    #[test]
    fn test_paused_countdown_is_frozen() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor.register(Probe::new("a", None, &journal)).unwrap();
        supervisor.start_event_delayed(&mut map, "a", 100);

        supervisor.pause_event("a");
        supervisor.update(&mut map, 1000);
        assert!(!supervisor.is_event_active("a"));

        supervisor.resume_event("a");
        supervisor.update(&mut map, 100);
        assert!(supervisor.is_event_active("a"));
    }

    #[test]
    fn test_paused_event_is_not_updated() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor.register(Probe::new("a", None, &journal)).unwrap();
        supervisor.start_event(&mut map, "a");
        supervisor.pause_event("a");

        supervisor.update(&mut map, 16);
        assert_eq!(count(&journal, "update:a"), 0);
    }

    #[test]
    fn test_starting_paused_event_leaves_paused_list() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor.register(Probe::new("a", None, &journal)).unwrap();
        supervisor.start_event(&mut map, "a");
        supervisor.pause_event("a");

        assert!(supervisor.start_event(&mut map, "a"));
        assert!(supervisor.is_event_active("a"));
        assert!(!supervisor.is_event_paused("a"));
    }

    #[test]
    fn test_start_from_update_is_rejected() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor.register(Probe::new("x", None, &journal)).unwrap();
        supervisor
            .register(MapEvent::new(
                "caller",
                ScriptedEvent::new().on_update(|ctx| {
                    ctx.start_event("x");
                    false
                }),
            ))
            .unwrap();

        supervisor.start_event(&mut map, "caller");
        supervisor.update(&mut map, 16);

        assert!(!supervisor.is_event_active("x"));
        assert!(supervisor.diagnostics().any(|e| matches!(
            e,
            Error::Reentrant { operation: "start", target } if target == "x"
        )));

        // Outside the active pass the same call works
        assert!(supervisor.start_event(&mut map, "x"));
    }

    #[test]
    fn test_delayed_start_from_update_is_accepted() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor.register(Probe::new("x", None, &journal)).unwrap();
        supervisor
            .register(MapEvent::new(
                "caller",
                ScriptedEvent::new().on_update(|ctx| ctx.start_event_delayed("x", 50)),
            ))
            .unwrap();

        supervisor.start_event(&mut map, "caller");
        supervisor.update(&mut map, 16);
        assert!(supervisor.is_event_delayed("x"));

        supervisor.update(&mut map, 50);
        assert!(supervisor.is_event_active("x"));
    }

    #[test]
    fn test_pause_and_end_from_update_are_rejected() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor.register(Probe::new("victim", None, &journal)).unwrap();
        supervisor
            .register(MapEvent::new(
                "caller",
                ScriptedEvent::new().on_update(|ctx| {
                    ctx.pause_event("victim");
                    ctx.supervisor.resume_event("victim");
                    ctx.end_event("victim", true);
                    ctx.supervisor.pause_all_events(SpriteId::new(1));
                    ctx.supervisor.resume_all_events(SpriteId::new(1));
                    ctx.supervisor.end_all_events(ctx.map, SpriteId::new(1));
                    true
                }),
            ))
            .unwrap();

        supervisor.start_event(&mut map, "victim");
        supervisor.start_event(&mut map, "caller");
        supervisor.update(&mut map, 16);

        assert!(supervisor.is_event_active("victim"));
        let rejected = supervisor
            .diagnostics()
            .filter(|e| matches!(e, Error::Reentrant { .. }))
            .count();
        assert_eq!(rejected, 6);
    }

    #[test]
    fn test_nested_update_is_rejected() {
        let (mut supervisor, mut map, _journal) = setup();
        supervisor
            .register(MapEvent::new(
                "nested",
                ScriptedEvent::new().on_update(|ctx| {
                    ctx.supervisor.update(ctx.map, 16);
                    true
                }),
            ))
            .unwrap();

        supervisor.start_event(&mut map, "nested");
        supervisor.update(&mut map, 16);
        assert_eq!(map.clock.tick, 1);
        assert_eq!(supervisor.take_diagnostics(), vec![Error::NestedUpdate]);
        assert_eq!(supervisor.phase(), Phase::Idle);
    }

    #[test]
    fn test_active_events_updated_once_per_tick() {
        let (mut supervisor, mut map, journal) = setup();
        for name in ["a", "b", "c"] {
            supervisor.register(Probe::new(name, None, &journal)).unwrap();
            supervisor.start_event(&mut map, name);
        }

        supervisor.update(&mut map, 16);
        for name in ["a", "b", "c"] {
            assert_eq!(count(&journal, &format!("update:{name}")), 1);
        }
    }

    #[test]
    fn test_finish_children_start_after_the_pass() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor
            .register(Probe::new("first", Some(1), &journal).launch_at_finish("next", 0))
            .unwrap();
        supervisor.register(Probe::new("next", None, &journal)).unwrap();
        supervisor.register(Probe::new("bystander", None, &journal)).unwrap();

        supervisor.start_event(&mut map, "first");
        supervisor.start_event(&mut map, "bystander");
        supervisor.update(&mut map, 16);

        assert_eq!(
            *journal.borrow(),
            vec![
                "start:first",
                "start:bystander",
                "update:first",
                "update:bystander",
                "start:next",
            ],
            "the child starts only once every active event has been updated"
        );

        supervisor.update(&mut map, 16);
        assert_eq!(count(&journal, "update:next"), 1);
    }

    #[test]
    fn test_expired_events_join_the_same_tick() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor.register(Probe::new("running", None, &journal)).unwrap();
        supervisor.register(Probe::new("late", None, &journal)).unwrap();

        supervisor.start_event(&mut map, "running");
        supervisor.start_event_delayed(&mut map, "late", 10);
        supervisor.update(&mut map, 16);

        assert_eq!(
            *journal.borrow(),
            vec!["start:running", "start:late", "update:running", "update:late"]
        );
    }

    #[test]
    fn test_end_event_triggers_links() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor
            .register(Probe::new("cutscene", None, &journal).launch_at_finish("after", 0))
            .unwrap();
        supervisor.register(Probe::new("after", None, &journal)).unwrap();

        supervisor.start_event(&mut map, "cutscene");
        assert!(supervisor.end_event(&mut map, "cutscene", true));

        assert!(!supervisor.is_event_active("cutscene"));
        assert!(supervisor.is_event_active("after"));
        assert_eq!(count(&journal, "terminate:cutscene"), 1);
    }

    #[test]
    fn test_end_event_silently() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor
            .register(Probe::new("cutscene", None, &journal).launch_at_finish("after", 0))
            .unwrap();
        supervisor.register(Probe::new("after", None, &journal)).unwrap();

        supervisor.start_event(&mut map, "cutscene");
        supervisor.pause_event("cutscene");
        assert!(supervisor.end_event(&mut map, "cutscene", false));

        assert!(!supervisor.is_event_paused("cutscene"));
        assert!(!supervisor.is_event_active("after"));
        assert_eq!(count(&journal, "terminate:cutscene"), 1);
    }

    #[test]
    fn test_end_event_drops_countdowns() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor
            .register(Probe::new("a", None, &journal).launch_at_finish("b", 0))
            .unwrap();
        supervisor.register(Probe::new("b", None, &journal)).unwrap();

        supervisor.start_event_delayed(&mut map, "a", 100);
        supervisor.start_event_delayed(&mut map, "a", 200);
        assert!(supervisor.end_event(&mut map, "a", true));

        assert!(!supervisor.is_event_delayed("a"));
        // Never started, so no terminate, but the abort still cascades
        assert_eq!(count(&journal, "terminate:a"), 0);
        assert!(supervisor.is_event_active("b"));
        assert!(!supervisor.end_event(&mut map, "a", true), "nothing left to end");
    }

    #[test]
    fn test_silent_end_of_countdown_does_not_cascade() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor
            .register(Probe::new("a", None, &journal).launch_at_finish("b", 0))
            .unwrap();
        supervisor.register(Probe::new("b", None, &journal)).unwrap();

        supervisor.start_event_delayed(&mut map, "a", 500);
        assert!(supervisor.end_event(&mut map, "a", false));

        assert!(!supervisor.is_event_delayed("a"));
        assert!(!supervisor.is_event_active("b"));
        assert!(!supervisor.is_event_delayed("b"));
    }

    #[test]
    fn test_delay_onto_frozen_countdown_stays_frozen() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor.register(Probe::new("a", None, &journal)).unwrap();

        supervisor.start_event_delayed(&mut map, "a", 500);
        assert!(supervisor.pause_event("a"));
        assert!(supervisor.start_event_delayed(&mut map, "a", 200));

        let in_active = supervisor.delayed_events().iter().any(|d| d.event.as_str() == "a");
        let in_paused = supervisor.paused_delayed_events().iter().any(|d| d.event.as_str() == "a");
        assert!(!in_active);
        assert!(in_paused);

        // Frozen countdowns do not run
        supervisor.update(&mut map, 1000);
        assert!(!supervisor.is_event_active("a"));

        assert!(supervisor.resume_event("a"));
        assert!(supervisor.paused_delayed_events().is_empty());
        supervisor.update(&mut map, 200);
        assert!(supervisor.is_event_active("a"));
    }

    #[test]
    fn test_dangling_link_is_skipped() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor
            .register(
                Probe::new("parent", None, &journal)
                    .launch_at_start("missing", 0)
                    .launch_at_start("child", 0),
            )
            .unwrap();
        supervisor.register(Probe::new("child", None, &journal)).unwrap();

        assert!(supervisor.start_event(&mut map, "parent"));
        assert!(supervisor.is_event_active("child"));
        assert_eq!(
            supervisor.take_diagnostics(),
            vec![Error::DanglingLink {
                parent: EventId::from("parent"),
                child: EventId::from("missing"),
            }]
        );
    }

    #[test]
    fn test_chain_through_delays() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor
            .register(Probe::new("a", Some(1), &journal).launch_at_finish("b", 100))
            .unwrap();
        supervisor
            .register(Probe::new("b", Some(1), &journal).launch_at_finish("c", 0))
            .unwrap();
        supervisor.register(Probe::new("c", None, &journal)).unwrap();

        supervisor.start_event(&mut map, "a");
        supervisor.update(&mut map, 50); // a finishes, b queued for 100ms
        assert!(supervisor.is_event_delayed("b"));
        supervisor.update(&mut map, 50);
        assert!(!supervisor.is_event_active("b"));
        supervisor.update(&mut map, 50); // b starts and finishes, c starts
        assert!(!supervisor.is_event_active("b"));
        assert!(supervisor.is_event_active("c"));
    }

    #[test]
    fn test_diagnostics_capacity() {
        let mut supervisor =
            EventSupervisor::with_config(&SceneConfig::default().with_diagnostics_capacity(2));
        let mut map = MapState::new();
        for name in ["x", "y", "z"] {
            supervisor.start_event(&mut map, name);
        }

        let kept = supervisor.take_diagnostics();
        assert_eq!(
            kept,
            vec![
                Error::EventNotFound(EventId::from("y")),
                Error::EventNotFound(EventId::from("z")),
            ]
        );
        assert_eq!(supervisor.diagnostics().count(), 0);
    }

    #[test]
    fn test_event_can_restart_after_finishing() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor.register(Probe::new("a", Some(1), &journal)).unwrap();

        supervisor.start_event(&mut map, "a");
        supervisor.update(&mut map, 16);
        assert!(!supervisor.is_event_active("a"));

        assert!(supervisor.start_event(&mut map, "a"));
        assert_eq!(count(&journal, "start:a"), 2);
    }
}
