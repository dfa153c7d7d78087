//! Exclusive sprite control
//!
//! A [`SpriteEvent`] wraps a [`SpriteAction`] and enforces the control
//! protocol around it:
//!
//! - on start, a different controller of the sprite is ended without
//!   triggering its links, then the new event records itself as controller
//! - on finish or termination, control is released only if this event is
//!   still the recorded controller
//!
//! Actions only implement motion and animation; they never touch the
//! controller back-reference themselves.

use crate::{Error, EventBehavior, EventContext, EventId, SpriteId};
use tracing::debug;

/// What a sprite event does with the sprite it controls
pub trait SpriteAction {
    /// Called once per activation, after control has been acquired
    fn start(&mut self, sprite: SpriteId, ctx: &mut EventContext<'_>);

    /// Called once per tick. Returns true when the action is complete.
    fn update(&mut self, sprite: SpriteId, ctx: &mut EventContext<'_>) -> bool;

    /// Called when the event is ended early, before control is released
    fn terminate(&mut self, _sprite: SpriteId, _ctx: &mut EventContext<'_>) {}
}

/// An event holding exclusive control of one sprite while it runs
pub struct SpriteEvent {
    sprite: SpriteId,
    action: Box<dyn SpriteAction>,
    /// The target sprite was absent when the event started
    orphaned: bool,
}

impl SpriteEvent {
    /// Wrap `action` so it runs under control of `sprite`
    pub fn new(sprite: SpriteId, action: impl SpriteAction + 'static) -> Self {
        Self::from_boxed(sprite, Box::new(action))
    }

    /// Wrap a boxed action
    pub fn from_boxed(sprite: SpriteId, action: Box<dyn SpriteAction>) -> Self {
        Self {
            sprite,
            action,
            orphaned: false,
        }
    }

    /// The sprite this event controls
    pub fn sprite(&self) -> SpriteId {
        self.sprite
    }

    fn release(&self, ctx: &mut EventContext<'_>) {
        let event = ctx.event_id();
        if let Some(sprite) = ctx.map.sprites.get_mut(self.sprite) {
            if sprite.release_control(event) {
                debug!(target: "sprites", sprite = %self.sprite, event = %event, "Released control");
            }
        }
    }
}

impl EventBehavior for SpriteEvent {
    fn start(&mut self, ctx: &mut EventContext<'_>) {
        let event: EventId = ctx.event_id().clone();
        let Some(previous) = ctx.map.sprites.get(self.sprite).map(|s| s.control_event().cloned())
        else {
            self.orphaned = true;
            ctx.supervisor.report(Error::SpriteNotFound(self.sprite));
            return;
        };
        self.orphaned = false;

        if let Some(previous) = previous.filter(|p| p != &event) {
            ctx.supervisor.report(Error::ControlConflict {
                sprite: self.sprite,
                previous: previous.clone(),
                next: event.clone(),
            });
            // Preemption never cascades into the previous event's links
            ctx.end_event(previous, false);
        }

        if let Some(sprite) = ctx.map.sprites.get_mut(self.sprite) {
            sprite.acquire_control(event.clone());
            debug!(target: "sprites", sprite = %self.sprite, event = %event, "Acquired control");
        }
        self.action.start(self.sprite, ctx);
    }

    fn update(&mut self, ctx: &mut EventContext<'_>) -> bool {
        if self.orphaned || !ctx.map.sprites.contains(self.sprite) {
            return true;
        }
        let finished = self.action.update(self.sprite, ctx);
        if finished {
            self.release(ctx);
        }
        finished
    }

    fn terminate(&mut self, ctx: &mut EventContext<'_>) {
        if self.orphaned {
            return;
        }
        self.action.terminate(self.sprite, ctx);
        self.release(ctx);
    }

    fn controlled_sprite(&self) -> Option<SpriteId> {
        Some(self.sprite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventSupervisor, MapEvent, MapState, Position, VirtualSprite};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Journal = Rc<RefCell<Vec<String>>>;

    /// Stands still; finishes after `finish_after` updates
    struct Hold {
        name: &'static str,
        finish_after: Option<u32>,
        updates: u32,
        journal: Journal,
    }

    fn hold(name: &'static str, sprite: SpriteId, finish_after: Option<u32>, journal: &Journal) -> MapEvent {
        MapEvent::sprite(
            name,
            sprite,
            Hold {
                name,
                finish_after,
                updates: 0,
                journal: Rc::clone(journal),
            },
        )
    }

    impl SpriteAction for Hold {
        fn start(&mut self, _sprite: SpriteId, _ctx: &mut EventContext<'_>) {
            self.updates = 0;
            self.journal.borrow_mut().push(format!("start:{}", self.name));
        }

        fn update(&mut self, _sprite: SpriteId, _ctx: &mut EventContext<'_>) -> bool {
            self.updates += 1;
            self.finish_after.is_some_and(|n| self.updates >= n)
        }

        fn terminate(&mut self, _sprite: SpriteId, _ctx: &mut EventContext<'_>) {
            self.journal.borrow_mut().push(format!("terminate:{}", self.name));
        }
    }

    const GUARD: SpriteId = SpriteId(1);
    const CAT: SpriteId = SpriteId(2);

    fn setup() -> (EventSupervisor, MapState, Journal) {
        let mut map = MapState::new();
        map.add_sprite(VirtualSprite::new(GUARD, "guard", Position::new(2.0, 2.0)));
        map.add_sprite(VirtualSprite::new(CAT, "cat", Position::new(5.0, 5.0)));
        (EventSupervisor::new(), map, Rc::new(RefCell::new(Vec::new())))
    }

    fn controller(map: &MapState, sprite: SpriteId) -> Option<String> {
        map.sprites
            .get(sprite)
            .and_then(|s| s.control_event())
            .map(|e| e.to_string())
    }

    #[test]
    fn test_sprite_event_kind() {
        let journal = Rc::new(RefCell::new(Vec::new()));
        let event = hold("walk", GUARD, None, &journal);
        assert!(event.is_sprite_event());
        assert_eq!(event.target_sprite(), Some(GUARD));
    }

    #[test]
    fn test_acquire_and_release_on_finish() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor.register(hold("walk", GUARD, Some(2), &journal)).unwrap();

        supervisor.start_event(&mut map, "walk");
        assert_eq!(controller(&map, GUARD).as_deref(), Some("walk"));

        supervisor.update(&mut map, 16);
        assert_eq!(controller(&map, GUARD).as_deref(), Some("walk"));
        supervisor.update(&mut map, 16);
        assert_eq!(controller(&map, GUARD), None);
        assert!(!supervisor.is_event_active("walk"));
    }

    #[test]
    fn test_preemption_is_silent() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor
            .register(hold("a", GUARD, None, &journal).launch_at_finish("b", 0))
            .unwrap();
        supervisor.register(hold("b", CAT, None, &journal)).unwrap();
        supervisor.register(hold("c", GUARD, None, &journal)).unwrap();

        supervisor.start_event(&mut map, "a");
        supervisor.update(&mut map, 16);
        supervisor.start_event(&mut map, "c");

        assert!(!supervisor.is_event_active("a"));
        assert!(!supervisor.is_event_active("b"), "preemption must not cascade");
        assert!(supervisor.is_event_active("c"));
        assert_eq!(controller(&map, GUARD).as_deref(), Some("c"));
        assert!(journal.borrow().contains(&"terminate:a".to_string()));
        assert!(supervisor.diagnostics().any(|e| matches!(
            e,
            Error::ControlConflict { sprite, .. } if *sprite == GUARD
        )));
    }

    #[test]
    fn test_stale_release_keeps_newer_controller() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor.register(hold("old", GUARD, Some(1), &journal)).unwrap();
        supervisor.start_event(&mut map, "old");

        // Something outside the scheduler hands the sprite over
        map.sprites
            .get_mut(GUARD)
            .unwrap()
            .acquire_control(EventId::from("newer"));

        supervisor.update(&mut map, 16);
        assert!(!supervisor.is_event_active("old"));
        assert_eq!(controller(&map, GUARD).as_deref(), Some("newer"));
    }

    #[test]
    fn test_end_all_events_frees_sprite() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor.register(hold("walk", GUARD, None, &journal)).unwrap();
        supervisor.register(hold("dance", GUARD, None, &journal)).unwrap();
        supervisor.register(hold("wave", GUARD, None, &journal)).unwrap();
        supervisor.register(hold("prowl", CAT, None, &journal)).unwrap();

        supervisor.start_event(&mut map, "walk");
        supervisor.start_event_delayed(&mut map, "dance", 500);
        supervisor.start_event_delayed(&mut map, "wave", 800);
        supervisor.start_event(&mut map, "prowl");

        assert_eq!(supervisor.end_all_events(&mut map, GUARD), 3);

        assert!(!supervisor.is_event_active("walk"));
        assert!(!supervisor.is_event_delayed("dance"));
        assert!(!supervisor.is_event_delayed("wave"));
        assert!(supervisor.is_event_active("prowl"));
        assert_eq!(controller(&map, GUARD), None);
        assert_eq!(controller(&map, CAT).as_deref(), Some("prowl"));
        assert_eq!(
            *journal.borrow(),
            vec!["start:walk", "start:prowl", "terminate:walk"],
            "only the started event is terminated"
        );
    }

    #[test]
    fn test_pause_all_and_resume_all() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor.register(hold("walk", GUARD, None, &journal)).unwrap();
        supervisor.register(hold("dance", GUARD, None, &journal)).unwrap();
        supervisor.register(hold("prowl", CAT, None, &journal)).unwrap();

        supervisor.start_event(&mut map, "walk");
        supervisor.start_event_delayed(&mut map, "dance", 300);
        supervisor.start_event(&mut map, "prowl");

        assert_eq!(supervisor.pause_all_events(GUARD), 2);
        assert!(supervisor.is_event_paused("walk"));
        assert!(supervisor.is_event_active("prowl"));

        supervisor.update(&mut map, 1000);
        assert!(!supervisor.is_event_active("dance"), "frozen countdown");

        assert_eq!(supervisor.resume_all_events(GUARD), 2);
        assert!(supervisor.is_event_active("walk"));
        assert_eq!(supervisor.delayed_events()[0].remaining_ms, 300);
        assert_eq!(controller(&map, GUARD).as_deref(), Some("walk"));
    }

    #[test]
    fn test_missing_sprite_finishes() {
        let (mut supervisor, mut map, journal) = setup();
        supervisor
            .register(hold("ghost_walk", SpriteId::new(99), None, &journal))
            .unwrap();

        assert!(supervisor.start_event(&mut map, "ghost_walk"));
        assert_eq!(
            supervisor.take_diagnostics(),
            vec![Error::SpriteNotFound(SpriteId::new(99))]
        );
        supervisor.update(&mut map, 16);
        assert!(!supervisor.is_event_active("ghost_walk"));
        assert!(journal.borrow().is_empty(), "the action never ran");
    }
}
