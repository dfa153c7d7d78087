//! Dialogue playback and speaker hold
//!
//! Lines, options and branching belong to the dialogue layer behind
//! [`DialogueHost`](crate::DialogueHost). This module only starts a dialogue
//! as an event and keeps its speakers still while it runs.

use crate::{EventBehavior, EventContext, EventSupervisor, MapState, SpriteId};
use tracing::{debug, warn};

/// Plays a dialogue and finishes when the host reports it closed
pub struct DialogueEvent {
    dialogue: String,
    begun: bool,
}

impl DialogueEvent {
    pub fn new(dialogue: impl Into<String>) -> Self {
        Self {
            dialogue: dialogue.into(),
            begun: false,
        }
    }

    /// Dialogue this event plays
    pub fn dialogue(&self) -> &str {
        &self.dialogue
    }
}

impl EventBehavior for DialogueEvent {
    fn start(&mut self, ctx: &mut EventContext<'_>) {
        self.begun = ctx.map.dialogues_mut().begin(&self.dialogue);
        if !self.begun {
            warn!(
                target: "events",
                event = %ctx.event_id(),
                dialogue = %self.dialogue,
                "Dialogue could not begin"
            );
        }
    }

    fn update(&mut self, ctx: &mut EventContext<'_>) -> bool {
        !self.begun || !ctx.map.dialogues().is_running(&self.dialogue)
    }
}

/// Speakers frozen for the length of a dialogue
///
/// Acquiring pauses every sprite event of each speaker and saves its motion
/// state; releasing restores the state and resumes the paused chain where it
/// left off. Both must happen outside the active pass of a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "speakers stay frozen until the hold is released"]
pub struct SpeakerHold {
    speakers: Vec<SpriteId>,
}

impl SpeakerHold {
    pub fn acquire(
        supervisor: &mut EventSupervisor,
        map: &mut MapState,
        speakers: impl IntoIterator<Item = SpriteId>,
    ) -> Self {
        let speakers: Vec<SpriteId> = speakers.into_iter().collect();
        for &speaker in &speakers {
            let paused = supervisor.pause_all_events(speaker);
            if let Some(sprite) = map.sprites.get_mut(speaker) {
                sprite.save_state();
                sprite.halt();
            }
            debug!(target: "sprites", sprite = %speaker, paused, "Speaker held");
        }
        Self { speakers }
    }

    /// Held speakers
    pub fn speakers(&self) -> &[SpriteId] {
        &self.speakers
    }

    pub fn release(self, supervisor: &mut EventSupervisor, map: &mut MapState) {
        for speaker in self.speakers {
            if let Some(sprite) = map.sprites.get_mut(speaker) {
                sprite.restore_state();
            }
            let resumed = supervisor.resume_all_events(speaker);
            debug!(target: "sprites", sprite = %speaker, resumed, "Speaker released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DialogueHost, Direction, MapEvent, Position, RandomMoveAction, VirtualSprite};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Knows a fixed set of dialogues; tests close them by hand
    struct Host {
        known: Vec<&'static str>,
        open: Rc<RefCell<Vec<String>>>,
    }

    impl DialogueHost for Host {
        fn begin(&mut self, dialogue: &str) -> bool {
            if self.known.contains(&dialogue) {
                self.open.borrow_mut().push(dialogue.to_string());
                true
            } else {
                false
            }
        }

        fn is_running(&self, dialogue: &str) -> bool {
            self.open.borrow().iter().any(|d| d == dialogue)
        }
    }

    fn map_with_host() -> (MapState, Rc<RefCell<Vec<String>>>) {
        let open = Rc::new(RefCell::new(Vec::new()));
        let map = MapState::new().with_dialogues(Host {
            known: vec!["greet"],
            open: Rc::clone(&open),
        });
        (map, open)
    }

    #[test]
    fn test_dialogue_runs_until_closed() {
        let (mut map, open) = map_with_host();
        let mut supervisor = EventSupervisor::new();
        supervisor.register(MapEvent::new("npc_greet", DialogueEvent::new("greet"))).unwrap();

        supervisor.start_event(&mut map, "npc_greet");
        supervisor.update(&mut map, 16);
        assert!(supervisor.is_event_active("npc_greet"));

        open.borrow_mut().clear();
        supervisor.update(&mut map, 16);
        assert!(!supervisor.is_event_active("npc_greet"));
    }

    #[test]
    fn test_unknown_dialogue_finishes() {
        let (mut map, _open) = map_with_host();
        let mut supervisor = EventSupervisor::new();
        supervisor.register(MapEvent::new("mumble", DialogueEvent::new("nope"))).unwrap();

        supervisor.start_event(&mut map, "mumble");
        supervisor.update(&mut map, 16);
        assert!(!supervisor.is_event_active("mumble"));
    }

    #[test]
    fn test_speaker_hold_round_trip() {
        let mut map = MapState::new();
        let mut supervisor = EventSupervisor::new();
        let guard = SpriteId::new(1);
        map.add_sprite(
            VirtualSprite::new(guard, "guard", Position::new(4.0, 4.0)).with_direction(Direction::West),
        );
        supervisor
            .register(MapEvent::sprite("patrol", guard, RandomMoveAction::new(60_000)))
            .unwrap();

        supervisor.start_event(&mut map, "patrol");
        supervisor.update(&mut map, 16);
        let before = map.sprites.get(guard).unwrap().clone();
        assert!(before.moving);

        let hold = SpeakerHold::acquire(&mut supervisor, &mut map, [guard]);
        assert!(supervisor.is_event_paused("patrol"));
        assert!(!map.sprites.get(guard).unwrap().moving);

        supervisor.update(&mut map, 500);
        assert_eq!(
            map.sprites.get(guard).unwrap().position,
            before.position,
            "held speakers stay put"
        );

        hold.release(&mut supervisor, &mut map);
        let after = map.sprites.get(guard).unwrap();
        assert!(supervisor.is_event_active("patrol"));
        assert!(after.moving);
        assert_eq!(after.direction, before.direction);
        assert_eq!(after.control_event().map(|e| e.as_str()), Some("patrol"));
    }
}
