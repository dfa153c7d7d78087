//! Village Intro Demo
//!
//! A guard notices the hero, walks over, talks, then a cat wanders off and
//! the scene hands over to the next map. Run with `RUST_LOG=debug` to see
//! every scheduler transition.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vignette_core::{DialogueHost, ScriptTable, SpeakerHold, SpriteId};
use vignette_script::Loader;

const MAP: &str = r#"
(
    config: Some((rng_seed: 7, wander_direction_change_ms: 600)),
    sprites: [
        (id: 1, name: "guard", position: (2.0, 8.0), direction: East, speed: 150.0),
        (id: 2, name: "hero", position: (6.0, 4.0), direction: West),
        (id: 3, name: "cat", position: (9.0, 9.0), speed: 110.0),
    ],
    events: [
        (
            id: "intro",
            kind: Script(start: Some("announce")),
            links: [
                (child: "guard_notice", anchor: Start, delay: 300),
                (child: "cat_nap", anchor: Start),
            ],
        ),
        (
            id: "guard_notice",
            kind: LookAtSprite(sprite: 1, target: 2),
            links: [(child: "guard_approach", anchor: Finish, delay: 200)],
        ),
        (
            id: "guard_approach",
            kind: PathMoveToSprite(sprite: 1, target: 2),
            links: [(child: "guard_talk", anchor: Finish)],
        ),
        (
            id: "guard_talk",
            kind: Dialogue(dialogue: "guard_warning"),
            links: [
                (child: "cat_wander", anchor: Finish),
                (child: "leave_village", anchor: Finish, delay: 2500),
            ],
        ),
        (id: "cat_nap", kind: Animate(sprite: 3, animation: "sleep")),
        (
            id: "cat_wander",
            kind: RandomMove(sprite: 3, duration: 2000),
            links: [(child: "meow", anchor: Start)],
        ),
        (id: "meow", kind: Sound(sound: "meow")),
        (id: "leave_village", kind: MapTransition(map: "forest.ron", entrance: Some("south_gate"))),
    ],
)
"#;

const TICK_MS: u32 = 100;

/// Shows one line per confirm press; the demo presses every few ticks
#[derive(Default)]
struct Conversation {
    open: Option<(String, VecDeque<&'static str>)>,
}

impl Conversation {
    fn confirm(&mut self) {
        if let Some((name, lines)) = self.open.as_mut() {
            match lines.pop_front() {
                Some(line) => println!("  [{}] {}", name, line),
                None => self.open = None,
            }
        }
    }
}

struct DialogueLayer(Rc<RefCell<Conversation>>);

impl DialogueHost for DialogueLayer {
    fn begin(&mut self, dialogue: &str) -> bool {
        let lines = match dialogue {
            "guard_warning" => vec![
                "Halt! The forest road is closed after dusk.",
                "...but I suppose you look harmless enough.",
            ],
            _ => return false,
        };
        self.0.borrow_mut().open = Some((dialogue.to_string(), lines.into()));
        true
    }

    fn is_running(&self, dialogue: &str) -> bool {
        self.0
            .borrow()
            .open
            .as_ref()
            .is_some_and(|(name, _)| name == dialogue)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Vignette Village Intro ===\n");

    let mut loader = Loader::new();
    if let Err(e) = loader.load_str(MAP) {
        eprintln!("Failed to load map: {}", e);
        return;
    }
    let defs = loader.finish();

    let scripts = ScriptTable::new().with_start("announce", |ctx| {
        println!("  The village square at dusk (tick {}).", ctx.map.clock.tick);
    });
    let (mut supervisor, map) = match defs.build_scene(&scripts) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Failed to build scene: {}", e);
            return;
        }
    };

    info!(
        events = supervisor.event_count(),
        sprites = map.sprites.len(),
        "Scene ready"
    );

    let conversation = Rc::new(RefCell::new(Conversation::default()));
    let mut map = map.with_dialogues(DialogueLayer(Rc::clone(&conversation)));
    let guard = SpriteId::new(1);
    let mut hold: Option<SpeakerHold> = None;

    supervisor.start_event(&mut map, "intro");

    for _ in 0..120 {
        supervisor.update(&mut map, TICK_MS);

        // Keep the guard still while the conversation is on screen
        let talking = conversation.borrow().open.is_some();
        match (talking, hold.take()) {
            (true, None) => hold = Some(SpeakerHold::acquire(&mut supervisor, &mut map, [guard])),
            (false, Some(held)) => held.release(&mut supervisor, &mut map),
            (_, kept) => hold = kept,
        }
        if talking && map.clock.tick % 5 == 0 {
            conversation.borrow_mut().confirm();
        }

        for command in map.take_commands() {
            println!("  -> host command at {} ms: {:?}", map.clock.elapsed_ms, command);
            if command.leaves_map() {
                print_sprites(&map);
                println!("\nScene finished after {} ticks.", map.clock.tick);
                return;
            }
        }
    }

    print_sprites(&map);
    for warning in supervisor.take_diagnostics() {
        println!("  warning: {}", warning);
    }
}

fn print_sprites(map: &vignette_core::MapState) {
    println!("\nSprites:");
    for sprite in map.sprites.iter() {
        println!(
            "  {:<6} at ({:>5.2}, {:>5.2}) facing {:?}",
            sprite.name, sprite.position.x, sprite.position.y, sprite.direction
        );
    }
}
