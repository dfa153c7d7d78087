//! Sprite movement actions
//!
//! Both actions walk the sprite through [`MapState::step_toward`] and
//! [`MapState::step_sprite`], so speed and collision rules live in one place.

use crate::{Direction, EventContext, Position, SpriteAction, SpriteId, StepOutcome};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Destination {
    Point(Position),
    Sprite(SpriteId),
}

/// Walks a sprite along a path from the map's path finder
///
/// The moving-target form re-plans periodically and whenever the target has
/// moved off the end of the current path.
#[derive(Debug, Clone)]
pub struct PathMoveAction {
    destination: Destination,
    run: bool,
    path: Vec<Position>,
    node: usize,
    unreachable: bool,
    since_plan_ms: u32,
    /// Where the target stood when the current path was planned
    planned_for: Option<Position>,
}

impl PathMoveAction {
    /// Walk to a fixed point
    pub fn to_point(destination: Position) -> Self {
        Self::new(Destination::Point(destination))
    }

    /// Walk up to another sprite, following it if it moves
    pub fn to_sprite(target: SpriteId) -> Self {
        Self::new(Destination::Sprite(target))
    }

    fn new(destination: Destination) -> Self {
        Self {
            destination,
            run: false,
            path: Vec::new(),
            node: 0,
            unreachable: false,
            since_plan_ms: 0,
            planned_for: None,
        }
    }

    /// Run instead of walk
    pub fn running(mut self) -> Self {
        self.run = true;
        self
    }

    /// Nodes of the current path
    pub fn path(&self) -> &[Position] {
        &self.path
    }

    fn target_position(&self, ctx: &EventContext<'_>) -> Option<Position> {
        match self.destination {
            Destination::Point(point) => Some(point),
            Destination::Sprite(target) => ctx.map.sprites.get(target).map(|s| s.position),
        }
    }

    fn plan(&mut self, sprite: SpriteId, ctx: &mut EventContext<'_>) -> bool {
        self.since_plan_ms = 0;
        self.node = 0;
        let Some(goal) = self.target_position(ctx) else {
            self.path.clear();
            return false;
        };
        self.planned_for = Some(goal);
        match ctx.map.find_path(sprite, goal) {
            Some(path) => {
                debug!(target: "sprites", %sprite, nodes = path.len(), "Path planned");
                self.path = path;
                true
            }
            None => {
                self.path.clear();
                false
            }
        }
    }

    fn halt(sprite: SpriteId, ctx: &mut EventContext<'_>) {
        if let Some(s) = ctx.map.sprites.get_mut(sprite) {
            s.halt();
        }
    }
}

impl SpriteAction for PathMoveAction {
    fn start(&mut self, sprite: SpriteId, ctx: &mut EventContext<'_>) {
        self.unreachable = !self.plan(sprite, ctx);
        if self.unreachable {
            warn!(
                target: "sprites",
                %sprite,
                event = %ctx.event_id(),
                "No path to destination"
            );
            return;
        }
        if let Some(s) = ctx.map.sprites.get_mut(sprite) {
            s.running = self.run;
        }
    }

    fn update(&mut self, sprite: SpriteId, ctx: &mut EventContext<'_>) -> bool {
        if self.unreachable {
            return true;
        }
        let elapsed = ctx.elapsed_ms();
        let tolerance = ctx.map.config.arrival_tolerance;

        if let Destination::Sprite(_) = self.destination {
            let (Some(goal), Some(me)) = (
                self.target_position(ctx),
                ctx.map.sprites.get(sprite).map(|s| s.position),
            ) else {
                Self::halt(sprite, ctx);
                return true;
            };
            if me.distance(goal) <= ctx.map.config.target_reach_distance {
                Self::halt(sprite, ctx);
                return true;
            }

            self.since_plan_ms = self.since_plan_ms.saturating_add(elapsed);
            let drifted = self
                .planned_for
                .is_some_and(|planned| planned.distance(goal) > tolerance);
            let exhausted = self.node >= self.path.len();
            if self.since_plan_ms >= ctx.map.config.path_recompute_ms || (drifted && exhausted) {
                if !self.plan(sprite, ctx) {
                    // Target unreachable for now; keep trying on later ticks
                    Self::halt(sprite, ctx);
                    return false;
                }
            }
        }

        let Some(&node) = self.path.get(self.node) else {
            Self::halt(sprite, ctx);
            return matches!(self.destination, Destination::Point(_));
        };
        match ctx.map.step_toward(sprite, node, elapsed, tolerance) {
            StepOutcome::Arrived => {
                self.node += 1;
                if self.node >= self.path.len() {
                    Self::halt(sprite, ctx);
                    return matches!(self.destination, Destination::Point(_));
                }
                false
            }
            StepOutcome::Moved => false,
            StepOutcome::Blocked => {
                // Something stepped into the way; plan around it next tick
                self.plan(sprite, ctx);
                false
            }
            StepOutcome::Missing => true,
        }
    }

    fn terminate(&mut self, sprite: SpriteId, ctx: &mut EventContext<'_>) {
        Self::halt(sprite, ctx);
    }
}

/// Wanders in random directions for a fixed time
#[derive(Debug, Clone)]
pub struct RandomMoveAction {
    total_ms: u32,
    direction_change_ms: Option<u32>,
    elapsed_ms: u32,
    since_change_ms: u32,
    heading: Option<Direction>,
}

impl RandomMoveAction {
    /// Wander for `total_ms`, turning as often as the scene config says
    pub fn new(total_ms: u32) -> Self {
        Self {
            total_ms,
            direction_change_ms: None,
            elapsed_ms: 0,
            since_change_ms: 0,
            heading: None,
        }
    }

    /// Turn every `ms` instead of the configured interval
    pub fn with_direction_change(mut self, ms: u32) -> Self {
        self.direction_change_ms = Some(ms);
        self
    }

    fn turn(&mut self, ctx: &mut EventContext<'_>) -> Direction {
        let heading = ctx.map.rng.direction_except(self.heading);
        self.heading = Some(heading);
        self.since_change_ms = 0;
        heading
    }
}

impl SpriteAction for RandomMoveAction {
    fn start(&mut self, _sprite: SpriteId, ctx: &mut EventContext<'_>) {
        self.elapsed_ms = 0;
        self.heading = None;
        self.turn(ctx);
    }

    fn update(&mut self, sprite: SpriteId, ctx: &mut EventContext<'_>) -> bool {
        let elapsed = ctx.elapsed_ms();
        self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed);
        if self.elapsed_ms >= self.total_ms {
            if let Some(s) = ctx.map.sprites.get_mut(sprite) {
                s.halt();
            }
            return true;
        }

        self.since_change_ms = self.since_change_ms.saturating_add(elapsed);
        let interval = self
            .direction_change_ms
            .unwrap_or(ctx.map.config.wander_direction_change_ms);
        let heading = match self.heading {
            Some(heading) if self.since_change_ms < interval => heading,
            _ => self.turn(ctx),
        };

        match ctx.map.step_sprite(sprite, heading, elapsed) {
            StepOutcome::Blocked => {
                self.turn(ctx);
                false
            }
            StepOutcome::Missing => true,
            StepOutcome::Moved | StepOutcome::Arrived => false,
        }
    }

    fn terminate(&mut self, sprite: SpriteId, ctx: &mut EventContext<'_>) {
        if let Some(s) = ctx.map.sprites.get_mut(sprite) {
            s.halt();
        }
    }
}
