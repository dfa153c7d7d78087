//! Sprite actions that change how a sprite looks rather than where it is

use crate::{CustomAnimation, Direction, EventContext, Position, SpriteAction, SpriteId};

/// Plays a custom animation
///
/// With a duration the action finishes once it has elapsed; without one the
/// animation loops until the event is ended.
#[derive(Debug, Clone)]
pub struct AnimateAction {
    animation: String,
    duration_ms: Option<u32>,
    remaining_ms: u32,
}

impl AnimateAction {
    pub fn new(animation: impl Into<String>, duration_ms: Option<u32>) -> Self {
        Self {
            animation: animation.into(),
            duration_ms,
            remaining_ms: 0,
        }
    }

    fn clear(&self, sprite: SpriteId, ctx: &mut EventContext<'_>) {
        if let Some(s) = ctx.map.sprites.get_mut(sprite) {
            if s.custom_animation.as_ref().is_some_and(|a| a.name == self.animation) {
                s.custom_animation = None;
            }
        }
    }
}

impl SpriteAction for AnimateAction {
    fn start(&mut self, sprite: SpriteId, ctx: &mut EventContext<'_>) {
        self.remaining_ms = self.duration_ms.unwrap_or(0);
        if let Some(s) = ctx.map.sprites.get_mut(sprite) {
            s.halt();
            s.custom_animation = Some(CustomAnimation {
                name: self.animation.clone(),
                remaining_ms: self.duration_ms,
            });
        }
    }

    fn update(&mut self, sprite: SpriteId, ctx: &mut EventContext<'_>) -> bool {
        if self.duration_ms.is_none() {
            return false;
        }
        self.remaining_ms = self.remaining_ms.saturating_sub(ctx.elapsed_ms());
        if self.remaining_ms == 0 {
            self.clear(sprite, ctx);
            return true;
        }
        if let Some(animation) = ctx
            .map
            .sprites
            .get_mut(sprite)
            .and_then(|s| s.custom_animation.as_mut())
        {
            animation.remaining_ms = Some(self.remaining_ms);
        }
        false
    }

    fn terminate(&mut self, sprite: SpriteId, ctx: &mut EventContext<'_>) {
        self.clear(sprite, ctx);
    }
}

/// Snaps the sprite to face a direction
#[derive(Debug, Clone, Copy)]
pub struct ChangeDirectionAction(pub Direction);

impl SpriteAction for ChangeDirectionAction {
    fn start(&mut self, sprite: SpriteId, ctx: &mut EventContext<'_>) {
        if let Some(s) = ctx.map.sprites.get_mut(sprite) {
            s.direction = self.0;
        }
    }

    fn update(&mut self, _sprite: SpriteId, _ctx: &mut EventContext<'_>) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy)]
enum LookTarget {
    Point(Position),
    Sprite(SpriteId),
}

/// Turns the sprite toward a point or another sprite
#[derive(Debug, Clone, Copy)]
pub struct LookAtAction {
    target: LookTarget,
}

impl LookAtAction {
    pub fn point(position: Position) -> Self {
        Self {
            target: LookTarget::Point(position),
        }
    }

    pub fn sprite(target: SpriteId) -> Self {
        Self {
            target: LookTarget::Sprite(target),
        }
    }
}

impl SpriteAction for LookAtAction {
    fn start(&mut self, sprite: SpriteId, ctx: &mut EventContext<'_>) {
        let target = match self.target {
            LookTarget::Point(point) => Some(point),
            LookTarget::Sprite(other) => ctx.map.sprites.get(other).map(|s| s.position),
        };
        let Some(target) = target else {
            return;
        };
        if let Some(s) = ctx.map.sprites.get_mut(sprite) {
            if let Some(direction) = Direction::toward(s.position, target) {
                s.direction = direction;
            }
        }
    }

    fn update(&mut self, _sprite: SpriteId, _ctx: &mut EventContext<'_>) -> bool {
        true
    }
}
