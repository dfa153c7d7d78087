//! Error types for vignette-core
//!
//! Every variant is recoverable. The supervisor logs them as warnings and
//! keeps the session running; only registration hands one back to the caller.

use crate::{EventId, SpriteId};
use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An operation referenced an id that is not registered
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// A zero-delay start was requested for an event already active
    #[error("Event already active: {0}")]
    AlreadyActive(EventId),

    /// A second event was registered under an id already owned
    #[error("Duplicate event id: {0}")]
    DuplicateEvent(EventId),

    /// Events must have a non-empty id
    #[error("Event id must not be empty")]
    EmptyEventId,

    /// A mutating call arrived while the active list was being updated
    #[error("Cannot {operation} {target} while active events are updating")]
    Reentrant {
        operation: &'static str,
        target: String,
    },

    /// The supervisor was asked to update from inside its own update
    #[error("Supervisor update called while already updating")]
    NestedUpdate,

    /// A link pointed at a child id that is not registered
    #[error("Event {parent} links to unknown event {child}")]
    DanglingLink { parent: EventId, child: EventId },

    /// A sprite under one event's control was taken over by another
    #[error("{sprite} control moved from {previous} to {next}")]
    ControlConflict {
        sprite: SpriteId,
        previous: EventId,
        next: EventId,
    },

    /// A sprite event targets a sprite the map does not have
    #[error("Sprite not found: {0}")]
    SpriteNotFound(SpriteId),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
