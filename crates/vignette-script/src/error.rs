//! Error types for vignette-script

use thiserror::Error;
use vignette_core::{EventId, SpriteId};

/// Map content error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Duplicate definition: {0}")]
    DuplicateDefinition(String),

    #[error("Duplicate sprite: {0}")]
    DuplicateSprite(SpriteId),

    #[error("Event {event} targets unknown {sprite}")]
    UnknownSprite { event: EventId, sprite: SpriteId },

    #[error("Event {event} uses missing script function {name}")]
    MissingScript { event: EventId, name: String },

    #[error(transparent)]
    Core(#[from] vignette_core::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
