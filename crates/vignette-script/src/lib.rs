//! Vignette Script - RON loader for map content
//!
//! Loads a map's scene content from RON files:
//! - Sprite placements
//! - Event definitions and the links between them
//! - Optional scene configuration
//!
//! Loaded definitions are checked for duplicate ids before anything runs,
//! then instantiated into an `EventSupervisor` and a `MapState`.

mod error;
mod loader;
mod schema;

pub use error::{Error, Result};
pub use loader::{Loader, MapDefs};
pub use schema::event::{EventKindDef, LinkDef};
pub use schema::{EventDef, SpriteDef};
