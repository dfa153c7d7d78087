//! Schema definitions for map files

pub mod event;
pub mod sprite;

pub use event::EventDef;
pub use sprite::SpriteDef;
