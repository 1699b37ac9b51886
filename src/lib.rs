//! Tickline — a time-driven event dispatcher with looping playback.

pub mod config;
pub mod cue_sheet;
pub mod error;
pub mod timeline;

pub use error::{Error, Result};
pub use timeline::{Event, EventId, Remote, Timeline};
