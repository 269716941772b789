//! Player domain
//!
//! The native decode/render engine is opaque to us. This module describes
//! the capability set the session needs from it and the events it emits.

pub mod engine;
pub mod events;

pub use engine::{
    ExternalSubtitle, MediaLoadRequest, PlayerEngine, PlayerError,
    PlayerProbe, TrackGroup, TrackGroupId, TrackKind,
};
pub use events::{PlayerEvent, next_event};
