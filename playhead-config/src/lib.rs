//! Shared configuration library for Playhead.
//!
//! This crate centralizes playback defaults, config loading from files and
//! the environment, and validation of the knobs the session engine reads
//! (seek steps, segment polling, subtitle poll budget, auto-play policy).

pub mod constants;
pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, ConfigSource};
pub use models::{
    AutoPlayConfig, PlaybackConfig, SeekConfig, SegmentConfig,
    SubtitleConfig,
};
pub use validation::{ConfigWarning, ConfigWarnings};
