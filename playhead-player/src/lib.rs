//! Playhead playback engine
//!
//! This crate contains the client-side playback session engine: it keeps a
//! live native player consistent with server-reported stream metadata, user
//! track preferences, and the background loops that skip segments and pick
//! up freshly downloaded subtitles.
//!
//! Notes
//! - The native player and every server interaction sit behind traits
//!   (`domains::player::PlayerEngine`, `infra::services`); nothing here
//!   decodes media or speaks HTTP.
//! - `domains::session::PlaybackSessionController` is the entry point; the
//!   other domains are usable on their own and are exposed mainly to enable
//!   testing and reuse.

pub mod domains;
pub mod error;
pub mod infra;
pub mod prelude;

pub use error::{PlaybackError, Result};
