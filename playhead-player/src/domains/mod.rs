//! Engine domains, leaves first.
//!
//! `session` composes every other domain against one live player handle.

pub mod player;
pub mod playlist;
pub mod seek;
pub mod segments;
pub mod session;
pub mod streams;
pub mod subtitles;
pub mod tracks;
