//! Playlist domain

pub mod cursor;

pub use cursor::{PlaylistCursor, PlaylistError, TraversalMode};
