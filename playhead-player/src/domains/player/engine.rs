use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use url::Url;

use super::events::PlayerEvent;

/// Engine-assigned identity of a parsed track group.
///
/// Opaque and only meaningful to the engine that produced it; never persist
/// it or compare it with server stream indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackGroupId(pub String);

impl TrackGroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for TrackGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
    Text,
}

/// The engine's own grouping of a parsed track, listed in container order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackGroup {
    pub id: TrackGroupId,
    pub kind: TrackKind,
    /// Side-loaded rather than demuxed from the container.
    pub is_external: bool,
    pub language: Option<String>,
    pub label: Option<String>,
    pub selected: bool,
}

impl TrackGroup {
    pub fn new(id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: TrackGroupId::new(id),
            kind,
            is_external: false,
            language: None,
            label: None,
            selected: false,
        }
    }

    pub fn external(mut self) -> Self {
        self.is_external = true;
        self
    }
}

/// Side-loaded subtitle attached to a media load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSubtitle {
    pub stream_index: u32,
    pub url: Url,
    pub language: Option<String>,
    pub codec: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLoadRequest {
    pub url: Url,
    pub start_position: Duration,
    /// At most one external subtitle is loaded at a time.
    pub external_subtitle: Option<ExternalSubtitle>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    #[error("no media loaded")]
    NotLoaded,

    #[error("unknown track group {0}")]
    UnknownTrack(TrackGroupId),

    #[error("failed to load media: {0}")]
    Load(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("player already released")]
    Released,
}

/// Capability set of the native player.
///
/// Calls are synchronous commands against the engine; completion of
/// asynchronous work (track parsing, first frame, end of stream) is
/// reported through [`PlayerEngine::subscribe`].
pub trait PlayerEngine: Send + Sync + 'static {
    fn load(&self, request: MediaLoadRequest) -> Result<(), PlayerError>;

    fn play(&self);

    fn pause(&self);

    fn is_playing(&self) -> bool;

    fn seek(&self, position: Duration);

    fn position(&self) -> Duration;

    fn duration(&self) -> Option<Duration>;

    /// Parsed track groups in container order; empty until parsing finishes.
    fn track_groups(&self) -> Vec<TrackGroup>;

    fn select_track(&self, group: &TrackGroupId) -> Result<(), PlayerError>;

    /// Turn a track type off entirely.
    fn disable_tracks(&self, kind: TrackKind);

    fn subscribe(&self) -> broadcast::Receiver<PlayerEvent>;

    fn release(&self);
}

/// Read/seek view of the player handed to background loops.
///
/// The session keeps the only full handle; loops may read the clock and
/// issue discrete seeks, nothing else.
pub struct PlayerProbe<P: PlayerEngine> {
    player: Arc<P>,
}

impl<P: PlayerEngine> PlayerProbe<P> {
    pub fn new(player: Arc<P>) -> Self {
        Self { player }
    }

    pub fn position(&self) -> Duration {
        self.player.position()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.player.duration()
    }

    pub fn seek(&self, position: Duration) {
        self.player.seek(position);
    }
}

impl<P: PlayerEngine> Clone for PlayerProbe<P> {
    fn clone(&self) -> Self {
        Self {
            player: Arc::clone(&self.player),
        }
    }
}

impl<P: PlayerEngine> fmt::Debug for PlayerProbe<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerProbe")
            .field("position", &self.player.position())
            .finish()
    }
}
