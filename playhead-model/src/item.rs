use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use crate::ids::{ItemId, MediaSourceId};
use crate::source::MediaSource;

/// Kinds of items the engine knows how to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ItemKind {
    Movie,
    Episode,
    Video,
    Trailer,
    MusicVideo,
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Movie => write!(f, "Movie"),
            ItemKind::Episode => write!(f, "Episode"),
            ItemKind::Video => write!(f, "Video"),
            ItemKind::Trailer => write!(f, "Trailer"),
            ItemKind::MusicVideo => write!(f, "Music Video"),
        }
    }
}

/// A playable unit: immutable metadata plus the sources it may resolve to.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaybackItem {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    pub run_time: Option<Duration>,
    pub series_name: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub media_sources: Vec<MediaSource>,
}

impl PlaybackItem {
    pub fn new(id: ItemId, name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            run_time: None,
            series_name: None,
            media_sources: Vec::new(),
        }
    }

    pub fn with_run_time(mut self, run_time: Duration) -> Self {
        self.run_time = Some(run_time);
        self
    }

    pub fn with_source(mut self, source: MediaSource) -> Self {
        self.media_sources.push(source);
        self
    }

    pub fn source(&self, id: &MediaSourceId) -> Option<&MediaSource> {
        self.media_sources.iter().find(|source| &source.id == id)
    }

    /// Title as shown in the player chrome ("Series - Episode" for episodes).
    pub fn display_title(&self) -> String {
        match (&self.kind, &self.series_name) {
            (ItemKind::Episode, Some(series)) => {
                format!("{} - {}", series, self.name)
            }
            _ => self.name.clone(),
        }
    }
}
