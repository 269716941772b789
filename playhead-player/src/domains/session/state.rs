use std::fmt;
use std::time::Duration;

use playhead_model::{ItemId, PlayMethod, Segment, TrackSelection};

use crate::domains::subtitles::SubtitleSearchState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchReason {
    Audio,
    Subtitle,
    SegmentSkip,
    PlaylistAdvance,
}

impl fmt::Display for SwitchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchReason::Audio => write!(f, "audio"),
            SwitchReason::Subtitle => write!(f, "subtitle"),
            SwitchReason::SegmentSkip => write!(f, "segment_skip"),
            SwitchReason::PlaylistAdvance => write!(f, "playlist_advance"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Preparing,
    Playing,
    Switching(SwitchReason),
    Error(String),
    Released,
}

impl SessionState {
    pub fn is_released(&self) -> bool {
        matches!(self, SessionState::Released)
    }

    /// An item is loaded and the user may change tracks or seek.
    pub fn has_media(&self) -> bool {
        matches!(self, SessionState::Playing | SessionState::Switching(_))
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Preparing => write!(f, "Preparing"),
            SessionState::Playing => write!(f, "Playing"),
            SessionState::Switching(reason) => write!(f, "Switching({reason})"),
            SessionState::Error(message) => write!(f, "Error({message})"),
            SessionState::Released => write!(f, "Released"),
        }
    }
}

/// The next playlist item, offered after the current one ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextUp {
    pub item_id: ItemId,
    pub title: String,
    /// Set when the session will advance on its own after this long.
    pub auto_advance_in: Option<Duration>,
}

/// Immutable view of the session handed to observers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub generation: u64,
    pub item_id: Option<ItemId>,
    pub title: Option<String>,
    pub play_method: Option<PlayMethod>,
    pub selection: TrackSelection,
    pub segment_prompt: Option<Segment>,
    pub subtitle_search: SubtitleSearchState,
    pub next_up: Option<NextUp>,
    /// Last user-facing message, e.g. "subtitle took too long".
    pub notice: Option<String>,
}
