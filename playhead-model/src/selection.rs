use crate::source::{MediaSource, StreamKind};

/// Desired track for one stream kind, in the server's index space.
///
/// Sentinels stand in for "no concrete index". They never carry native
/// player track identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TrackIndex {
    /// No preference; the server or player default applies.
    #[default]
    Unspecified,
    /// Explicitly turn the track type off.
    Disabled,
    /// Subtitles only: show forced subtitles and nothing else.
    OnlyForced,
    Index(u32),
}

impl TrackIndex {
    pub fn concrete(self) -> Option<u32> {
        match self {
            TrackIndex::Index(index) => Some(index),
            _ => None,
        }
    }

    pub fn is_sentinel(self) -> bool {
        self.concrete().is_none()
    }

    /// Value sent to the server: `-1` disables, absent means no preference.
    pub fn to_wire(self) -> Option<i32> {
        match self {
            TrackIndex::Unspecified | TrackIndex::OnlyForced => None,
            TrackIndex::Disabled => Some(-1),
            TrackIndex::Index(index) => i32::try_from(index).ok(),
        }
    }

    pub fn from_wire(value: Option<i32>) -> Self {
        match value {
            None => TrackIndex::Unspecified,
            Some(v) if v < 0 => TrackIndex::Disabled,
            Some(v) => TrackIndex::Index(v as u32),
        }
    }
}

impl From<u32> for TrackIndex {
    fn from(index: u32) -> Self {
        TrackIndex::Index(index)
    }
}

/// Desired audio/subtitle pair, persisted per (user, item).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackSelection {
    #[cfg_attr(feature = "serde", serde(default))]
    pub audio: TrackIndex,
    #[cfg_attr(feature = "serde", serde(default))]
    pub subtitle: TrackIndex,
}

impl TrackSelection {
    pub fn new(audio: TrackIndex, subtitle: TrackIndex) -> Self {
        Self { audio, subtitle }
    }

    /// Drop concrete indices that do not address a stream of the right kind
    /// in `source`. Unresolvable choices fall back to the default silently.
    pub fn resolve_against(&self, source: &MediaSource) -> TrackSelection {
        let resolve = |index: TrackIndex, kind: StreamKind| match index {
            TrackIndex::Index(i) => match source.stream(i) {
                Some(stream) if stream.kind == kind => index,
                _ => TrackIndex::Unspecified,
            },
            TrackIndex::OnlyForced if kind != StreamKind::Subtitle => {
                TrackIndex::Unspecified
            }
            other => other,
        };

        TrackSelection {
            audio: resolve(self.audio, StreamKind::Audio),
            subtitle: resolve(self.subtitle, StreamKind::Subtitle),
        }
    }

    /// An external subtitle inserted by the server lands ahead of the audio
    /// streams, so a concrete audio index moves up by one.
    pub fn shift_audio_for_inserted_subtitle(&self) -> TrackSelection {
        let audio = match self.audio {
            TrackIndex::Index(index) => TrackIndex::Index(index.saturating_add(1)),
            other => other,
        };
        TrackSelection { audio, ..*self }
    }
}
