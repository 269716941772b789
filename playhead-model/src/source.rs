use std::fmt::{self, Display, Formatter};

use crate::ids::MediaSourceId;

/// Delivery strategies in decreasing order of efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PlayMethod {
    DirectPlay,
    DirectStream,
    Transcode,
}

impl Display for PlayMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PlayMethod::DirectPlay => write!(f, "DirectPlay"),
            PlayMethod::DirectStream => write!(f, "DirectStream"),
            PlayMethod::Transcode => write!(f, "Transcode"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
}

/// Metadata for one elementary stream of a [`MediaSource`].
///
/// `index` lives in the server's flat index space and is stable for the
/// lifetime of the source, except that adding an external subtitle shifts
/// every index after the insertion point.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaStream {
    pub index: u32,
    pub kind: StreamKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_external: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_forced: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_default: bool,
    pub codec: Option<String>,
    pub language: Option<String>,
    pub title: Option<String>,
    pub delivery_url: Option<String>,
}

impl MediaStream {
    pub fn new(index: u32, kind: StreamKind) -> Self {
        Self {
            index,
            kind,
            is_external: false,
            is_forced: false,
            is_default: false,
            codec: None,
            language: None,
            title: None,
            delivery_url: None,
        }
    }

    pub fn video(index: u32) -> Self {
        Self::new(index, StreamKind::Video)
    }

    pub fn audio(index: u32) -> Self {
        Self::new(index, StreamKind::Audio)
    }

    pub fn subtitle(index: u32) -> Self {
        Self::new(index, StreamKind::Subtitle)
    }

    pub fn external_subtitle(index: u32, delivery_url: impl Into<String>) -> Self {
        Self {
            is_external: true,
            delivery_url: Some(delivery_url.into()),
            ..Self::new(index, StreamKind::Subtitle)
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = Some(codec.into());
        self
    }

    pub fn forced(mut self) -> Self {
        self.is_forced = true;
        self
    }

    pub fn default_track(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn is_embedded_subtitle(&self) -> bool {
        self.kind == StreamKind::Subtitle && !self.is_external
    }

    pub fn is_external_subtitle(&self) -> bool {
        self.kind == StreamKind::Subtitle && self.is_external
    }

    /// Whether two descriptors describe the same stream regardless of index.
    pub fn same_identity(&self, other: &MediaStream) -> bool {
        self.kind == other.kind
            && self.is_external == other.is_external
            && self.delivery_url == other.delivery_url
            && self.language == other.language
            && self.codec == other.codec
            && self.title == other.title
    }
}

/// One deliverable encoding of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaSource {
    pub id: MediaSourceId,
    pub container: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub supports_direct_play: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub supports_direct_stream: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub supports_transcoding: bool,
    /// Descriptors in server-listed order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub streams: Vec<MediaStream>,
    pub transcoding_url: Option<String>,
    pub etag: Option<String>,
    pub default_audio_index: Option<u32>,
    pub default_subtitle_index: Option<u32>,
    pub bitrate: Option<u64>,
}

impl MediaSource {
    pub fn new(id: MediaSourceId) -> Self {
        Self {
            id,
            container: None,
            supports_direct_play: false,
            supports_direct_stream: false,
            supports_transcoding: false,
            streams: Vec::new(),
            transcoding_url: None,
            etag: None,
            default_audio_index: None,
            default_subtitle_index: None,
            bitrate: None,
        }
    }

    pub fn stream(&self, index: u32) -> Option<&MediaStream> {
        self.streams.iter().find(|stream| stream.index == index)
    }

    pub fn streams_of(
        &self,
        kind: StreamKind,
    ) -> impl Iterator<Item = &MediaStream> {
        self.streams.iter().filter(move |stream| stream.kind == kind)
    }

    pub fn subtitle_count(&self) -> usize {
        self.streams_of(StreamKind::Subtitle).count()
    }

    /// Server index of the first audio descriptor.
    pub fn audio_offset(&self) -> Option<u32> {
        self.streams_of(StreamKind::Audio).map(|s| s.index).next()
    }

    /// Server index of the first embedded (non-external) subtitle descriptor.
    pub fn embedded_subtitle_offset(&self) -> Option<u32> {
        self.streams
            .iter()
            .find(|s| s.is_embedded_subtitle())
            .map(|s| s.index)
    }

    pub fn first_forced_subtitle(&self) -> Option<&MediaStream> {
        self.streams_of(StreamKind::Subtitle).find(|s| s.is_forced)
    }

    pub fn supports_any_method(&self) -> bool {
        self.supports_direct_play
            || self.supports_direct_stream
            || self.supports_transcoding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> MediaSource {
        let mut source = MediaSource::new(MediaSourceId::new("src").unwrap());
        source.streams = vec![
            MediaStream::video(0),
            MediaStream::external_subtitle(1, "/subs/1.srt"),
            MediaStream::audio(2),
            MediaStream::audio(3),
            MediaStream::subtitle(4).forced(),
            MediaStream::subtitle(5),
        ];
        source
    }

    #[test]
    fn offsets_follow_listed_order() {
        let source = source();
        assert_eq!(source.audio_offset(), Some(2));
        assert_eq!(source.embedded_subtitle_offset(), Some(4));
        assert_eq!(source.subtitle_count(), 3);
        assert_eq!(source.first_forced_subtitle().map(|s| s.index), Some(4));
    }

    #[test]
    fn identity_ignores_index() {
        let a = MediaStream::external_subtitle(1, "/subs/a.srt");
        let mut b = a.clone();
        b.index = 7;
        assert!(a.same_identity(&b));
        assert!(!a.same_identity(&MediaStream::external_subtitle(1, "/b")));
    }
}
