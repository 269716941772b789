//! Service traits for everything the engine asks of the media server.
//!
//! Implementations live with the host application (HTTP clients, caches);
//! the engine only depends on these surfaces.

pub mod preferences;

use async_trait::async_trait;
use playhead_model::{
    DeviceProfile, ItemId, MediaSource, MediaSourceId, MediaStream,
    PlaySessionId, RemoteSubtitleCandidate, Segment, TrackIndex,
    TrackSelection, UserId,
};
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use preferences::MemoryPreferenceStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Reasons the negotiation service may refuse an item outright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackErrorCode {
    NotAllowed,
    NoCompatibleStream,
    RateLimitExceeded,
}

impl Display for PlaybackErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackErrorCode::NotAllowed => write!(f, "NotAllowed"),
            PlaybackErrorCode::NoCompatibleStream => {
                write!(f, "NoCompatibleStream")
            }
            PlaybackErrorCode::RateLimitExceeded => {
                write!(f, "RateLimitExceeded")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackInfoRequest {
    pub item_id: ItemId,
    pub user_id: UserId,
    pub media_source_id: Option<MediaSourceId>,
    pub device_profile: DeviceProfile,
    pub audio_stream_index: TrackIndex,
    pub subtitle_stream_index: TrackIndex,
    pub max_streaming_bitrate: Option<u64>,
    pub start_position: Duration,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackInfoResponse {
    pub media_sources: Vec<MediaSource>,
    pub play_session_id: Option<PlaySessionId>,
    pub error_code: Option<PlaybackErrorCode>,
}

/// Media-info negotiation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaInfoService: Send + Sync {
    async fn negotiate(
        &self,
        request: PlaybackInfoRequest,
    ) -> ServiceResult<PlaybackInfoResponse>;
}

/// Current stream descriptors of a media source, in server order
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamDescriptionService: Send + Sync {
    async fn fetch_streams(
        &self,
        item_id: ItemId,
        source_id: MediaSourceId,
    ) -> ServiceResult<Vec<MediaStream>>;
}

/// Intro/outro/recap/... regions of an item, ordered by start
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SegmentService: Send + Sync {
    async fn fetch_segments(&self, item_id: ItemId)
    -> ServiceResult<Vec<Segment>>;
}

/// Remote subtitle catalogue
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteSubtitleService: Send + Sync {
    async fn search(
        &self,
        item_id: ItemId,
        language: String,
    ) -> ServiceResult<Vec<RemoteSubtitleCandidate>>;

    /// Asks the server to fetch a subtitle. Completion is only observable by
    /// re-fetching the source's stream descriptors.
    async fn download(
        &self,
        source_id: MediaSourceId,
        subtitle_id: String,
    ) -> ServiceResult<()>;
}

/// Per-(user, item) track preference persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn load(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> ServiceResult<Option<TrackSelection>>;

    async fn save(
        &self,
        user_id: UserId,
        item_id: ItemId,
        selection: TrackSelection,
    ) -> ServiceResult<()>;
}

/// The full set of server collaborators a session needs.
#[derive(Clone)]
pub struct PlaybackServices {
    pub media_info: Arc<dyn MediaInfoService>,
    pub streams: Arc<dyn StreamDescriptionService>,
    pub segments: Arc<dyn SegmentService>,
    pub subtitles: Arc<dyn RemoteSubtitleService>,
    pub preferences: Arc<dyn PreferenceStore>,
}

impl fmt::Debug for PlaybackServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackServices").finish_non_exhaustive()
    }
}
