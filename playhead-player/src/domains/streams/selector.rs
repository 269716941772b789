use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use playhead_model::{
    DeviceProfile, ItemId, MediaSource, MediaSourceId, PlayMethod,
    PlaySessionId, TrackIndex, TrackSelection, UserId,
};
use url::Url;

use super::url as stream_url;
use crate::error::{PlaybackError, Result};
use crate::infra::services::{
    MediaInfoService, PlaybackErrorCode, PlaybackInfoRequest,
};

#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub item_id: ItemId,
    pub media_source_id: Option<MediaSourceId>,
    pub audio: TrackIndex,
    pub subtitle: TrackIndex,
    pub start_position: Duration,
    pub max_bitrate: Option<u64>,
}

impl StreamRequest {
    pub fn new(item_id: ItemId) -> Self {
        Self {
            item_id,
            media_source_id: None,
            audio: TrackIndex::Unspecified,
            subtitle: TrackIndex::Unspecified,
            start_position: Duration::ZERO,
            max_bitrate: None,
        }
    }

    pub fn with_selection(mut self, selection: TrackSelection) -> Self {
        self.audio = selection.audio;
        self.subtitle = selection.subtitle;
        self
    }

    pub fn with_source(mut self, source: Option<MediaSourceId>) -> Self {
        self.media_source_id = source;
        self
    }

    pub fn starting_at(mut self, position: Duration) -> Self {
        self.start_position = position;
        self
    }
}

/// Outcome of negotiation: how and from where to play.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDecision {
    pub item_id: ItemId,
    pub play_method: PlayMethod,
    pub url: Url,
    pub play_session_id: PlaySessionId,
    /// The negotiated source, with its stream descriptors.
    pub media_source: MediaSource,
}

/// Picks a media source and play method for an item.
#[derive(Clone)]
pub struct StreamSelector {
    media_info: Arc<dyn MediaInfoService>,
    base_url: Url,
    device_profile: DeviceProfile,
    user_id: UserId,
}

impl fmt::Debug for StreamSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSelector")
            .field("base_url", &self.base_url.as_str())
            .field("device_profile", &self.device_profile.name)
            .field("user_id", &self.user_id)
            .finish()
    }
}

impl StreamSelector {
    pub fn new(
        media_info: Arc<dyn MediaInfoService>,
        base_url: Url,
        device_profile: DeviceProfile,
        user_id: UserId,
    ) -> Self {
        Self {
            media_info,
            base_url,
            device_profile,
            user_id,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn select(&self, request: StreamRequest) -> Result<StreamDecision> {
        let item_id = request.item_id;
        let info_request = PlaybackInfoRequest {
            item_id,
            user_id: self.user_id,
            media_source_id: request.media_source_id.clone(),
            device_profile: self.device_profile.clone(),
            audio_stream_index: request.audio,
            subtitle_stream_index: request.subtitle,
            max_streaming_bitrate: self
                .device_profile
                .effective_bitrate(request.max_bitrate),
            start_position: request.start_position,
        };

        let response = self
            .media_info
            .negotiate(info_request)
            .await
            .map_err(|err| {
                log::warn!("[Streams] Negotiation for {item_id} failed: {err}");
                PlaybackError::network("negotiate", err)
            })?;

        if let Some(code) = response.error_code {
            log::warn!("[Streams] Server refused {item_id}: {code}");
            return Err(match code {
                PlaybackErrorCode::NoCompatibleStream => {
                    PlaybackError::NoSupportedPlaybackMethod { item_id }
                }
                code => PlaybackError::ServerRejected { item_id, code },
            });
        }

        let requested = request.media_source_id.as_ref();
        let mut sources = response.media_sources;
        let position = requested
            .and_then(|id| sources.iter().position(|source| &source.id == id))
            .unwrap_or(0);
        if position >= sources.len() {
            log::warn!("[Streams] No media sources returned for {item_id}");
            return Err(PlaybackError::NoPlayableSource { item_id });
        }
        let source = sources.swap_remove(position);

        let Some(play_method) = Self::play_method(&source) else {
            log::warn!(
                "[Streams] Source {} of {item_id} supports no playback method",
                source.id
            );
            return Err(PlaybackError::NoSupportedPlaybackMethod { item_id });
        };

        let play_session_id = response
            .play_session_id
            .unwrap_or_else(PlaySessionId::generate);

        let url = match play_method {
            PlayMethod::DirectPlay => stream_url::direct_play_url(
                &self.base_url,
                &item_id,
                &source,
                &play_session_id,
            ),
            PlayMethod::DirectStream => stream_url::direct_stream_url(
                &self.base_url,
                &item_id,
                &source,
                &play_session_id,
                request.audio,
                request.subtitle,
            ),
            PlayMethod::Transcode => stream_url::join_server_path(
                &self.base_url,
                source.transcoding_url.as_deref().unwrap_or_default(),
            ),
        }
        .map_err(|err| {
            log::warn!("[Streams] Could not build {play_method} url: {err}");
            PlaybackError::Config(format!("stream url: {err}"))
        })?;

        log::debug!("[Streams] {item_id} plays via {play_method} from {url}");

        Ok(StreamDecision {
            item_id,
            play_method,
            url,
            play_session_id,
            media_source: source,
        })
    }

    /// Most efficient method the source supports. A transcode flag without a
    /// transcoding URL does not count.
    pub fn play_method(source: &MediaSource) -> Option<PlayMethod> {
        if source.supports_direct_play {
            Some(PlayMethod::DirectPlay)
        } else if source.supports_direct_stream {
            Some(PlayMethod::DirectStream)
        } else if source.supports_transcoding
            && source
                .transcoding_url
                .as_deref()
                .is_some_and(|url| !url.is_empty())
        {
            Some(PlayMethod::Transcode)
        } else {
            None
        }
    }
}
