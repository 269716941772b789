use std::time::Duration;

use playhead_model::ItemId;
use thiserror::Error;

use crate::domains::player::PlayerError;
use crate::domains::playlist::PlaylistError;
use crate::infra::services::{PlaybackErrorCode, ServiceError};

#[derive(Error, Debug, Clone)]
pub enum PlaybackError {
    #[error("network error during {operation}: {source}")]
    Network {
        operation: &'static str,
        #[source]
        source: ServiceError,
    },

    #[error("no supported playback method for item {item_id}")]
    NoSupportedPlaybackMethod { item_id: ItemId },

    #[error("item {item_id} has no playable media source")]
    NoPlayableSource { item_id: ItemId },

    #[error("server rejected playback of {item_id}: {code}")]
    ServerRejected {
        item_id: ItemId,
        code: PlaybackErrorCode,
    },

    #[error("subtitle took too long to appear ({attempts} checks)")]
    PollTimeout { attempts: u32 },

    #[error("player error: {0}")]
    Player(#[from] PlayerError),

    #[error("player did not become ready within {0:?}")]
    PrepareTimeout(Duration),

    #[error("invalid session state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Playlist(#[from] PlaylistError),

    #[error("operation cancelled: {0}")]
    Cancelled(&'static str),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PlaybackError {
    pub fn network(operation: &'static str, source: ServiceError) -> Self {
        PlaybackError::Network { operation, source }
    }

    /// Failures that doom the current item but not the playlist.
    pub fn is_item_fatal(&self) -> bool {
        matches!(
            self,
            PlaybackError::NoSupportedPlaybackMethod { .. }
                | PlaybackError::NoPlayableSource { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
