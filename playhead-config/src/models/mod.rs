use std::time::Duration;

use anyhow::Context;
use playhead_model::SegmentPolicies;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{self, DEFAULT_SERVER_URL, PREPARE_TIMEOUT_MS};

/// Top-level playback settings consumed by the session engine.
///
/// All fields carry defaults so a partial file only needs to name what it
/// overrides.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Base URL of the media server; stream URLs are built against it.
    pub server_url: String,
    /// Client-side bitrate cap passed to negotiation (bits per second).
    pub max_streaming_bitrate: Option<u64>,
    /// How long to wait for the first frame after loading media (ms).
    pub prepare_timeout_ms: u64,
    pub seek: SeekConfig,
    pub segments: SegmentConfig,
    pub subtitles: SubtitleConfig,
    pub autoplay: AutoPlayConfig,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            max_streaming_bitrate: None,
            prepare_timeout_ms: PREPARE_TIMEOUT_MS,
            seek: SeekConfig::default(),
            segments: SegmentConfig::default(),
            subtitles: SubtitleConfig::default(),
            autoplay: AutoPlayConfig::default(),
        }
    }
}

impl PlaybackConfig {
    pub fn server_url(&self) -> anyhow::Result<Url> {
        Url::parse(&self.server_url).with_context(|| {
            format!("invalid server url {:?}", self.server_url)
        })
    }

    pub fn prepare_timeout(&self) -> Duration {
        Duration::from_millis(self.prepare_timeout_ms)
    }
}

/// Step sizes for remote-control seeking. Repeated presses scale these by
/// the seek acceleration profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SeekConfig {
    pub forward_step_ms: u64,
    pub backward_step_ms: u64,
    /// Below this position "previous" goes to the previous playlist item;
    /// above it the current item restarts.
    pub previous_threshold_ms: u64,
}

impl Default for SeekConfig {
    fn default() -> Self {
        Self {
            forward_step_ms: constants::seeking::FORWARD_STEP_MS,
            backward_step_ms: constants::seeking::BACKWARD_STEP_MS,
            previous_threshold_ms: constants::seeking::PREVIOUS_THRESHOLD_MS,
        }
    }
}

impl SeekConfig {
    pub fn forward_step(&self) -> Duration {
        Duration::from_millis(self.forward_step_ms)
    }

    pub fn backward_step(&self) -> Duration {
        Duration::from_millis(self.backward_step_ms)
    }

    pub fn previous_threshold(&self) -> Duration {
        Duration::from_millis(self.previous_threshold_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Position poll cadence while the item has segments (ms).
    pub poll_interval_ms: u64,
    /// Segments shorter than this are never acted on (ms).
    pub min_duration_ms: u64,
    pub policies: SegmentPolicies,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: constants::segments::POLL_INTERVAL_MS,
            min_duration_ms: constants::segments::MIN_DURATION_MS,
            policies: SegmentPolicies::default(),
        }
    }
}

impl SegmentConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn min_duration(&self) -> Duration {
        Duration::from_millis(self.min_duration_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SubtitleConfig {
    /// Descriptor re-fetches after a download before giving up.
    pub poll_attempts: u32,
    /// Delay before each re-fetch (ms).
    pub poll_delay_ms: u64,
    /// Language used when a search does not name one.
    pub preferred_language: Option<String>,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            poll_attempts: constants::subtitles::POLL_ATTEMPTS,
            poll_delay_ms: constants::subtitles::POLL_DELAY_MS,
            preferred_language: None,
        }
    }
}

impl SubtitleConfig {
    pub fn poll_delay(&self) -> Duration {
        Duration::from_millis(self.poll_delay_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AutoPlayConfig {
    pub enabled: bool,
    /// Stop auto-advancing when nobody has touched the remote for this long
    /// (ms). `None` disables the protection.
    pub pass_out_protection_ms: Option<u64>,
    /// How long the next-up candidate is shown before auto-advancing (ms).
    pub next_up_countdown_ms: u64,
}

impl Default for AutoPlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pass_out_protection_ms: Some(
                constants::autoplay::PASS_OUT_PROTECTION_MS,
            ),
            next_up_countdown_ms: constants::autoplay::NEXT_UP_COUNTDOWN_MS,
        }
    }
}

impl AutoPlayConfig {
    pub fn pass_out_protection(&self) -> Option<Duration> {
        self.pass_out_protection_ms.map(Duration::from_millis)
    }

    pub fn next_up_countdown(&self) -> Duration {
        Duration::from_millis(self.next_up_countdown_ms)
    }
}
