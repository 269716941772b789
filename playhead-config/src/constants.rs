/// Path to a TOML or JSON playback config file.
pub const ENV_CONFIG_PATH: &str = "PLAYHEAD_CONFIG_PATH";
/// Inline JSON playback config.
pub const ENV_CONFIG_JSON: &str = "PLAYHEAD_CONFIG_JSON";
/// Overrides `server_url` regardless of where the rest came from.
pub const ENV_SERVER_URL: &str = "PLAYHEAD_SERVER_URL";

pub const DEFAULT_FILE_CANDIDATES: &[&str] = &[
    "playhead.toml",
    "playhead.json",
    "config/playhead.toml",
    "config/playhead.json",
];

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8096";

pub mod seeking {
    pub const FORWARD_STEP_MS: u64 = 30_000;
    pub const BACKWARD_STEP_MS: u64 = 15_000;
    /// Past this position "previous" restarts the item instead.
    pub const PREVIOUS_THRESHOLD_MS: u64 = 5_000;
}

pub mod segments {
    pub const POLL_INTERVAL_MS: u64 = 500;
    pub const MIN_DURATION_MS: u64 = 1_000;
}

pub mod subtitles {
    pub const POLL_ATTEMPTS: u32 = 4;
    pub const POLL_DELAY_MS: u64 = 1_500;
    /// ISO 639-2 code searched when neither the caller nor the config names one.
    pub const DEFAULT_SEARCH_LANGUAGE: &str = "eng";
}

pub mod autoplay {
    pub const NEXT_UP_COUNTDOWN_MS: u64 = 10_000;
    pub const PASS_OUT_PROTECTION_MS: u64 = 2 * 60 * 60 * 1_000;
}

pub const PREPARE_TIMEOUT_MS: u64 = 30_000;
