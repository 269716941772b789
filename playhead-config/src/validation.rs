use thiserror::Error;

use crate::models::PlaybackConfig;

/// Values that load fine but will make playback behave oddly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigWarning {
    #[error("server url {0:?} is not a valid url")]
    InvalidServerUrl(String),

    #[error("subtitle poll budget is zero; downloads will always time out")]
    ZeroSubtitlePollBudget,

    #[error("segment poll interval is zero; falling back to one poll per tick")]
    ZeroSegmentPollInterval,

    #[error("seek step {0} is zero; seeking in that direction does nothing")]
    ZeroSeekStep(&'static str),

    #[error("auto-play is enabled with a zero pass-out protection window")]
    ZeroPassOutWindow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigWarnings(Vec<ConfigWarning>);

impl ConfigWarnings {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.0.iter()
    }

    pub fn contains(&self, warning: &ConfigWarning) -> bool {
        self.0.contains(warning)
    }

    fn push(&mut self, warning: ConfigWarning) {
        self.0.push(warning);
    }
}

pub fn validate(config: &PlaybackConfig) -> ConfigWarnings {
    let mut warnings = ConfigWarnings::default();

    if config.server_url().is_err() {
        warnings.push(ConfigWarning::InvalidServerUrl(config.server_url.clone()));
    }
    if config.subtitles.poll_attempts == 0 {
        warnings.push(ConfigWarning::ZeroSubtitlePollBudget);
    }
    if config.segments.poll_interval_ms == 0 {
        warnings.push(ConfigWarning::ZeroSegmentPollInterval);
    }
    if config.seek.forward_step_ms == 0 {
        warnings.push(ConfigWarning::ZeroSeekStep("forward"));
    }
    if config.seek.backward_step_ms == 0 {
        warnings.push(ConfigWarning::ZeroSeekStep("backward"));
    }
    if config.autoplay.enabled && config.autoplay.pass_out_protection_ms == Some(0)
    {
        warnings.push(ConfigWarning::ZeroPassOutWindow);
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_clean() {
        assert!(validate(&PlaybackConfig::default()).is_empty());
    }

    #[test]
    fn zero_budgets_are_flagged() {
        let mut config = PlaybackConfig::default();
        config.subtitles.poll_attempts = 0;
        config.seek.backward_step_ms = 0;
        let warnings = validate(&config);
        assert_eq!(warnings.len(), 2);
        assert!(warnings.contains(&ConfigWarning::ZeroSubtitlePollBudget));
        assert!(warnings.contains(&ConfigWarning::ZeroSeekStep("backward")));
    }
}
