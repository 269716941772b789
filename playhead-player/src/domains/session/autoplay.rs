use std::time::Duration;

use playhead_config::AutoPlayConfig;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoPlayDecision {
    /// Advance once the countdown elapses.
    Countdown(Duration),
    WaitForConfirmation,
}

/// Decides whether the next item starts on its own.
///
/// Pass-out protection stops auto-advancing once nobody has touched the
/// remote for the configured window.
#[derive(Debug, Clone)]
pub struct AutoPlayPolicy {
    enabled: bool,
    pass_out_protection: Option<Duration>,
    countdown: Duration,
    last_interaction: Instant,
}

impl AutoPlayPolicy {
    pub fn from_config(config: &AutoPlayConfig) -> Self {
        Self {
            enabled: config.enabled,
            pass_out_protection: config.pass_out_protection(),
            countdown: config.next_up_countdown(),
            last_interaction: Instant::now(),
        }
    }

    pub fn record_interaction(&mut self) {
        self.last_interaction = Instant::now();
    }

    pub fn since_interaction(&self) -> Duration {
        self.last_interaction.elapsed()
    }

    pub fn decide(&self) -> AutoPlayDecision {
        if !self.enabled {
            return AutoPlayDecision::WaitForConfirmation;
        }
        match self.pass_out_protection {
            Some(window) if self.since_interaction() >= window => {
                AutoPlayDecision::WaitForConfirmation
            }
            _ => AutoPlayDecision::Countdown(self.countdown),
        }
    }
}
