use log::warn;
use tokio::sync::broadcast::{self, error::RecvError};

use super::engine::PlayerError;

/// Notifications from the native player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Track groups for the most recent load are available.
    TracksParsed,
    /// The first frame of the most recent load was rendered.
    FirstFrameReady,
    EndOfStream,
    Error { error: PlayerError, fatal: bool },
}

/// Next event from the player, skipping over lag.
///
/// Returns `None` once the player drops its sender.
pub async fn next_event(
    rx: &mut broadcast::Receiver<PlayerEvent>,
) -> Option<PlayerEvent> {
    loop {
        match rx.recv().await {
            Ok(event) => return Some(event),
            Err(RecvError::Lagged(skipped)) => {
                warn!("[Player] Event receiver lagged, skipped {skipped} events");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}
