use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use playhead_config::SubtitleConfig;
use playhead_model::{
    ItemId, MediaSourceId, MediaStream, RemoteSubtitleCandidate, StreamKind,
};
use tokio::sync::watch;

use crate::domains::session::jobs::GenerationGuard;
use crate::error::{PlaybackError, Result};
use crate::infra::services::{RemoteSubtitleService, StreamDescriptionService};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubtitleSearchState {
    #[default]
    Idle,
    Searching,
    Results(Vec<RemoteSubtitleCandidate>),
    Error(String),
    Downloading,
    Polling {
        attempt: u32,
    },
}

impl SubtitleSearchState {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SubtitleSearchState::Searching
                | SubtitleSearchState::Downloading
                | SubtitleSearchState::Polling { .. }
        )
    }
}

/// A downloaded subtitle that has shown up in the source's descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleAcquired {
    /// Fresh descriptors, already containing the new stream.
    pub streams: Vec<MediaStream>,
    pub new_stream_index: u32,
    /// Descriptors the poll compared against.
    pub baseline: Vec<MediaStream>,
}

/// Drives remote subtitle search and download-then-poll.
#[derive(Clone)]
pub struct SubtitleAcquisitionCoordinator {
    remote: Arc<dyn RemoteSubtitleService>,
    descriptions: Arc<dyn StreamDescriptionService>,
    poll_attempts: u32,
    poll_delay: Duration,
    state: Arc<watch::Sender<SubtitleSearchState>>,
}

impl fmt::Debug for SubtitleAcquisitionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubtitleAcquisitionCoordinator")
            .field("poll_attempts", &self.poll_attempts)
            .field("poll_delay", &self.poll_delay)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl SubtitleAcquisitionCoordinator {
    pub fn new(
        remote: Arc<dyn RemoteSubtitleService>,
        descriptions: Arc<dyn StreamDescriptionService>,
        config: &SubtitleConfig,
    ) -> Self {
        let (state, _) = watch::channel(SubtitleSearchState::Idle);
        Self {
            remote,
            descriptions,
            poll_attempts: config.poll_attempts,
            poll_delay: config.poll_delay(),
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SubtitleSearchState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SubtitleSearchState {
        self.state.borrow().clone()
    }

    pub fn reset(&self) {
        self.publish(SubtitleSearchState::Idle);
    }

    /// Search the remote catalogue. Failures are reported once, never
    /// retried.
    pub async fn search(
        &self,
        item_id: ItemId,
        language: String,
    ) -> Result<Vec<RemoteSubtitleCandidate>> {
        self.publish(SubtitleSearchState::Searching);
        log::debug!("[Subtitles] Searching {language} subtitles for {item_id}");

        match self.remote.search(item_id, language).await {
            Ok(candidates) => {
                log::debug!("[Subtitles] {} candidates found", candidates.len());
                self.publish(SubtitleSearchState::Results(candidates.clone()));
                Ok(candidates)
            }
            Err(err) => {
                log::warn!("[Subtitles] Search failed: {err}");
                self.publish(SubtitleSearchState::Error(err.to_string()));
                Err(PlaybackError::network("subtitle search", err))
            }
        }
    }

    /// Ask the server to download `candidate`, then poll the source's
    /// descriptors until a new subtitle appears or the budget runs out.
    pub async fn acquire(
        &self,
        item_id: ItemId,
        source_id: MediaSourceId,
        candidate: RemoteSubtitleCandidate,
        prior_streams: Vec<MediaStream>,
        guard: GenerationGuard,
    ) -> Result<SubtitleAcquired> {
        self.publish(SubtitleSearchState::Downloading);
        log::info!(
            "[Subtitles] Downloading {} ({}) for {item_id}",
            candidate.name,
            candidate.provider
        );

        if let Err(err) = self.remote.download(source_id.clone(), candidate.id).await {
            log::warn!("[Subtitles] Download failed: {err}");
            self.publish(SubtitleSearchState::Error(err.to_string()));
            return Err(PlaybackError::network("subtitle download", err));
        }

        let prior_count = subtitle_count(&prior_streams);

        for attempt in 1..=self.poll_attempts {
            self.ensure_current(&guard)?;
            self.publish(SubtitleSearchState::Polling { attempt });
            tokio::time::sleep(self.poll_delay).await;
            self.ensure_current(&guard)?;

            let streams = match self
                .descriptions
                .fetch_streams(item_id, source_id.clone())
                .await
            {
                Ok(streams) => streams,
                Err(err) => {
                    log::warn!("[Subtitles] Descriptor refresh failed: {err}");
                    self.publish(SubtitleSearchState::Error(err.to_string()));
                    return Err(PlaybackError::network("stream refresh", err));
                }
            };

            if subtitle_count(&streams) > prior_count {
                self.ensure_current(&guard)?;
                let Some(new_stream_index) = find_new_subtitle(&prior_streams, &streams)
                else {
                    self.publish(SubtitleSearchState::Idle);
                    return Err(PlaybackError::InvalidState(
                        "subtitle count grew without a subtitle stream".into(),
                    ));
                };
                log::info!(
                    "[Subtitles] New subtitle at index {new_stream_index} after {attempt} checks"
                );
                self.publish(SubtitleSearchState::Idle);
                return Ok(SubtitleAcquired {
                    streams,
                    new_stream_index,
                    baseline: prior_streams,
                });
            }
        }

        log::warn!(
            "[Subtitles] Subtitle did not appear after {} checks",
            self.poll_attempts
        );
        let err = PlaybackError::PollTimeout {
            attempts: self.poll_attempts,
        };
        self.publish(SubtitleSearchState::Error(err.to_string()));
        Err(err)
    }

    fn ensure_current(&self, guard: &GenerationGuard) -> Result<()> {
        if guard.is_current() {
            Ok(())
        } else {
            log::debug!(
                "[Subtitles] Generation {} is stale, stopping poll",
                guard.generation()
            );
            self.publish(SubtitleSearchState::Idle);
            Err(PlaybackError::Cancelled("subtitle poll"))
        }
    }

    fn publish(&self, state: SubtitleSearchState) {
        self.state.send_replace(state);
    }
}

fn subtitle_count(streams: &[MediaStream]) -> usize {
    streams
        .iter()
        .filter(|stream| stream.kind == StreamKind::Subtitle)
        .count()
}

/// Index of the external subtitle present in `current` but not in `prior`.
///
/// Indices shift on insertion, so streams are matched by identity. Falls
/// back to the highest-indexed external subtitle, then to any subtitle.
pub fn find_new_subtitle(prior: &[MediaStream], current: &[MediaStream]) -> Option<u32> {
    let is_new = |stream: &&MediaStream| {
        !prior.iter().any(|old| old.same_identity(stream))
    };

    current
        .iter()
        .filter(|s| s.is_external_subtitle())
        .find(is_new)
        .or_else(|| {
            current
                .iter()
                .filter(|s| s.is_external_subtitle())
                .max_by_key(|s| s.index)
        })
        .or_else(|| {
            current
                .iter()
                .filter(|s| s.kind == StreamKind::Subtitle)
                .max_by_key(|s| s.index)
        })
        .map(|stream| stream.index)
}
