use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use playhead_config::PlaybackConfig;
use playhead_config::constants::subtitles::DEFAULT_SEARCH_LANGUAGE;
use playhead_model::{
    DeviceProfile, ItemId, PlayMethod, PlaybackItem, RemoteSubtitleCandidate,
    TrackIndex, TrackSelection, UserId,
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Instant;

use super::autoplay::{AutoPlayDecision, AutoPlayPolicy};
use super::jobs::{
    BackgroundEvent, BackgroundEventKind, BackgroundJobs, BackgroundSender,
    SessionGeneration,
};
use super::keys::KeyAction;
use super::state::{NextUp, SessionSnapshot, SessionState, SwitchReason};
use crate::domains::player::{
    ExternalSubtitle, MediaLoadRequest, PlayerEngine, PlayerError,
    PlayerEvent, PlayerProbe, next_event,
};
use crate::domains::playlist::{PlaylistCursor, PlaylistError, TraversalMode};
use crate::domains::seek::SeekAccelerationProfile;
use crate::domains::segments::{SegmentCommand, SegmentEvent, SegmentRunner};
use crate::domains::streams::url::join_server_path;
use crate::domains::streams::{StreamDecision, StreamRequest, StreamSelector};
use crate::domains::subtitles::{
    SubtitleAcquired, SubtitleAcquisitionCoordinator, SubtitleSearchState,
};
use crate::domains::tracks::TrackIndexMapper;
use crate::error::{PlaybackError, Result};
use crate::infra::services::PlaybackServices;

/// The item currently loaded into the player.
struct ActiveItem {
    item: PlaybackItem,
    decision: StreamDecision,
    /// Desired tracks in the server index space.
    selection: TrackSelection,
    /// Server index of the external subtitle attached to the load.
    attached_external: Option<u32>,
    /// Armed on every load; cleared by the first mapping that saw parsed
    /// track groups.
    pending_track_application: bool,
}

/// Owns one playback session: the player handle, the playlist and every
/// background loop started for the current item.
///
/// All mutation goes through `&mut self`. Player notifications and
/// background results are consumed by [`pump`](Self::pump); observers read
/// immutable [`SessionSnapshot`]s from [`subscribe`](Self::subscribe).
pub struct PlaybackSessionController<P: PlayerEngine> {
    player: Arc<P>,
    services: PlaybackServices,
    config: PlaybackConfig,
    user_id: UserId,
    selector: StreamSelector,
    subtitles: SubtitleAcquisitionCoordinator,
    player_events: broadcast::Receiver<PlayerEvent>,
    background_tx: BackgroundSender,
    background_rx: mpsc::UnboundedReceiver<BackgroundEvent>,
    jobs: BackgroundJobs,
    generation: SessionGeneration,
    playlist: Option<PlaylistCursor>,
    active: Option<ActiveItem>,
    autoplay: AutoPlayPolicy,
    snapshot: watch::Sender<SessionSnapshot>,
    released: bool,
}

impl<P: PlayerEngine> fmt::Debug for PlaybackSessionController<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackSessionController")
            .field("user_id", &self.user_id)
            .field("state", &self.snapshot.borrow().state)
            .field("generation", &self.generation.current())
            .field("jobs", &self.jobs)
            .field("released", &self.released)
            .finish()
    }
}

impl<P: PlayerEngine> PlaybackSessionController<P> {
    pub fn new(
        player: Arc<P>,
        services: PlaybackServices,
        config: PlaybackConfig,
        device_profile: DeviceProfile,
        user_id: UserId,
    ) -> Result<Self> {
        let base_url = config
            .server_url()
            .map_err(|err| PlaybackError::Config(format!("{err:#}")))?;
        let selector = StreamSelector::new(
            Arc::clone(&services.media_info),
            base_url,
            device_profile,
            user_id,
        );
        let subtitles = SubtitleAcquisitionCoordinator::new(
            Arc::clone(&services.subtitles),
            Arc::clone(&services.streams),
            &config.subtitles,
        );
        let (background_tx, background_rx) = mpsc::unbounded_channel();
        let (snapshot, _) = watch::channel(SessionSnapshot::default());
        let player_events = player.subscribe();
        let autoplay = AutoPlayPolicy::from_config(&config.autoplay);

        Ok(Self {
            player,
            services,
            config,
            user_id,
            selector,
            subtitles,
            player_events,
            background_tx,
            background_rx,
            jobs: BackgroundJobs::new(),
            generation: SessionGeneration::default(),
            playlist: None,
            active: None,
            autoplay,
            snapshot,
            released: false,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.snapshot.borrow().state.clone()
    }

    /// Fine-grained search/download progress, including poll attempts.
    pub fn subtitle_states(&self) -> watch::Receiver<SubtitleSearchState> {
        self.subtitles.subscribe()
    }

    pub fn playlist(&self) -> Option<&PlaylistCursor> {
        self.playlist.as_ref()
    }

    pub fn active_jobs(&self) -> usize {
        self.jobs.active()
    }

    pub fn generation(&self) -> u64 {
        self.generation.current()
    }

    /// Start a playlist at `start_index` and play its first item.
    pub async fn play(
        &mut self,
        items: Vec<PlaybackItem>,
        start_index: usize,
        mode: TraversalMode,
    ) -> Result<()> {
        self.ensure_alive()?;
        self.autoplay.record_interaction();
        let cursor = PlaylistCursor::new(items, start_index, mode)?;
        log::info!(
            "[Session] Starting playlist of {} items ({mode:?})",
            cursor.len()
        );
        self.playlist = Some(cursor);
        self.advance_playlist().await
    }

    /// Play a single item outside of playlist traversal.
    pub async fn play_item(&mut self, item: PlaybackItem) -> Result<()> {
        self.ensure_alive()?;
        self.autoplay.record_interaction();
        let result = self.start_item(item).await;
        if let Err(err) = &result {
            self.fail(err).await;
        }
        result
    }

    pub async fn select_audio(&mut self, index: TrackIndex) -> Result<()> {
        self.ensure_alive()?;
        self.autoplay.record_interaction();
        let active = self.active_mut()?;
        active.selection.audio = index;
        let selection = active.selection;
        let item_id = active.item.id;
        let in_place = active.decision.play_method == PlayMethod::DirectPlay;

        log::info!("[Session] Audio track -> {index:?}");
        self.persist_selection(item_id, selection).await;
        self.publish(|s| s.selection = selection);

        if in_place {
            self.reapply_tracks();
            Ok(())
        } else {
            self.switch(SwitchReason::Audio).await
        }
    }

    pub async fn select_subtitle(&mut self, index: TrackIndex) -> Result<()> {
        self.ensure_alive()?;
        self.autoplay.record_interaction();
        let active = self.active_mut()?;
        active.selection.subtitle = index;
        let selection = active.selection;
        let item_id = active.item.id;
        let in_place = active.decision.play_method == PlayMethod::DirectPlay
            && match index.concrete() {
                Some(i) => match active.decision.media_source.stream(i) {
                    Some(stream) => {
                        !stream.is_external || active.attached_external == Some(i)
                    }
                    None => true,
                },
                None => true,
            };

        log::info!("[Session] Subtitle track -> {index:?}");
        self.persist_selection(item_id, selection).await;
        self.publish(|s| s.selection = selection);

        if in_place {
            self.reapply_tracks();
            Ok(())
        } else {
            self.switch(SwitchReason::Subtitle).await
        }
    }

    /// Search remote subtitles for the current item. `None` uses the
    /// configured preferred language.
    pub async fn search_subtitles(
        &mut self,
        language: Option<String>,
    ) -> Result<Vec<RemoteSubtitleCandidate>> {
        self.ensure_alive()?;
        self.autoplay.record_interaction();
        let item_id = self.active_mut()?.item.id;
        let language = language
            .or_else(|| self.config.subtitles.preferred_language.clone())
            .unwrap_or_else(|| DEFAULT_SEARCH_LANGUAGE.to_string());

        let result = self.subtitles.search(item_id, language).await;
        let state = self.subtitles.state();
        self.publish(|s| s.subtitle_search = state);
        result
    }

    /// Start downloading `candidate` in the background. The result arrives
    /// through [`pump`](Self::pump).
    pub fn download_subtitle(
        &mut self,
        candidate: RemoteSubtitleCandidate,
    ) -> Result<()> {
        self.ensure_alive()?;
        self.autoplay.record_interaction();
        if self.snapshot.borrow().subtitle_search.is_busy()
            || self.subtitles.state().is_busy()
        {
            return Err(PlaybackError::InvalidState(
                "a subtitle download is already in progress".into(),
            ));
        }
        let active = self.active_mut()?;
        let item_id = active.item.id;
        let source_id = active.decision.media_source.id.clone();
        let prior_streams = active.decision.media_source.streams.clone();

        let coordinator = self.subtitles.clone();
        let guard = self.generation.guard();
        let generation = guard.generation();
        let events = self.background_tx.clone();
        let cancel = self.jobs.token();
        self.jobs.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = coordinator.acquire(item_id, source_id, candidate, prior_streams, guard) => {
                    let _ = events.send(BackgroundEvent::new(
                        generation,
                        BackgroundEventKind::SubtitleAcquired(result),
                    ));
                }
            }
        });

        self.publish(|s| s.subtitle_search = SubtitleSearchState::Downloading);
        Ok(())
    }

    pub fn accept_segment_skip(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.autoplay.record_interaction();
        let prompt = self.snapshot.borrow().segment_prompt;
        let Some(segment) = prompt else {
            return Err(PlaybackError::InvalidState(
                "no segment prompt is showing".into(),
            ));
        };

        if self.jobs.send_segment_command(SegmentCommand::Accept) {
            self.set_state(SessionState::Switching(SwitchReason::SegmentSkip));
        } else {
            log::debug!("[Session] Segment runner gone, seeking directly");
            self.player.seek(segment.end);
            self.publish(|s| s.segment_prompt = None);
        }
        Ok(())
    }

    pub fn dismiss_segment_skip(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.autoplay.record_interaction();
        if self.snapshot.borrow().segment_prompt.is_none() {
            return Err(PlaybackError::InvalidState(
                "no segment prompt is showing".into(),
            ));
        }
        self.jobs.send_segment_command(SegmentCommand::Dismiss);
        self.publish(|s| s.segment_prompt = None);
        Ok(())
    }

    pub async fn handle_key(&mut self, action: KeyAction) -> Result<()> {
        self.ensure_alive()?;
        self.autoplay.record_interaction();
        match action {
            KeyAction::PlayPause => {
                self.ensure_media()?;
                if self.player.is_playing() {
                    self.player.pause();
                } else {
                    self.player.play();
                }
                Ok(())
            }
            KeyAction::Seek { direction, repeat } => {
                self.ensure_media()?;
                let target = SeekAccelerationProfile::seek_target(
                    self.player.position(),
                    direction,
                    repeat,
                    self.player.duration(),
                    &self.config.seek,
                );
                self.player.seek(target);
                Ok(())
            }
            KeyAction::Next => self.skip_next().await,
            KeyAction::Previous => self.skip_previous().await,
            KeyAction::Stop => self.stop().await,
        }
    }

    pub async fn skip_next(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.autoplay.record_interaction();
        if !self.playlist.as_ref().is_some_and(PlaylistCursor::has_next) {
            return Err(PlaylistError::Exhausted.into());
        }
        self.advance_to_next().await
    }

    /// Restart the item when past the previous threshold, otherwise go back
    /// to the previous playlist item.
    pub async fn skip_previous(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.autoplay.record_interaction();
        let position = self.player.position();
        let can_step_back = self
            .playlist
            .as_ref()
            .is_some_and(PlaylistCursor::can_step_back);

        if position > self.config.seek.previous_threshold() || !can_step_back {
            log::debug!("[Session] Restarting current item from {position:?}");
            self.player.seek(Duration::ZERO);
            return Ok(());
        }

        let previous = match self.playlist.as_mut() {
            Some(cursor) => cursor.step_back().cloned()?,
            None => return Err(PlaylistError::NoPrevious.into()),
        };
        self.set_state(SessionState::Switching(SwitchReason::PlaylistAdvance));
        let result = self.start_item(previous).await;
        if let Err(err) = &result {
            self.fail(err).await;
        }
        result
    }

    pub async fn confirm_next_up(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.autoplay.record_interaction();
        if self.snapshot.borrow().next_up.is_none() {
            return Err(PlaybackError::InvalidState("nothing is up next".into()));
        }
        self.advance_to_next().await
    }

    /// Wait for the next player or background event and handle it.
    pub async fn pump(&mut self) -> Result<()> {
        self.ensure_alive()?;
        tokio::select! {
            event = next_event(&mut self.player_events) => match event {
                Some(event) => self.handle_player_event(event).await,
                None => Err(PlaybackError::Player(PlayerError::Released)),
            },
            Some(event) = self.background_rx.recv() => {
                self.handle_background_event(event).await
            }
        }
    }

    /// Cancel background work and return to `Idle`. The player stays
    /// allocated.
    pub async fn stop(&mut self) -> Result<()> {
        self.ensure_alive()?;
        log::info!("[Session] Stopping");
        self.jobs.shutdown().await;
        self.generation.bump();
        self.player.pause();
        self.active = None;
        self.playlist = None;
        self.subtitles.reset();
        self.publish(|s| {
            *s = SessionSnapshot {
                notice: s.notice.take(),
                ..SessionSnapshot::default()
            };
        });
        Ok(())
    }

    /// Tear the session down and release the player. Idempotent.
    pub async fn release(&mut self) {
        if self.released {
            return;
        }
        log::info!("[Session] Releasing");
        self.jobs.shutdown().await;
        self.generation.bump();
        self.released = true;
        self.player.release();
        self.active = None;
        self.playlist = None;
        self.publish(|s| {
            *s = SessionSnapshot {
                state: SessionState::Released,
                ..SessionSnapshot::default()
            };
        });
    }

    async fn advance_to_next(&mut self) -> Result<()> {
        self.set_state(SessionState::Switching(SwitchReason::PlaylistAdvance));
        self.publish(|s| s.next_up = None);
        self.advance_playlist().await
    }

    /// Play the next playlist item, moving past items that cannot be played.
    async fn advance_playlist(&mut self) -> Result<()> {
        let mut last_failure: Option<PlaybackError> = None;
        loop {
            let next = match self.playlist.as_mut() {
                Some(cursor) => cursor.get_and_advance().cloned(),
                None => Err(PlaylistError::Empty),
            };
            let item = match next {
                Ok(item) => item,
                Err(exhausted) => {
                    let err = last_failure.unwrap_or_else(|| exhausted.into());
                    self.fail(&err).await;
                    return Err(err);
                }
            };

            match self.start_item(item).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_item_fatal() => {
                    log::warn!("[Session] Skipping unplayable item: {err}");
                    let notice = err.to_string();
                    self.publish(|s| s.notice = Some(notice));
                    last_failure = Some(err);
                }
                Err(err) => {
                    self.fail(&err).await;
                    return Err(err);
                }
            }
        }
    }

    /// Load `item` from scratch under a new generation. Leaves error state
    /// handling to the caller.
    async fn start_item(&mut self, item: PlaybackItem) -> Result<()> {
        self.jobs.shutdown().await;
        let generation = self.generation.bump();
        self.subtitles.reset();
        self.active = None;

        let item_id = item.id;
        let title = item.display_title();
        log::info!("[Session] Preparing {title} ({item_id}), generation {generation}");
        self.publish(|s| {
            s.state = SessionState::Preparing;
            s.item_id = Some(item_id);
            s.title = Some(title);
            s.play_method = None;
            s.selection = TrackSelection::default();
            s.segment_prompt = None;
            s.subtitle_search = SubtitleSearchState::Idle;
            s.next_up = None;
        });

        let selection = self.load_preferences(item_id).await;
        self.load_media(item, selection, Duration::ZERO).await?;
        self.set_state(SessionState::Playing);
        self.spawn_segment_runner(generation);
        Ok(())
    }

    /// Re-negotiate and reload the current item at the current position.
    async fn switch(&mut self, reason: SwitchReason) -> Result<()> {
        let Some(active) = self.active.take() else {
            return Err(PlaybackError::InvalidState("no item is playing".into()));
        };
        let position = self.player.position();
        log::info!("[Session] Switching ({reason}) at {position:?}");
        self.set_state(SessionState::Switching(reason));

        match self.load_media(active.item, active.selection, position).await {
            Ok(()) => {
                self.set_state(SessionState::Playing);
                Ok(())
            }
            Err(err) => {
                self.fail(&err).await;
                Err(err)
            }
        }
    }

    async fn load_media(
        &mut self,
        item: PlaybackItem,
        selection: TrackSelection,
        position: Duration,
    ) -> Result<()> {
        let request = StreamRequest {
            max_bitrate: self.config.max_streaming_bitrate,
            ..StreamRequest::new(item.id)
                .with_source(item.media_sources.first().map(|s| s.id.clone()))
                .with_selection(selection)
                .starting_at(position)
        };
        let decision = self.selector.select(request).await?;

        let resolved = selection.resolve_against(&decision.media_source);
        let external_subtitle = self.external_attachment(&decision, resolved.subtitle);
        let attached_external = external_subtitle.as_ref().map(|e| e.stream_index);

        // drop notifications that belong to the previous load
        self.player_events = self.player.subscribe();
        self.player.load(MediaLoadRequest {
            url: decision.url.clone(),
            start_position: position,
            external_subtitle,
        })?;

        let play_method = decision.play_method;
        self.publish(|s| {
            s.play_method = Some(play_method);
            s.selection = selection;
        });
        self.active = Some(ActiveItem {
            item,
            decision,
            selection,
            attached_external,
            pending_track_application: true,
        });

        self.player.play();
        self.wait_until_ready().await
    }

    fn external_attachment(
        &self,
        decision: &StreamDecision,
        subtitle: TrackIndex,
    ) -> Option<ExternalSubtitle> {
        let index = subtitle.concrete()?;
        let stream = decision
            .media_source
            .stream(index)
            .filter(|stream| stream.is_external_subtitle())?;
        let delivery = stream.delivery_url.as_deref()?;

        match join_server_path(self.selector.base_url(), delivery) {
            Ok(url) => Some(ExternalSubtitle {
                stream_index: index,
                url,
                language: stream.language.clone(),
                codec: stream.codec.clone(),
            }),
            Err(err) => {
                log::warn!("[Session] Bad subtitle delivery url {delivery:?}: {err}");
                None
            }
        }
    }

    async fn wait_until_ready(&mut self) -> Result<()> {
        let timeout = self.config.prepare_timeout();
        let deadline = Instant::now() + timeout;

        loop {
            let event = match tokio::time::timeout_at(
                deadline,
                next_event(&mut self.player_events),
            )
            .await
            {
                Ok(Some(event)) => event,
                Ok(None) => return Err(PlayerError::Released.into()),
                Err(_) => return Err(PlaybackError::PrepareTimeout(timeout)),
            };

            match event {
                PlayerEvent::TracksParsed => self.apply_pending_tracks(),
                PlayerEvent::FirstFrameReady => return Ok(()),
                PlayerEvent::Error { error, fatal: true } => {
                    return Err(error.into());
                }
                PlayerEvent::Error { error, fatal: false } => {
                    log::warn!("[Session] Player reported {error} while preparing");
                }
                PlayerEvent::EndOfStream => {
                    log::debug!("[Session] End of stream before first frame");
                }
            }
        }
    }

    /// One-shot application of the selection after a load.
    fn apply_pending_tracks(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if !active.pending_track_application {
            return;
        }

        let report = TrackIndexMapper::map_and_apply(
            &active.decision.media_source,
            self.player.as_ref(),
            active.decision.play_method,
            &active.selection,
        );
        if report.tracks_parsed {
            active.pending_track_application = false;
            log::debug!(
                "[Session] Applied track selection ({} commands, {} failed)",
                report.commands_issued,
                report.commands_failed
            );
        }
    }

    /// In-place re-application after a user track change.
    fn reapply_tracks(&mut self) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        TrackIndexMapper::map_and_apply(
            &active.decision.media_source,
            self.player.as_ref(),
            active.decision.play_method,
            &active.selection,
        );
    }

    fn spawn_segment_runner(&mut self, generation: u64) {
        let Some(item_id) = self.active.as_ref().map(|active| active.item.id) else {
            return;
        };
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let runner = SegmentRunner {
            probe: PlayerProbe::new(Arc::clone(&self.player)),
            service: Arc::clone(&self.services.segments),
            item_id,
            config: self.config.segments,
            generation,
            events: self.background_tx.clone(),
            commands,
            cancel: self.jobs.token(),
        };
        self.jobs.set_segment_commands(commands_tx);
        self.jobs.spawn(runner.run());
    }

    fn spawn_next_up_countdown(&mut self, countdown: Duration) {
        let generation = self.generation.current();
        let events = self.background_tx.clone();
        let cancel = self.jobs.token();
        self.jobs.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(countdown) => {
                    let _ = events.send(BackgroundEvent::new(
                        generation,
                        BackgroundEventKind::NextUpElapsed,
                    ));
                }
            }
        });
    }

    async fn handle_player_event(&mut self, event: PlayerEvent) -> Result<()> {
        match event {
            PlayerEvent::TracksParsed => {
                self.apply_pending_tracks();
                Ok(())
            }
            PlayerEvent::FirstFrameReady => Ok(()),
            PlayerEvent::EndOfStream => self.on_end_of_stream().await,
            PlayerEvent::Error { error, fatal: true } => {
                let err = PlaybackError::from(error);
                self.fail(&err).await;
                Err(err)
            }
            PlayerEvent::Error { error, fatal: false } => {
                log::warn!("[Session] Recoverable player error: {error}");
                let notice = error.to_string();
                self.publish(|s| s.notice = Some(notice));
                Ok(())
            }
        }
    }

    async fn handle_background_event(&mut self, event: BackgroundEvent) -> Result<()> {
        if event.generation != self.generation.current() {
            log::debug!(
                "[Session] Dropping stale event from generation {}",
                event.generation
            );
            return Ok(());
        }

        match event.kind {
            BackgroundEventKind::Segment(event) => {
                self.on_segment_event(event);
                Ok(())
            }
            BackgroundEventKind::SubtitleAcquired(result) => {
                self.on_subtitle_acquired(result).await
            }
            BackgroundEventKind::NextUpElapsed => {
                if self.snapshot.borrow().next_up.is_none() {
                    return Ok(());
                }
                log::info!("[Session] Next-up countdown elapsed, advancing");
                self.advance_to_next().await
            }
        }
    }

    fn on_segment_event(&mut self, event: SegmentEvent) {
        match event {
            SegmentEvent::Prompt(segment) => {
                self.publish(|s| s.segment_prompt = Some(segment));
            }
            SegmentEvent::ClearPrompt | SegmentEvent::Skipped(_) => {
                let skipping = self.state()
                    == SessionState::Switching(SwitchReason::SegmentSkip);
                self.publish(|s| {
                    s.segment_prompt = None;
                    if skipping {
                        s.state = SessionState::Playing;
                    }
                });
            }
        }
    }

    async fn on_subtitle_acquired(
        &mut self,
        result: std::result::Result<SubtitleAcquired, PlaybackError>,
    ) -> Result<()> {
        let acquired = match result {
            Ok(acquired) => acquired,
            Err(PlaybackError::Cancelled(_)) => return Ok(()),
            Err(err) => {
                log::warn!("[Session] Subtitle acquisition failed: {err}");
                let state = self.subtitles.state();
                let notice = err.to_string();
                self.publish(|s| {
                    s.subtitle_search = state;
                    s.notice = Some(notice);
                });
                return Ok(());
            }
        };

        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };
        if active.decision.media_source.streams != acquired.baseline {
            log::warn!(
                "[Session] Streams changed while subtitle {} was polled, not switching",
                acquired.new_stream_index
            );
            self.publish(|s| s.subtitle_search = SubtitleSearchState::Idle);
            return Ok(());
        }
        active.decision.media_source.streams = acquired.streams;
        // the new external subtitle sits ahead of the audio streams
        let selection = TrackSelection {
            subtitle: TrackIndex::Index(acquired.new_stream_index),
            ..active.selection.shift_audio_for_inserted_subtitle()
        };
        active.selection = selection;
        let item_id = active.item.id;

        log::info!(
            "[Session] Switching to downloaded subtitle {}",
            acquired.new_stream_index
        );
        self.persist_selection(item_id, selection).await;
        self.publish(|s| {
            s.selection = selection;
            s.subtitle_search = SubtitleSearchState::Idle;
        });
        self.switch(SwitchReason::Subtitle).await
    }

    async fn on_end_of_stream(&mut self) -> Result<()> {
        match self.state() {
            SessionState::Playing => {}
            // an accepted skip can seek straight to the end
            SessionState::Switching(SwitchReason::SegmentSkip) => {
                self.set_state(SessionState::Playing);
            }
            _ => return Ok(()),
        }

        let next = self
            .playlist
            .as_ref()
            .and_then(PlaylistCursor::peek_next)
            .map(|item| (item.id, item.display_title()));
        let Some((item_id, title)) = next else {
            log::info!("[Session] Playlist finished");
            return self.stop().await;
        };

        let auto_advance_in = match self.autoplay.decide() {
            AutoPlayDecision::Countdown(countdown) => Some(countdown),
            AutoPlayDecision::WaitForConfirmation => {
                log::info!(
                    "[Session] No interaction for {:?}, waiting for confirmation",
                    self.autoplay.since_interaction()
                );
                None
            }
        };
        if let Some(countdown) = auto_advance_in {
            self.spawn_next_up_countdown(countdown);
        }

        self.publish(|s| {
            s.segment_prompt = None;
            s.next_up = Some(NextUp {
                item_id,
                title,
                auto_advance_in,
            });
        });
        Ok(())
    }

    async fn load_preferences(&self, item_id: ItemId) -> TrackSelection {
        match self.services.preferences.load(self.user_id, item_id).await {
            Ok(selection) => selection.unwrap_or_default(),
            Err(err) => {
                log::warn!("[Session] Failed to load track preferences: {err}");
                TrackSelection::default()
            }
        }
    }

    async fn persist_selection(&self, item_id: ItemId, selection: TrackSelection) {
        if let Err(err) = self
            .services
            .preferences
            .save(self.user_id, item_id, selection)
            .await
        {
            log::warn!("[Session] Failed to save track preferences: {err}");
        }
    }

    async fn fail(&mut self, err: &PlaybackError) {
        if matches!(err, PlaybackError::Cancelled(_)) {
            return;
        }
        log::error!("[Session] Playback failed: {err}");
        self.jobs.shutdown().await;
        self.player.pause();
        self.active = None;
        let message = err.to_string();
        self.publish(|s| {
            s.state = SessionState::Error(message);
            s.segment_prompt = None;
            s.next_up = None;
        });
    }

    fn active_mut(&mut self) -> Result<&mut ActiveItem> {
        self.active
            .as_mut()
            .ok_or_else(|| PlaybackError::InvalidState("no item is playing".into()))
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.released {
            Err(PlaybackError::InvalidState("session released".into()))
        } else {
            Ok(())
        }
    }

    fn ensure_media(&self) -> Result<()> {
        if self.state().has_media() {
            Ok(())
        } else {
            Err(PlaybackError::InvalidState("no item is playing".into()))
        }
    }

    fn set_state(&self, state: SessionState) {
        log::debug!("[Session] State -> {state}");
        self.publish(|s| s.state = state);
    }

    fn publish(&self, update: impl FnOnce(&mut SessionSnapshot)) {
        let mut next = self.snapshot.borrow().clone();
        update(&mut next);
        next.generation = self.generation.current();
        self.snapshot.send_replace(next);
    }
}

impl<P: PlayerEngine> Drop for PlaybackSessionController<P> {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            self.player.release();
        }
    }
}
