//! Test harness for session-level playback tests
//!
//! Provides a scriptable in-process player engine and an in-memory media
//! server implementing every service trait, plus builders for the items
//! and sources the scenarios share.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use playhead_config::PlaybackConfig;
use playhead_player::domains::player::{
    MediaLoadRequest, PlayerEngine, PlayerError, PlayerEvent, TrackGroup,
    TrackGroupId, TrackKind,
};
use playhead_player::domains::session::PlaybackSessionController;
use playhead_player::infra::services::{
    MediaInfoService, MemoryPreferenceStore, PlaybackErrorCode,
    PlaybackInfoRequest, PlaybackInfoResponse, PlaybackServices,
    RemoteSubtitleService, SegmentService, ServiceError, ServiceResult,
    StreamDescriptionService,
};
use playhead_model::prelude::*;
use tokio::sync::broadcast;

/// Route engine logs to the test output when `RUST_LOG` is set.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Commands the fake player received, in order.
#[derive(Debug, Clone, Default)]
pub struct PlayerLog {
    pub loads: Vec<MediaLoadRequest>,
    pub seeks: Vec<Duration>,
    pub selected: Vec<TrackGroupId>,
    pub disabled: Vec<TrackKind>,
    pub releases: usize,
}

#[derive(Debug)]
struct PlayerInner {
    log: PlayerLog,
    position: Duration,
    duration: Option<Duration>,
    playing: bool,
    groups: Vec<TrackGroup>,
    ready_on_load: bool,
    fail_loads: usize,
}

/// In-process stand-in for the native engine.
///
/// Every load reports `TracksParsed` then `FirstFrameReady` unless told
/// otherwise; tests drive the clock with [`FakePlayer::set_position`].
#[derive(Debug)]
pub struct FakePlayer {
    events: broadcast::Sender<PlayerEvent>,
    inner: Mutex<PlayerInner>,
}

impl FakePlayer {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            events,
            inner: Mutex::new(PlayerInner {
                log: PlayerLog::default(),
                position: Duration::ZERO,
                duration: Some(Duration::from_secs(45 * 60)),
                playing: false,
                groups: Vec::new(),
                ready_on_load: true,
                fail_loads: 0,
            }),
        })
    }

    pub fn set_groups(&self, groups: Vec<TrackGroup>) {
        self.inner.lock().groups = groups;
    }

    pub fn set_position(&self, position: Duration) {
        self.inner.lock().position = position;
    }

    pub fn set_ready_on_load(&self, ready: bool) {
        self.inner.lock().ready_on_load = ready;
    }

    /// Make the next `count` loads fail with a fatal decode error.
    pub fn fail_next_loads(&self, count: usize) {
        self.inner.lock().fail_loads = count;
    }

    pub fn emit(&self, event: PlayerEvent) {
        let _ = self.events.send(event);
    }

    pub fn log(&self) -> PlayerLog {
        self.inner.lock().log.clone()
    }

    pub fn loads(&self) -> Vec<MediaLoadRequest> {
        self.inner.lock().log.loads.clone()
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.inner.lock().log.seeks.clone()
    }

    pub fn selected(&self) -> Vec<TrackGroupId> {
        self.inner.lock().log.selected.clone()
    }

    pub fn releases(&self) -> usize {
        self.inner.lock().log.releases
    }
}

impl PlayerEngine for FakePlayer {
    fn load(&self, request: MediaLoadRequest) -> Result<(), PlayerError> {
        let (ready, failing) = {
            let mut inner = self.inner.lock();
            if inner.log.releases > 0 {
                return Err(PlayerError::Released);
            }
            inner.position = request.start_position;
            inner.log.loads.push(request);
            let failing = inner.fail_loads > 0;
            if failing {
                inner.fail_loads -= 1;
            }
            (inner.ready_on_load, failing)
        };

        if failing {
            self.emit(PlayerEvent::Error {
                error: PlayerError::Decode("unsupported codec".into()),
                fatal: true,
            });
        } else if ready {
            self.emit(PlayerEvent::TracksParsed);
            self.emit(PlayerEvent::FirstFrameReady);
        }
        Ok(())
    }

    fn play(&self) {
        self.inner.lock().playing = true;
    }

    fn pause(&self) {
        self.inner.lock().playing = false;
    }

    fn is_playing(&self) -> bool {
        self.inner.lock().playing
    }

    fn seek(&self, position: Duration) {
        let mut inner = self.inner.lock();
        inner.position = position;
        inner.log.seeks.push(position);
    }

    fn position(&self) -> Duration {
        self.inner.lock().position
    }

    fn duration(&self) -> Option<Duration> {
        self.inner.lock().duration
    }

    fn track_groups(&self) -> Vec<TrackGroup> {
        self.inner.lock().groups.clone()
    }

    fn select_track(&self, group: &TrackGroupId) -> Result<(), PlayerError> {
        let mut inner = self.inner.lock();
        if !inner.groups.iter().any(|g| &g.id == group) {
            return Err(PlayerError::UnknownTrack(group.clone()));
        }
        inner.log.selected.push(group.clone());
        Ok(())
    }

    fn disable_tracks(&self, kind: TrackKind) {
        self.inner.lock().log.disabled.push(kind);
    }

    fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    fn release(&self) {
        let mut inner = self.inner.lock();
        inner.log.releases += 1;
        inner.playing = false;
    }
}

/// Descriptors the server reports once a staged download has landed.
#[derive(Debug)]
struct StagedDownload {
    item_id: ItemId,
    streams_after: Vec<MediaStream>,
    /// Descriptor fetches that still return the old list.
    fetches_before_visible: usize,
    armed: bool,
}

#[derive(Debug, Default)]
struct ServerInner {
    sources: HashMap<ItemId, MediaSource>,
    rejected: HashMap<ItemId, PlaybackErrorCode>,
    unreachable: bool,
    segments: HashMap<ItemId, Vec<Segment>>,
    candidates: Vec<RemoteSubtitleCandidate>,
    staged: Option<StagedDownload>,
    negotiations: Vec<PlaybackInfoRequest>,
    stream_fetches: usize,
    downloads: Vec<String>,
}

/// In-memory media server implementing every engine-facing service.
#[derive(Debug, Default)]
pub struct FakeServer {
    inner: Mutex<ServerInner>,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Serve the item's first source on negotiation.
    pub fn add_item(&self, item: &PlaybackItem) {
        if let Some(source) = item.media_sources.first() {
            self.inner.lock().sources.insert(item.id, source.clone());
        }
    }

    pub fn reject(&self, item_id: ItemId, code: PlaybackErrorCode) {
        self.inner.lock().rejected.insert(item_id, code);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.inner.lock().unreachable = unreachable;
    }

    pub fn set_segments(&self, item_id: ItemId, segments: Vec<Segment>) {
        self.inner.lock().segments.insert(item_id, segments);
    }

    pub fn set_candidates(&self, candidates: Vec<RemoteSubtitleCandidate>) {
        self.inner.lock().candidates = candidates;
    }

    /// After the next download, the item's descriptors become
    /// `streams_after` once `fetches_before_visible` re-fetches have passed.
    pub fn stage_download(
        &self,
        item_id: ItemId,
        streams_after: Vec<MediaStream>,
        fetches_before_visible: usize,
    ) {
        self.inner.lock().staged = Some(StagedDownload {
            item_id,
            streams_after,
            fetches_before_visible,
            armed: false,
        });
    }

    pub fn negotiations(&self) -> Vec<PlaybackInfoRequest> {
        self.inner.lock().negotiations.clone()
    }

    pub fn stream_fetches(&self) -> usize {
        self.inner.lock().stream_fetches
    }

    pub fn downloads(&self) -> Vec<String> {
        self.inner.lock().downloads.clone()
    }
}

#[async_trait]
impl MediaInfoService for FakeServer {
    async fn negotiate(
        &self,
        request: PlaybackInfoRequest,
    ) -> ServiceResult<PlaybackInfoResponse> {
        let mut inner = self.inner.lock();
        if inner.unreachable {
            return Err(ServiceError::Network("connection refused".into()));
        }
        let item_id = request.item_id;
        inner.negotiations.push(request);
        let session = PlaySessionId::new(format!("ps-{}", inner.negotiations.len()));

        if let Some(code) = inner.rejected.get(&item_id) {
            return Ok(PlaybackInfoResponse {
                error_code: Some(*code),
                ..PlaybackInfoResponse::default()
            });
        }

        Ok(PlaybackInfoResponse {
            media_sources: inner.sources.get(&item_id).cloned().into_iter().collect(),
            play_session_id: Some(session),
            error_code: None,
        })
    }
}

#[async_trait]
impl StreamDescriptionService for FakeServer {
    async fn fetch_streams(
        &self,
        item_id: ItemId,
        _source_id: MediaSourceId,
    ) -> ServiceResult<Vec<MediaStream>> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.stream_fetches += 1;

        let landed = match inner.staged.as_mut() {
            Some(staged) if staged.armed && staged.item_id == item_id => {
                if staged.fetches_before_visible == 0 {
                    true
                } else {
                    staged.fetches_before_visible -= 1;
                    false
                }
            }
            _ => false,
        };
        if landed
            && let Some(staged) = inner.staged.take()
            && let Some(source) = inner.sources.get_mut(&item_id)
        {
            source.streams = staged.streams_after;
        }

        inner
            .sources
            .get(&item_id)
            .map(|source| source.streams.clone())
            .ok_or_else(|| ServiceError::NotFound(item_id.to_string()))
    }
}

#[async_trait]
impl SegmentService for FakeServer {
    async fn fetch_segments(&self, item_id: ItemId) -> ServiceResult<Vec<Segment>> {
        Ok(self
            .inner
            .lock()
            .segments
            .get(&item_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl RemoteSubtitleService for FakeServer {
    async fn search(
        &self,
        _item_id: ItemId,
        language: String,
    ) -> ServiceResult<Vec<RemoteSubtitleCandidate>> {
        Ok(self
            .inner
            .lock()
            .candidates
            .iter()
            .filter(|candidate| candidate.language == language)
            .cloned()
            .collect())
    }

    async fn download(
        &self,
        _source_id: MediaSourceId,
        subtitle_id: String,
    ) -> ServiceResult<()> {
        let mut inner = self.inner.lock();
        inner.downloads.push(subtitle_id);
        if let Some(staged) = inner.staged.as_mut() {
            staged.armed = true;
        }
        Ok(())
    }
}

/// Player, server and preference store wired into one session.
pub struct Harness {
    pub player: Arc<FakePlayer>,
    pub server: Arc<FakeServer>,
    pub preferences: Arc<MemoryPreferenceStore>,
    pub user_id: UserId,
}

impl Harness {
    pub fn new() -> Self {
        init_logging();
        Self {
            player: FakePlayer::new(),
            server: FakeServer::new(),
            preferences: Arc::new(MemoryPreferenceStore::new()),
            user_id: UserId::new(),
        }
    }

    pub fn services(&self) -> PlaybackServices {
        PlaybackServices {
            media_info: self.server.clone(),
            streams: self.server.clone(),
            segments: self.server.clone(),
            subtitles: self.server.clone(),
            preferences: self.preferences.clone(),
        }
    }

    pub fn controller(&self, config: PlaybackConfig) -> PlaybackSessionController<FakePlayer> {
        PlaybackSessionController::new(
            Arc::clone(&self.player),
            self.services(),
            config,
            DeviceProfile::new("test-device"),
            self.user_id,
        )
        .expect("valid test config")
    }

    /// Register items with the server and return them as a playlist.
    pub fn serve(&self, items: &[PlaybackItem]) -> Vec<PlaybackItem> {
        for item in items {
            self.server.add_item(item);
        }
        items.to_vec()
    }
}

/// Config with the segment runner off unless a test turns it on.
pub fn quiet_config() -> PlaybackConfig {
    let mut config = PlaybackConfig::default();
    config.segments.policies = SegmentPolicies::disabled();
    config
}

pub fn source_id(id: &str) -> MediaSourceId {
    MediaSourceId::new(id).expect("valid source id")
}

/// video 0, audio 1 (eng), audio 2 (fra), embedded subtitle 3 (eng)
pub fn standard_streams() -> Vec<MediaStream> {
    vec![
        MediaStream::video(0),
        MediaStream::audio(1).with_language("eng"),
        MediaStream::audio(2).with_language("fra"),
        MediaStream::subtitle(3).with_language("eng").with_codec("subrip"),
    ]
}

pub fn direct_play_source(id: &str, streams: Vec<MediaStream>) -> MediaSource {
    let mut source = MediaSource::new(source_id(id));
    source.container = Some("mkv".into());
    source.supports_direct_play = true;
    source.streams = streams;
    source
}

pub fn transcode_source(id: &str, streams: Vec<MediaStream>) -> MediaSource {
    let mut source = MediaSource::new(source_id(id));
    source.supports_transcoding = true;
    source.transcoding_url = Some(format!("/videos/{id}/master.m3u8"));
    source.streams = streams;
    source
}

pub fn movie(name: &str) -> PlaybackItem {
    PlaybackItem::new(ItemId::new(), name, ItemKind::Movie)
        .with_run_time(Duration::from_secs(45 * 60))
        .with_source(direct_play_source(name, standard_streams()))
}

pub fn episode(series: &str, name: &str) -> PlaybackItem {
    let mut item = PlaybackItem::new(ItemId::new(), name, ItemKind::Episode)
        .with_source(direct_play_source(name, standard_streams()));
    item.series_name = Some(series.to_string());
    item
}

/// Native groups for [`standard_streams`], in container order.
pub fn standard_groups() -> Vec<TrackGroup> {
    vec![
        TrackGroup::new("V0", TrackKind::Video),
        TrackGroup::new("A0", TrackKind::Audio),
        TrackGroup::new("A1", TrackKind::Audio),
        TrackGroup::new("T0", TrackKind::Text),
    ]
}

/// Quiet period after which [`pump_until`] gives up waiting for an event.
pub const PUMP_IDLE: Duration = Duration::from_secs(120);

/// Pump the session until `done` holds, `limit` events were handled, or no
/// event arrives for [`PUMP_IDLE`] of (paused) time.
pub async fn pump_until<F>(
    session: &mut PlaybackSessionController<FakePlayer>,
    limit: usize,
    mut done: F,
) -> bool
where
    F: FnMut(&PlaybackSessionController<FakePlayer>) -> bool,
{
    for _ in 0..limit {
        if done(session) {
            return true;
        }
        match tokio::time::timeout(PUMP_IDLE, session.pump()).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) | Err(_) => return done(session),
        }
    }
    done(session)
}
