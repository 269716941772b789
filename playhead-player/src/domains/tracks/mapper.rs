use playhead_model::{
    MediaSource, MediaStream, PlayMethod, StreamKind, TrackIndex,
    TrackSelection,
};

use crate::domains::player::{PlayerEngine, TrackGroup, TrackGroupId, TrackKind};

/// Why a desired track could not be turned into a player command.
///
/// None of these are errors; the player simply keeps its current track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMiss {
    NoPreference,
    /// The player has not reported any track groups yet.
    NotParsed,
    OutOfRange,
    /// An external subtitle was requested but none is attached to the load.
    ExternalNotLoaded,
    /// The server already muxed the requested track into the stream.
    ServerSelected,
    /// A forced subtitle exists but the player exposes no matching group.
    NoForcedStream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapOutcome {
    Select(TrackGroupId),
    Disable,
    Unchanged(MapMiss),
}

impl MapOutcome {
    pub fn is_miss(&self) -> bool {
        matches!(self, MapOutcome::Unchanged(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingPlan {
    pub audio: MapOutcome,
    pub subtitle: MapOutcome,
    /// Whether the plan was computed against parsed track groups.
    pub tracks_parsed: bool,
}

/// Result of applying a [`MappingPlan`] to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MappingReport {
    pub tracks_parsed: bool,
    pub commands_issued: usize,
    pub commands_failed: usize,
}

/// Translates server stream indices into native track-group selections.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackIndexMapper;

impl TrackIndexMapper {
    pub fn plan(
        source: &MediaSource,
        groups: &[TrackGroup],
        play_method: PlayMethod,
        selection: &TrackSelection,
    ) -> MappingPlan {
        let plan = MappingPlan {
            audio: Self::plan_audio(source, groups, play_method, selection.audio),
            subtitle: match Self::plan_subtitle(source, groups, selection.subtitle) {
                MapOutcome::Unchanged(MapMiss::OutOfRange)
                    if selection.subtitle == TrackIndex::OnlyForced =>
                {
                    MapOutcome::Unchanged(MapMiss::NoForcedStream)
                }
                outcome => outcome,
            },
            tracks_parsed: !groups.is_empty(),
        };

        for (kind, outcome) in [("audio", &plan.audio), ("subtitle", &plan.subtitle)] {
            if let MapOutcome::Unchanged(miss) = outcome
                && *miss != MapMiss::NoPreference
            {
                log::debug!(
                    "[Tracks] Index resolution miss for {kind} ({miss:?}), keeping current track"
                );
            }
        }

        plan
    }

    /// Issue the plan's commands. Failed selections are logged and counted,
    /// never raised.
    pub fn apply<P: PlayerEngine + ?Sized>(
        plan: &MappingPlan,
        player: &P,
    ) -> MappingReport {
        let mut report = MappingReport {
            tracks_parsed: plan.tracks_parsed,
            ..MappingReport::default()
        };

        for (kind, outcome) in [
            (TrackKind::Audio, &plan.audio),
            (TrackKind::Text, &plan.subtitle),
        ] {
            match outcome {
                MapOutcome::Select(group) => {
                    report.commands_issued += 1;
                    if let Err(err) = player.select_track(group) {
                        log::warn!("[Tracks] Failed to select {group}: {err}");
                        report.commands_failed += 1;
                    }
                }
                MapOutcome::Disable => {
                    report.commands_issued += 1;
                    player.disable_tracks(kind);
                }
                MapOutcome::Unchanged(_) => {}
            }
        }

        report
    }

    /// Plan against the player's current track groups and apply.
    pub fn map_and_apply<P: PlayerEngine + ?Sized>(
        source: &MediaSource,
        player: &P,
        play_method: PlayMethod,
        selection: &TrackSelection,
    ) -> MappingReport {
        let groups = player.track_groups();
        let plan = Self::plan(source, &groups, play_method, selection);
        Self::apply(&plan, player)
    }

    fn plan_audio(
        source: &MediaSource,
        groups: &[TrackGroup],
        play_method: PlayMethod,
        desired: TrackIndex,
    ) -> MapOutcome {
        let index = match desired {
            TrackIndex::Unspecified | TrackIndex::OnlyForced => {
                return MapOutcome::Unchanged(MapMiss::NoPreference);
            }
            TrackIndex::Disabled => return MapOutcome::Disable,
            TrackIndex::Index(index) => index,
        };

        if play_method != PlayMethod::DirectPlay {
            return MapOutcome::Unchanged(MapMiss::ServerSelected);
        }
        if groups.is_empty() {
            return MapOutcome::Unchanged(MapMiss::NotParsed);
        }

        let Some(position) = source
            .streams_of(StreamKind::Audio)
            .position(|stream| stream.index == index)
        else {
            return MapOutcome::Unchanged(MapMiss::OutOfRange);
        };

        groups
            .iter()
            .filter(|group| group.kind == TrackKind::Audio)
            .nth(position)
            .map(|group| MapOutcome::Select(group.id.clone()))
            .unwrap_or(MapOutcome::Unchanged(MapMiss::OutOfRange))
    }

    fn plan_subtitle(
        source: &MediaSource,
        groups: &[TrackGroup],
        desired: TrackIndex,
    ) -> MapOutcome {
        let stream = match desired {
            TrackIndex::Unspecified => {
                return MapOutcome::Unchanged(MapMiss::NoPreference);
            }
            TrackIndex::Disabled => return MapOutcome::Disable,
            TrackIndex::OnlyForced => match source.first_forced_subtitle() {
                Some(stream) => stream,
                None => return MapOutcome::Disable,
            },
            TrackIndex::Index(index) => match source.stream(index) {
                Some(stream) if stream.kind == StreamKind::Subtitle => stream,
                _ => return MapOutcome::Unchanged(MapMiss::OutOfRange),
            },
        };

        if groups.is_empty() {
            return MapOutcome::Unchanged(MapMiss::NotParsed);
        }

        if stream.is_external {
            return groups
                .iter()
                .find(|group| group.kind == TrackKind::Text && group.is_external)
                .map(|group| MapOutcome::Select(group.id.clone()))
                .unwrap_or(MapOutcome::Unchanged(MapMiss::ExternalNotLoaded));
        }

        let Some(position) = embedded_rank(source, stream) else {
            return MapOutcome::Unchanged(MapMiss::OutOfRange);
        };

        groups
            .iter()
            .filter(|group| group.kind == TrackKind::Text && !group.is_external)
            .nth(position)
            .map(|group| MapOutcome::Select(group.id.clone()))
            .unwrap_or(MapOutcome::Unchanged(MapMiss::OutOfRange))
    }
}

/// Position of `stream` among the embedded subtitle descriptors. Equal to
/// `index - embedded_subtitle_offset` for the contiguous layout servers emit.
fn embedded_rank(source: &MediaSource, stream: &MediaStream) -> Option<usize> {
    source
        .streams
        .iter()
        .filter(|s| s.is_embedded_subtitle())
        .position(|s| s.index == stream.index)
}
