mod common;

use std::time::Duration;

use common::*;
use playhead_player::domains::player::{TrackGroup, TrackGroupId, TrackKind};
use playhead_player::domains::session::SessionState;
use playhead_player::prelude::*;

const DELIVERY: &str = "/Videos/ikiru/Subtitles/1/Stream.srt";

/// Descriptors after the server fetched the Spanish subtitle: it lands at
/// index 1, pushing every audio stream up by one.
fn streams_after_download() -> Vec<MediaStream> {
    vec![
        MediaStream::video(0),
        MediaStream::external_subtitle(1, DELIVERY)
            .with_language("spa")
            .with_codec("srt"),
        MediaStream::audio(2).with_language("eng"),
        MediaStream::audio(3).with_language("fra"),
        MediaStream::subtitle(4).with_language("eng").with_codec("subrip"),
    ]
}

fn spanish() -> RemoteSubtitleCandidate {
    RemoteSubtitleCandidate::new("os-991", "Ikiru.1952.spa.srt", "spa", "OpenSubtitles")
}

fn setup() -> (Harness, PlaybackItem) {
    let h = Harness::new();
    let item = PlaybackItem::new(ItemId::new(), "Ikiru", ItemKind::Movie)
        .with_source(direct_play_source("ikiru", standard_streams()));
    h.serve(std::slice::from_ref(&item));
    let mut groups = standard_groups();
    groups.push(TrackGroup::new("X0", TrackKind::Text).external());
    h.player.set_groups(groups);
    h.server.set_candidates(vec![spanish()]);
    (h, item)
}

#[tokio::test(start_paused = true)]
async fn downloaded_subtitle_is_selected_and_audio_index_follows_the_shift() {
    let (h, item) = setup();
    h.server
        .stage_download(item.id, streams_after_download(), 1);

    let mut session = h.controller(quiet_config());
    session.play_item(item.clone()).await.unwrap();
    session.select_audio(TrackIndex::Index(2)).await.unwrap();
    h.player.set_position(Duration::from_secs(300));

    let found = session
        .search_subtitles(Some("spa".to_string()))
        .await
        .unwrap();
    assert_eq!(found, vec![spanish()]);
    assert_eq!(
        session.snapshot().subtitle_search,
        SubtitleSearchState::Results(vec![spanish()])
    );

    session.download_subtitle(spanish()).unwrap();
    assert_eq!(
        session.snapshot().subtitle_search,
        SubtitleSearchState::Downloading
    );

    let expected = TrackSelection::new(TrackIndex::Index(3), TrackIndex::Index(1));
    let switched = pump_until(&mut session, 10, |s| {
        s.snapshot().selection == expected && s.state() == SessionState::Playing
    })
    .await;
    assert!(switched);

    assert_eq!(h.server.downloads(), vec!["os-991".to_string()]);
    assert_eq!(h.server.stream_fetches(), 2);

    let loads = h.player.loads();
    assert_eq!(loads.len(), 2);
    assert_eq!(loads[1].start_position, Duration::from_secs(300));
    assert_eq!(
        loads[1].external_subtitle.as_ref().map(|e| e.stream_index),
        Some(1)
    );
    assert_eq!(
        h.player.selected().last(),
        Some(&TrackGroupId::new("X0"))
    );
    assert_eq!(h.preferences.get(h.user_id, item.id), Some(expected));
    assert_eq!(session.snapshot().subtitle_search, SubtitleSearchState::Idle);
}

#[tokio::test(start_paused = true)]
async fn second_download_is_refused_while_one_is_in_flight() {
    let (h, item) = setup();
    h.server
        .stage_download(item.id, streams_after_download(), 1);

    let mut session = h.controller(quiet_config());
    session.play_item(item.clone()).await.unwrap();
    session.select_audio(TrackIndex::Index(2)).await.unwrap();

    session.download_subtitle(spanish()).unwrap();
    let err = session.download_subtitle(spanish()).unwrap_err();
    assert!(matches!(err, PlaybackError::InvalidState(_)));

    let expected = TrackSelection::new(TrackIndex::Index(3), TrackIndex::Index(1));
    let switched = pump_until(&mut session, 10, |s| {
        s.snapshot().selection == expected && s.state() == SessionState::Playing
    })
    .await;
    assert!(switched);

    // nothing else arrives to shift the audio a second time
    let shifted_again =
        pump_until(&mut session, 3, |s| s.snapshot().selection != expected).await;
    assert!(!shifted_again);
    assert_eq!(h.server.downloads().len(), 1);
    assert_eq!(h.preferences.get(h.user_id, item.id), Some(expected));

    // finished: another download may start
    session.download_subtitle(spanish()).unwrap();
}

#[tokio::test(start_paused = true)]
async fn subtitle_that_never_appears_times_out_without_reloading() {
    let (h, item) = setup();

    let mut session = h.controller(quiet_config());
    session.play_item(item).await.unwrap();
    session.download_subtitle(spanish()).unwrap();

    let reported = pump_until(&mut session, 5, |s| s.snapshot().notice.is_some()).await;
    assert!(reported);

    let attempts = quiet_config().subtitles.poll_attempts;
    assert_eq!(h.server.stream_fetches(), attempts as usize);
    assert!(matches!(
        session.snapshot().subtitle_search,
        SubtitleSearchState::Error(_)
    ));
    assert_eq!(session.state(), SessionState::Playing);
    assert_eq!(h.player.loads().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn search_uses_configured_language_when_none_given() {
    let (h, item) = setup();
    let mut config = quiet_config();
    config.subtitles.preferred_language = Some("spa".into());

    let mut session = h.controller(config);
    session.play_item(item).await.unwrap();

    let found = session.search_subtitles(None).await.unwrap();
    assert_eq!(found, vec![spanish()]);
}

#[tokio::test(start_paused = true)]
async fn search_falls_back_to_english() {
    let (h, item) = setup();

    let mut session = h.controller(quiet_config());
    session.play_item(item).await.unwrap();

    // only a Spanish candidate exists
    let found = session.search_subtitles(None).await.unwrap();
    assert!(found.is_empty());
    assert_eq!(
        session.snapshot().subtitle_search,
        SubtitleSearchState::Results(Vec::new())
    );
}

#[tokio::test(start_paused = true)]
async fn moving_to_another_item_abandons_the_poll() {
    let (h, item) = setup();
    let next = movie("Rashomon");
    h.serve(std::slice::from_ref(&next));
    h.server
        .stage_download(item.id, streams_after_download(), 0);

    let mut session = h.controller(quiet_config());
    session.play_item(item).await.unwrap();
    session.download_subtitle(spanish()).unwrap();
    let first_generation = session.generation();

    session.play_item(next.clone()).await.unwrap();
    assert!(session.generation() > first_generation);

    let switched = pump_until(&mut session, 3, |s| {
        s.snapshot().selection.subtitle != TrackIndex::Unspecified
    })
    .await;
    assert!(!switched);

    assert_eq!(h.server.stream_fetches(), 0);
    assert_eq!(h.player.loads().len(), 2);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.item_id, Some(next.id));
    assert_eq!(snapshot.subtitle_search, SubtitleSearchState::Idle);
    assert_eq!(snapshot.notice, None);
}

#[tokio::test(start_paused = true)]
async fn subtitle_actions_need_a_playing_item() {
    let (h, _) = setup();
    let mut session = h.controller(quiet_config());

    let err = session.download_subtitle(spanish()).unwrap_err();
    assert!(matches!(err, PlaybackError::InvalidState(_)));
    let err = session.search_subtitles(None).await.unwrap_err();
    assert!(matches!(err, PlaybackError::InvalidState(_)));
}
