use playhead_model::{ItemId, MediaSource, PlaySessionId, TrackIndex};
use url::{ParseError, Url};

/// `{base}/Videos/{item}/{file}` with the base path preserved.
fn videos_url(base: &Url, item_id: &ItemId, file: &str) -> Result<Url, ParseError> {
    let mut url = base.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .push("Videos")
        .push(&item_id.as_simple())
        .push(file);
    Ok(url)
}

pub fn direct_play_url(
    base: &Url,
    item_id: &ItemId,
    source: &MediaSource,
    session: &PlaySessionId,
) -> Result<Url, ParseError> {
    let mut url = videos_url(base, item_id, "stream")?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("static", "true")
            .append_pair("mediaSourceId", source.id.as_str())
            .append_pair("playSessionId", session.as_str());
        if let Some(tag) = &source.etag {
            query.append_pair("Tag", tag);
        }
    }
    Ok(url)
}

pub fn direct_stream_url(
    base: &Url,
    item_id: &ItemId,
    source: &MediaSource,
    session: &PlaySessionId,
    audio: TrackIndex,
    subtitle: TrackIndex,
) -> Result<Url, ParseError> {
    let file = match source.container.as_deref() {
        Some(container) if !container.is_empty() => format!("stream.{container}"),
        _ => "stream".to_string(),
    };
    let mut url = videos_url(base, item_id, &file)?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("mediaSourceId", source.id.as_str())
            .append_pair("playSessionId", session.as_str());
        if let Some(audio) = audio.to_wire() {
            query.append_pair("audioStreamIndex", &audio.to_string());
        }
        if let Some(subtitle) = subtitle.to_wire() {
            query.append_pair("subtitleStreamIndex", &subtitle.to_string());
        }
    }
    Ok(url)
}

/// Resolve a server-provided path (transcoding or subtitle delivery URL),
/// usually root-relative, against the base URL.
pub fn join_server_path(base: &Url, path: &str) -> Result<Url, ParseError> {
    match Url::parse(path) {
        Ok(absolute) => Ok(absolute),
        Err(ParseError::RelativeUrlWithoutBase) => {
            let root = base.as_str().trim_end_matches('/');
            let relative = path.trim_start_matches('/');
            Url::parse(&format!("{root}/{relative}"))
        }
        Err(err) => Err(err),
    }
}
