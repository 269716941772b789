use std::collections::HashMap;
use std::fs;

use playhead_config::{ConfigLoader, ConfigSource, ConfigWarning};
use tempfile::TempDir;

fn lookup(
    vars: &[(&str, &str)],
) -> impl Fn(&str) -> Option<String> + use<> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn falls_back_to_defaults_without_sources() {
    let dir = TempDir::new().unwrap();
    let load = ConfigLoader::with_search_root(dir.path())
        .load_with(lookup(&[]))
        .unwrap();

    assert_eq!(load.source, ConfigSource::Default);
    assert_eq!(load.config.subtitles.poll_attempts, 4);
    assert!(load.warnings.is_empty());
}

#[test]
fn env_path_wins_over_default_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("playhead.toml"),
        "[subtitles]\npoll_attempts = 2\n",
    )
    .unwrap();
    let explicit = dir.path().join("custom.json");
    fs::write(&explicit, r#"{"subtitles": {"poll_attempts": 7}}"#).unwrap();

    let load = ConfigLoader::with_search_root(dir.path())
        .load_with(lookup(&[(
            "PLAYHEAD_CONFIG_PATH",
            explicit.to_str().unwrap(),
        )]))
        .unwrap();

    assert_eq!(load.source, ConfigSource::EnvPath(explicit));
    assert_eq!(load.config.subtitles.poll_attempts, 7);
}

#[test]
fn default_file_is_discovered() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("config")).unwrap();
    let path = dir.path().join("config/playhead.toml");
    fs::write(&path, "[seek]\nforward_step_ms = 10000\n").unwrap();

    let load = ConfigLoader::with_search_root(dir.path())
        .load_with(lookup(&[]))
        .unwrap();

    assert_eq!(load.source, ConfigSource::File(path));
    assert_eq!(load.config.seek.forward_step_ms, 10_000);
    assert_eq!(load.config.seek.backward_step_ms, 15_000);
}

#[test]
fn inline_json_and_server_override() {
    let dir = TempDir::new().unwrap();
    let load = ConfigLoader::with_search_root(dir.path())
        .load_with(lookup(&[
            ("PLAYHEAD_CONFIG_JSON", r#"{"subtitles": {"poll_attempts": 0}}"#),
            ("PLAYHEAD_SERVER_URL", "https://jf.example.org"),
        ]))
        .unwrap();

    assert_eq!(load.source, ConfigSource::EnvInline);
    assert_eq!(load.config.server_url, "https://jf.example.org");
    assert!(load.warnings.contains(&ConfigWarning::ZeroSubtitlePollBudget));
}

#[test]
fn malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "seek = [").unwrap();

    let err = ConfigLoader::load_from_file(&path).unwrap_err();
    assert!(err.to_string().contains("invalid playback config"));
}
