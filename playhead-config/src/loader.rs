use anyhow::{Context, anyhow};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::constants::{
    DEFAULT_FILE_CANDIDATES, ENV_CONFIG_JSON, ENV_CONFIG_PATH, ENV_SERVER_URL,
};
use crate::models::PlaybackConfig;
use crate::validation::ConfigWarnings;

/// Source that produced the playback configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

/// Result of a load: the config, where it came from, and what looked odd.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: PlaybackConfig,
    pub source: ConfigSource,
    pub warnings: ConfigWarnings,
}

/// Resolves the playback configuration.
///
/// Evaluation order:
/// 1) `$PLAYHEAD_CONFIG_PATH` (TOML or JSON file),
/// 2) `$PLAYHEAD_CONFIG_JSON` (inline JSON),
/// 3) the first default file found under the search root,
/// 4) defaults.
///
/// `$PLAYHEAD_SERVER_URL` overrides `server_url` in every case.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    search_root: PathBuf,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            search_root: PathBuf::from("."),
        }
    }

    pub fn with_search_root(root: impl Into<PathBuf>) -> Self {
        Self {
            search_root: root.into(),
        }
    }

    pub fn load_from_env(&self) -> anyhow::Result<ConfigLoad> {
        self.load_with(|key| env::var(key).ok())
    }

    /// Same as [`load_from_env`](Self::load_from_env) with an injectable
    /// variable lookup.
    pub fn load_with<F>(&self, lookup: F) -> anyhow::Result<ConfigLoad>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| {
            lookup(key).filter(|value| !value.trim().is_empty())
        };

        let (mut config, source) = if let Some(path_str) =
            present(ENV_CONFIG_PATH)
        {
            let path = PathBuf::from(path_str);
            let config = Self::load_from_file(&path)?;
            (config, ConfigSource::EnvPath(path))
        } else if let Some(raw) = present(ENV_CONFIG_JSON) {
            let parsed = ConfigFormat::Json
                .decode(&raw)
                .with_context(|| format!("invalid playback config in {ENV_CONFIG_JSON}"))?;
            (parsed, ConfigSource::EnvInline)
        } else if let Some(path) = self.find_default_file() {
            let config = Self::load_from_file(&path)?;
            (config, ConfigSource::File(path))
        } else {
            (PlaybackConfig::default(), ConfigSource::Default)
        };

        if let Some(server_url) = present(ENV_SERVER_URL) {
            config.server_url = server_url;
        }

        let warnings = crate::validation::validate(&config);
        for warning in warnings.iter() {
            tracing::warn!(%warning, "playback config warning");
        }
        tracing::debug!(source = ?source, "loaded playback config");

        Ok(ConfigLoad {
            config,
            source,
            warnings,
        })
    }

    /// Read a config file, picking the format from its extension.
    pub fn load_from_file(path: &Path) -> anyhow::Result<PlaybackConfig> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!("failed to read playback config from {}", path.display())
        })?;
        ConfigFormat::from_path(path)
            .decode(&contents)
            .with_context(|| format!("invalid playback config {}", path.display()))
    }

    fn find_default_file(&self) -> Option<PathBuf> {
        DEFAULT_FILE_CANDIDATES
            .iter()
            .map(|candidate| self.search_root.join(candidate))
            .find(|path| path.exists())
    }
}

/// On-disk encodings a playback config may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Json,
    /// No telling extension; TOML is tried before JSON.
    Sniff,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => ConfigFormat::Json,
            Some("toml" | "tml") => ConfigFormat::Toml,
            _ => ConfigFormat::Sniff,
        }
    }

    fn decode(self, raw: &str) -> anyhow::Result<PlaybackConfig> {
        match self {
            ConfigFormat::Toml => Ok(toml::from_str(raw)?),
            ConfigFormat::Json => Ok(serde_json::from_str(raw)?),
            ConfigFormat::Sniff => toml::from_str(raw).or_else(|toml_err| {
                serde_json::from_str(raw).map_err(|json_err| {
                    anyhow!("neither toml ({toml_err}) nor json ({json_err})")
                })
            }),
        }
    }
}
