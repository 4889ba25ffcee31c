//! Configuration management for EchoFlix
//!
//! Handles config file loading/saving and resolution of runtime settings.
//! Config is stored at ~/.config/echoflix/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::api::DEFAULT_API_BASE;
use crate::models::ReadinessThreshold;
use crate::stream::PlayerType;

/// Environment variable that overrides the backend base URL
pub const API_BASE_ENV: &str = "ECHOFLIX_API_BASE";

/// Application configuration (as persisted)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL
    pub api_base: Option<String>,
    /// Readiness threshold ("any" or a percentage)
    pub readiness_threshold: Option<String>,
    /// Local player ("vlc", "mpv" or "none")
    pub player: Option<String>,
    /// Where downloaded .torrent artifacts are written
    pub download_dir: Option<PathBuf>,
}

impl Config {
    /// Get config file path (~/.config/echoflix/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("echoflix").join("config.toml"))
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    /// Load config from a specific file, or return default if unreadable
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }
}

/// Command-line overrides, highest priority
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_base: Option<String>,
    pub threshold: Option<String>,
    pub player: Option<String>,
    pub download_dir: Option<PathBuf>,
}

/// Effective settings after resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub api_base: String,
    #[serde(serialize_with = "serialize_display")]
    pub threshold: ReadinessThreshold,
    #[serde(serialize_with = "serialize_player")]
    pub player: Option<PlayerType>,
    pub download_dir: PathBuf,
}

impl Settings {
    /// Resolve settings with fallback chain:
    /// 1. Command-line overrides
    /// 2. Environment variable ECHOFLIX_API_BASE (base URL only)
    /// 3. Config file
    /// 4. Built-in defaults
    pub fn resolve(config: &Config, overrides: &Overrides) -> Result<Self> {
        let env_base = std::env::var(API_BASE_ENV).ok();
        Self::resolve_with_env(config, overrides, env_base)
    }

    /// Same as [`resolve`](Self::resolve) with the environment value passed in
    pub fn resolve_with_env(
        config: &Config,
        overrides: &Overrides,
        env_api_base: Option<String>,
    ) -> Result<Self> {
        let api_base = overrides
            .api_base
            .clone()
            .or(env_api_base.filter(|s| !s.trim().is_empty()))
            .or_else(|| config.api_base.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = api_base.trim().trim_end_matches('/').to_string();
        if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
            anyhow::bail!("Invalid API base '{}' (expected http:// or https://)", api_base);
        }

        let threshold = match overrides
            .threshold
            .as_deref()
            .or(config.readiness_threshold.as_deref())
        {
            Some(s) => s.parse()?,
            None => ReadinessThreshold::default(),
        };

        let player = match overrides.player.as_deref().or(config.player.as_deref()) {
            Some(s) if s.trim().eq_ignore_ascii_case("none") => None,
            Some(s) => Some(s.parse()?),
            None => Some(PlayerType::default()),
        };

        let download_dir = overrides
            .download_dir
            .clone()
            .or_else(|| config.download_dir.clone())
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            api_base,
            threshold,
            player,
            download_dir,
        })
    }
}

fn serialize_display<S: serde::Serializer>(
    value: &ReadinessThreshold,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn serialize_player<S: serde::Serializer>(
    value: &Option<PlayerType>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(player) => serializer.serialize_str(player.command()),
        None => serializer.serialize_str("none"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.api_base.is_none());
        assert!(config.readiness_threshold.is_none());
    }

    #[test]
    fn test_defaults_resolve() {
        let settings =
            Settings::resolve_with_env(&Config::default(), &Overrides::default(), None).unwrap();
        assert_eq!(settings.api_base, DEFAULT_API_BASE);
        assert_eq!(settings.threshold, ReadinessThreshold::Percent(10.0));
        assert_eq!(settings.player, Some(PlayerType::Vlc));
    }

    #[test]
    fn test_api_base_priority() {
        let config = Config {
            api_base: Some("http://file:8000".into()),
            ..Default::default()
        };

        let from_file =
            Settings::resolve_with_env(&config, &Overrides::default(), None).unwrap();
        assert_eq!(from_file.api_base, "http://file:8000");

        let from_env = Settings::resolve_with_env(
            &config,
            &Overrides::default(),
            Some("http://env:8000/".into()),
        )
        .unwrap();
        assert_eq!(from_env.api_base, "http://env:8000");

        let overrides = Overrides {
            api_base: Some("https://flag.example".into()),
            ..Default::default()
        };
        let from_flag =
            Settings::resolve_with_env(&config, &overrides, Some("http://env:8000".into()))
                .unwrap();
        assert_eq!(from_flag.api_base, "https://flag.example");
    }

    #[test]
    fn test_invalid_api_base_rejected() {
        let overrides = Overrides {
            api_base: Some("localhost:8000".into()),
            ..Default::default()
        };
        assert!(Settings::resolve_with_env(&Config::default(), &overrides, None).is_err());
    }

    #[test]
    fn test_threshold_and_player_from_file() {
        let config = Config {
            readiness_threshold: Some("any".into()),
            player: Some("none".into()),
            ..Default::default()
        };
        let settings =
            Settings::resolve_with_env(&config, &Overrides::default(), None).unwrap();
        assert_eq!(settings.threshold, ReadinessThreshold::AnyProgress);
        assert_eq!(settings.player, None);
    }

    #[test]
    fn test_bad_threshold_is_an_error() {
        let overrides = Overrides {
            threshold: Some("250".into()),
            ..Default::default()
        };
        assert!(Settings::resolve_with_env(&Config::default(), &overrides, None).is_err());
    }

    #[test]
    fn test_toml_roundtrip_on_disk() {
        let dir = std::env::temp_dir().join(format!("echoflix-config-{}", std::process::id()));
        let path = dir.join("nested").join("config.toml");
        let config = Config {
            api_base: Some("http://ec2.example:8000".into()),
            readiness_threshold: Some("100".into()),
            player: Some("mpv".into()),
            download_dir: Some(PathBuf::from("/tmp/torrents")),
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let config = Config::load_from(Path::new("/nonexistent/echoflix/config.toml"));
        assert_eq!(config, Config::default());
    }
}
