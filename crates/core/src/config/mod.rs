use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::Result;

const SUPPORT_DIR_NAME: &str = "Spotify Autopause";
const IGNORE_LIST_FILE: &str = "ignore_list.json";
const LOG_FILE: &str = "spotify_autopause.log";
const CONFIG_FILE: &str = "config.json";

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub player: PlayerConfig,
    pub polling: PollingConfig,
    /// Directory that holds the ignore list and the status log.
    pub support_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            polling: PollingConfig::default(),
            support_dir: default_support_dir(),
        }
    }
}

impl AppConfig {
    /// Reads the config at `path`, falling back to defaults when the file does
    /// not exist. A file that exists but fails to parse is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "no config file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    pub fn ignore_list_path(&self) -> PathBuf {
        self.support_dir.join(IGNORE_LIST_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.support_dir.join(LOG_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.support_dir.join(CONFIG_FILE)
    }
}

/// Which application is paused and resumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Application name as understood by AppleScript and the process table.
    pub name: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            name: "Spotify".to_string(),
        }
    }
}

/// Poll cadence. Values are whole seconds in the JSON form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub start_delay_secs: u64,
    pub delay_when_playing_secs: u64,
    pub delay_when_not_playing_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            start_delay_secs: 2,
            delay_when_playing_secs: 2,
            delay_when_not_playing_secs: 3,
        }
    }
}

impl PollingConfig {
    pub fn start_delay(&self) -> Duration {
        Duration::from_secs(self.start_delay_secs)
    }

    /// Interval used while the player is free to play.
    pub fn delay_when_playing(&self) -> Duration {
        Duration::from_secs(self.delay_when_playing_secs)
    }

    /// Interval used after the player has been force-paused.
    pub fn delay_when_not_playing(&self) -> Duration {
        Duration::from_secs(self.delay_when_not_playing_secs)
    }
}

fn default_support_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Library").join("Application Support")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(SUPPORT_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_two_and_three_second_cadence() {
        let config = AppConfig::default();
        assert_eq!(config.player.name, "Spotify");
        assert_eq!(config.polling.start_delay(), Duration::from_secs(2));
        assert_eq!(config.polling.delay_when_playing(), Duration::from_secs(2));
        assert_eq!(config.polling.delay_when_not_playing(), Duration::from_secs(3));
        assert!(config.support_dir.ends_with(SUPPORT_DIR_NAME));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.player.name, "Spotify");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "player": { "name": "Music" } }"#).unwrap();

        let config = AppConfig::load_or_default(&path).unwrap();
        assert_eq!(config.player.name, "Music");
        assert_eq!(config.polling.delay_when_not_playing_secs, 3);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(AppConfig::load_or_default(&path).is_err());
    }

    #[test]
    fn derived_paths_live_in_support_dir() {
        let config = AppConfig {
            support_dir: PathBuf::from("/tmp/autopause"),
            ..AppConfig::default()
        };
        assert_eq!(
            config.ignore_list_path(),
            PathBuf::from("/tmp/autopause/ignore_list.json")
        );
        assert_eq!(
            config.log_path(),
            PathBuf::from("/tmp/autopause/spotify_autopause.log")
        );
    }
}
