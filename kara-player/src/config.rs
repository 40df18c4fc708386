//! Configuration management for kara-player
//!
//! Bootstrap configuration comes from an optional TOML file. Every field has
//! a built-in default so a missing file, or a file with only some sections,
//! still yields a usable configuration. Command-line arguments override the
//! file (see `main.rs`).
//!
//! ```toml
//! port = 5555
//! songs_dir = "/srv/karaoke/songs"
//!
//! [logging]
//! level = "debug"
//!
//! [player]
//! path = "/usr/bin/vlc"
//! http_port = 5002
//!
//! [supervisor]
//! tick_interval_ms = 500
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Control API port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Songs folder (optional, see `kara_common::config::resolve_songs_folder`)
    #[serde(default)]
    pub songs_dir: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// External player settings
    #[serde(default)]
    pub player: PlayerConfig,

    /// Control loop settings
    #[serde(default)]
    pub supervisor: SupervisorConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            songs_dir: None,
            logging: LoggingConfig::default(),
            player: PlayerConfig::default(),
            supervisor: SupervisorConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// External player (VLC) settings
///
/// The delay fields compensate for timing hazards in the player's HTTP
/// control server. Shortening them brings back commands sent to a
/// half-shut-down server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Player executable
    pub path: PathBuf,
    /// Port of the player's HTTP control interface
    pub http_port: u16,
    /// Volume change per volume up/down command
    pub volume_step: i64,
    /// Volume up is ignored at or above this value
    pub max_volume: i64,
    /// Seconds moved by fast forward/backward
    pub seek_step_secs: i64,
    /// Timeout for each control endpoint request
    pub status_timeout_ms: u64,
    /// Pause after stopping a running player before relaunching
    pub settle_after_stop_ms: u64,
    /// Pause after launch before enqueueing the secondary asset
    pub post_launch_delay_ms: u64,
    /// Pause after launch before the near-end watcher starts polling
    pub watcher_delay_ms: u64,
    /// Window during which a transposed launch counts as alive
    pub transpose_grace_ms: u64,
    /// Near-end watcher polling interval
    pub poll_interval_ms: u64,
    /// position/length ratio treated as end of track
    pub near_end_ratio: f64,
    /// Speex resampler quality for pitch shifting (0-10)
    pub resampler_quality: u8,
    /// Sample rate converter type for pitch shifting (0 = best)
    pub src_converter_type: u8,
    /// Extra arguments inserted before the media path
    pub extra_args: Vec<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            path: default_player_path(),
            http_port: 5002,
            volume_step: 10,
            max_volume: 250,
            seek_step_secs: 7,
            status_timeout_ms: 3000,
            settle_after_stop_ms: 200,
            post_launch_delay_ms: 1500,
            watcher_delay_ms: 500,
            transpose_grace_ms: 2000,
            poll_interval_ms: 1000,
            near_end_ratio: 0.98,
            resampler_quality: 10,
            src_converter_type: 0,
            extra_args: Vec::new(),
        }
    }
}

impl PlayerConfig {
    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms)
    }

    pub fn settle_after_stop(&self) -> Duration {
        Duration::from_millis(self.settle_after_stop_ms)
    }

    pub fn post_launch_delay(&self) -> Duration {
        Duration::from_millis(self.post_launch_delay_ms)
    }

    pub fn watcher_delay(&self) -> Duration {
        Duration::from_millis(self.watcher_delay_ms)
    }

    pub fn transpose_grace(&self) -> Duration {
        Duration::from_millis(self.transpose_grace_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reject values that would break the pacing guarantees
    pub fn validate(&self) -> Result<()> {
        if !(self.near_end_ratio > 0.0 && self.near_end_ratio <= 1.0) {
            return Err(Error::Config(format!(
                "player.near_end_ratio must be in (0, 1], got {}",
                self.near_end_ratio
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("player.poll_interval_ms must be > 0".to_string()));
        }
        if self.resampler_quality > 10 {
            return Err(Error::Config(format!(
                "player.resampler_quality must be 0-10, got {}",
                self.resampler_quality
            )));
        }
        let start_budget = self.settle_after_stop_ms + self.post_launch_delay_ms;
        if start_budget >= 3000 {
            return Err(Error::Config(format!(
                "settle_after_stop_ms + post_launch_delay_ms must stay under 3000ms, got {}",
                start_budget
            )));
        }
        Ok(())
    }
}

/// Control loop settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Delay between supervisor ticks
    pub tick_interval_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
        }
    }
}

impl SupervisorConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

fn default_port() -> u16 {
    5555
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Platform default VLC location
pub fn default_player_path() -> PathBuf {
    if cfg!(target_os = "macos") {
        PathBuf::from("/Applications/VLC.app/Contents/MacOS/VLC")
    } else if cfg!(target_os = "windows") {
        let x86 = PathBuf::from(r"C:\Program Files (x86)\VideoLAN\VLC\vlc.exe");
        if x86.is_file() {
            x86
        } else {
            PathBuf::from(r"C:\Program Files\VideoLAN\VLC\vlc.exe")
        }
    } else {
        PathBuf::from("/usr/bin/vlc")
    }
}

impl TomlConfig {
    /// Load configuration
    ///
    /// An explicit path must exist and parse. Without one, the platform
    /// default location is tried and a missing file falls back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                kara_common::config::load_toml(path)?
            }
            None => match kara_common::config::default_config_path() {
                Some(path) if path.exists() => {
                    info!("Loading configuration from {}", path.display());
                    kara_common::config::load_toml(&path)?
                }
                _ => {
                    warn!("No configuration file found, using built-in defaults");
                    TomlConfig::default()
                }
            },
        };

        config.player.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.player.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.port, 5555);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.player.http_port, 5002);
        assert_eq!(config.player.settle_after_stop(), Duration::from_millis(200));
        assert_eq!(config.player.transpose_grace(), Duration::from_secs(2));
        assert_eq!(config.supervisor.tick_interval(), Duration::from_millis(500));
        assert!(config.songs_dir.is_none());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            port = 8080
            songs_dir = "/srv/songs"

            [player]
            http_port = 6000
            extra_args = ["--no-osd"]
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.songs_dir, Some(PathBuf::from("/srv/songs")));
        assert_eq!(config.player.http_port, 6000);
        assert_eq!(config.player.extra_args, vec!["--no-osd".to_string()]);
        assert_eq!(config.player.volume_step, 10);
        assert_eq!(config.player.near_end_ratio, 0.98);
    }

    #[test]
    fn test_start_budget_over_three_seconds_rejected() {
        let result = TomlConfig::from_toml_str(
            r#"
            [player]
            settle_after_stop_ms = 1000
            post_launch_delay_ms = 2500
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_bad_ratio_rejected() {
        let result = TomlConfig::from_toml_str("[player]\nnear_end_ratio = 1.5\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(matches!(
            TomlConfig::from_toml_str("port = \"not a number\""),
            Err(Error::Config(_))
        ));
    }
}
