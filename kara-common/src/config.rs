//! Configuration file loading and songs folder resolution

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Environment variable naming the songs folder
pub const SONGS_DIR_ENV: &str = "KARA_SONGS_DIR";

/// Songs folder resolution in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. Value read from the TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_songs_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config_value: Option<&Path>,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = config_value {
        return path.to_path_buf();
    }

    // Priority 4: OS-dependent compiled default
    default_songs_folder()
}

/// Default configuration file path for the platform
///
/// `~/.config/kara/config.toml` on Linux, the platform config dir elsewhere.
/// Returns `None` when the platform exposes no config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("kara").join("config.toml"))
}

/// Get OS-dependent default songs folder path
pub fn default_songs_folder() -> PathBuf {
    if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\kara\songs
        dirs::data_local_dir()
            .map(|d| d.join("kara").join("songs"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\kara\\songs"))
    } else {
        // ~/.local/share/kara/songs, ~/Library/Application Support/kara/songs
        dirs::data_local_dir()
            .map(|d| d.join("kara").join("songs"))
            .unwrap_or_else(|| PathBuf::from("./kara_songs"))
    }
}

/// Read and deserialize a TOML file
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}
