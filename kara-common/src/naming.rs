//! Song file naming conventions
//!
//! Every song in the library is a pair of synchronized media files produced
//! by the separation step: one with the lead vocal and one accompaniment-only.
//! Both share a base name and differ by a suffix placed before the extension:
//!
//! ```text
//! Artist - Song---dQw4w9WgXcQ_vocal.mp4
//! Artist - Song---dQw4w9WgXcQ_accompaniment.mp4
//! ```
//!
//! Anything after `---` in the base name is a unique id added at download
//! time and is never shown to users.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Suffix marking the vocal-led rendering
pub const VOCAL_SUFFIX: &str = "_vocal";

/// Suffix marking the accompaniment-led rendering
pub const ACCOMPANIMENT_SUFFIX: &str = "_accompaniment";

/// Separator between the display title and an embedded unique id
pub const ID_SEPARATOR: &str = "---";

/// File extensions the library recognises as playable
pub const MEDIA_EXTENSIONS: &[&str] = &["mp4", "mp3", "zip", "mkv", "avi", "webm", "mov"];

/// Which rendering of an asset pair
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    /// Lead vocal kept
    Vocal,
    /// Lead vocal removed
    #[default]
    Accompaniment,
}

impl TrackKind {
    /// File name suffix for this rendering
    pub fn suffix(self) -> &'static str {
        match self {
            TrackKind::Vocal => VOCAL_SUFFIX,
            TrackKind::Accompaniment => ACCOMPANIMENT_SUFFIX,
        }
    }

    /// The other rendering of the pair
    pub fn other(self) -> Self {
        match self {
            TrackKind::Vocal => TrackKind::Accompaniment,
            TrackKind::Accompaniment => TrackKind::Vocal,
        }
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackKind::Vocal => write!(f, "vocal"),
            TrackKind::Accompaniment => write!(f, "accompaniment"),
        }
    }
}

impl std::str::FromStr for TrackKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vocal" | "vocals" => Ok(TrackKind::Vocal),
            "accompaniment" => Ok(TrackKind::Accompaniment),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown track kind: {}",
                other
            ))),
        }
    }
}

/// Human-readable title for a song file
///
/// Strips directories, the extension, and any `---<id>` suffix.
pub fn display_title(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match stem.split_once(ID_SEPARATOR) {
        Some((title, _)) => title.to_string(),
        None => stem,
    }
}

/// Path of the given rendering for a song file
///
/// Swaps the vocal/accompaniment suffix in the file stem. A path carrying
/// neither suffix gets `kind`'s suffix appended to its stem.
pub fn paired_path(path: &Path, kind: TrackKind) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let base = stem
        .strip_suffix(VOCAL_SUFFIX)
        .or_else(|| stem.strip_suffix(ACCOMPANIMENT_SUFFIX))
        .unwrap_or(&stem);

    let mut file_name = format!("{}{}", base, kind.suffix());
    if let Some(ext) = path.extension() {
        file_name.push('.');
        file_name.push_str(&ext.to_string_lossy());
    }
    path.with_file_name(file_name)
}

/// Whether a file extension is one the library plays
pub fn is_media_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_ascii_lowercase();
            MEDIA_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// The two files handed to the player for one song
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPair {
    /// Played first
    pub primary: PathBuf,
    /// Enqueued behind the primary for gapless switching
    pub secondary: PathBuf,
    /// Rendering of `primary`
    pub primary_kind: TrackKind,
}

impl AssetPair {
    /// Derive the pair from any member's path with `preferred` as primary
    pub fn resolve(source: &Path, preferred: TrackKind) -> Self {
        Self {
            primary: paired_path(source, preferred),
            secondary: paired_path(source, preferred.other()),
            primary_kind: preferred,
        }
    }

    /// Same pair with primary and secondary exchanged
    pub fn swapped(&self) -> Self {
        Self {
            primary: self.secondary.clone(),
            secondary: self.primary.clone(),
            primary_kind: self.primary_kind.other(),
        }
    }
}
