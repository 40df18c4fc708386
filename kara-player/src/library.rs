//! Song library
//!
//! The library lists every playable song in the songs folder. A song is
//! listed by its accompaniment file; the vocal file sits next to it (see
//! `kara_common::naming`). Acquisition and separation put files there; this
//! module only scans, deletes and renames.

use crate::error::{Error, Result};
use async_trait::async_trait;
use kara_common::naming::{self, TrackKind, ACCOMPANIMENT_SUFFIX};
use std::path::{Component, Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Library collaborator used by the supervisor
#[async_trait]
pub trait Library: Send + Sync {
    /// Snapshot of available songs, sorted for display
    async fn list_available(&self) -> Vec<PathBuf>;

    /// Re-read the backing store
    async fn refresh(&self) -> Result<()>;

    /// Remove a song (both renderings) and refresh
    async fn delete(&self, song: &Path) -> Result<()>;

    /// Give a song a new base name and refresh
    async fn rename(&self, song: &Path, new_name: &str) -> Result<PathBuf>;
}

/// Library backed by a folder on disk
pub struct SongLibrary {
    songs_dir: PathBuf,
    songs: RwLock<Vec<PathBuf>>,
}

impl SongLibrary {
    /// Create an empty library rooted at `songs_dir`; call `refresh` to scan
    pub fn new(songs_dir: PathBuf) -> Self {
        Self {
            songs_dir,
            songs: RwLock::new(Vec::new()),
        }
    }

    fn ensure_inside(&self, song: &Path) -> Result<()> {
        let escapes = song
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if song.starts_with(&self.songs_dir) && !escapes {
            Ok(())
        } else {
            Err(Error::InvalidRequest(format!(
                "{} is outside the songs folder",
                song.display()
            )))
        }
    }
}

/// Scan a folder for accompaniment files with a supported extension
pub fn scan_songs(songs_dir: &Path) -> Vec<PathBuf> {
    let mut songs: Vec<PathBuf> = WalkDir::new(songs_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Error accessing entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| naming::is_media_extension(path))
        .filter(|path| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().ends_with(ACCOMPANIMENT_SUFFIX))
                .unwrap_or(false)
        })
        .collect();

    songs.sort_by_key(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });
    songs
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    if tokio::fs::try_exists(path).await? {
        debug!("Removing {}", path.display());
        tokio::fs::remove_file(path).await?;
    }
    Ok(())
}

/// Rename every `(from, to)` pair, undoing earlier moves if one fails
async fn move_all(moves: &[(PathBuf, PathBuf)]) -> Result<()> {
    for (done, (from, to)) in moves.iter().enumerate() {
        if let Err(e) = tokio::fs::rename(from, to).await {
            warn!("Failed to rename {}: {}", from.display(), e);
            for (back_to, back_from) in moves[..done].iter().rev() {
                if let Err(undo) = tokio::fs::rename(back_from, back_to).await {
                    warn!("Failed to restore {}: {}", back_to.display(), undo);
                }
            }
            return Err(e.into());
        }
    }
    Ok(())
}

#[async_trait]
impl Library for SongLibrary {
    async fn list_available(&self) -> Vec<PathBuf> {
        self.songs.read().await.clone()
    }

    async fn refresh(&self) -> Result<()> {
        info!("Fetching available songs in: {}", self.songs_dir.display());
        if !self.songs_dir.is_dir() {
            return Err(Error::Common(kara_common::Error::NotFound(format!(
                "songs folder {}",
                self.songs_dir.display()
            ))));
        }

        let dir = self.songs_dir.clone();
        let songs = tokio::task::spawn_blocking(move || scan_songs(&dir))
            .await
            .map_err(|e| Error::Common(kara_common::Error::Internal(e.to_string())))?;

        debug!("Found {} songs", songs.len());
        *self.songs.write().await = songs;
        Ok(())
    }

    async fn delete(&self, song: &Path) -> Result<()> {
        self.ensure_inside(song)?;
        info!("Deleting song: {}", song.display());

        remove_if_exists(&naming::paired_path(song, TrackKind::Accompaniment)).await?;
        remove_if_exists(&naming::paired_path(song, TrackKind::Vocal)).await?;
        // associated cdg graphics, if any
        remove_if_exists(&song.with_extension("cdg")).await?;

        self.refresh().await
    }

    async fn rename(&self, song: &Path, new_name: &str) -> Result<PathBuf> {
        self.ensure_inside(song)?;
        let new_name = new_name.trim();
        if new_name.is_empty() || new_name.contains(['/', '\\']) {
            return Err(Error::InvalidRequest(format!("invalid song name: {:?}", new_name)));
        }
        info!("Renaming song: '{}' to: {}", song.display(), new_name);

        let mut moves = Vec::new();
        let mut renamed = None;
        for kind in [TrackKind::Accompaniment, TrackKind::Vocal] {
            let from = naming::paired_path(song, kind);
            if !tokio::fs::try_exists(&from).await? {
                continue;
            }
            let mut file_name = format!("{}{}", new_name, kind.suffix());
            if let Some(ext) = from.extension() {
                file_name.push('.');
                file_name.push_str(&ext.to_string_lossy());
            }
            let to = song.with_file_name(file_name);
            if kind == TrackKind::Accompaniment {
                renamed = Some(to.clone());
            }
            moves.push((from, to));
        }

        let cdg = song.with_extension("cdg");
        if tokio::fs::try_exists(&cdg).await? {
            let to = song.with_file_name(format!("{}{}.cdg", new_name, ACCOMPANIMENT_SUFFIX));
            moves.push((cdg, to));
        }

        for (_, to) in &moves {
            if tokio::fs::try_exists(to).await? {
                warn!("Rename target already exists: {}", to.display());
                return Err(Error::InvalidRequest(format!(
                    "{} already exists",
                    to.display()
                )));
            }
        }

        move_all(&moves).await?;

        self.refresh().await?;
        renamed.ok_or_else(|| {
            Error::Common(kara_common::Error::NotFound(song.display().to_string()))
        })
    }
}
