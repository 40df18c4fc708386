//! In-memory song library

use async_trait::async_trait;
use kara_player::library::Library;
use kara_player::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

pub struct StaticLibrary {
    songs: RwLock<Vec<PathBuf>>,
}

impl StaticLibrary {
    pub fn new(songs: Vec<PathBuf>) -> Self {
        Self {
            songs: RwLock::new(songs),
        }
    }
}

#[async_trait]
impl Library for StaticLibrary {
    async fn list_available(&self) -> Vec<PathBuf> {
        self.songs.read().await.clone()
    }

    async fn refresh(&self) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, song: &Path) -> Result<()> {
        let mut songs = self.songs.write().await;
        let before = songs.len();
        songs.retain(|s| s != song);
        if songs.len() == before {
            return Err(Error::InvalidRequest(format!("unknown song {}", song.display())));
        }
        Ok(())
    }

    async fn rename(&self, song: &Path, new_name: &str) -> Result<PathBuf> {
        let mut songs = self.songs.write().await;
        let slot = songs
            .iter_mut()
            .find(|s| s.as_path() == song)
            .ok_or_else(|| Error::InvalidRequest(format!("unknown song {}", song.display())))?;
        let renamed = song.with_file_name(format!("{}_accompaniment.mp4", new_name));
        *slot = renamed.clone();
        Ok(renamed)
    }
}
