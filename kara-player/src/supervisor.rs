//! Playback supervisor
//!
//! Single owner of the now-playing record and the only component allowed to
//! start a track. A fixed-interval loop pulls the next queue entry into the
//! player once nothing is alive and notices tracks that ended or crashed.
//! Control commands from the API run concurrently with the loop; each shared
//! structure sits behind its own lock, and every path that launches or kills
//! the player holds `advance` so a tick never interleaves with a skip or a
//! transpose.

use crate::config::SupervisorConfig;
use crate::error::{Error, Result};
use crate::library::Library;
use crate::player::MediaPlayer;
use crate::queue::{PlaybackQueue, QueueEdit, QueueEntry};
use kara_common::events::{EventBus, KaraEvent, PlaybackState, QueueChangeTrigger};
use kara_common::{AssetPair, TrackKind};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What is on stage right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NowPlaying {
    pub title: String,
    pub source: PathBuf,
    pub requester: String,
    /// Pitch shift in semitones
    pub transpose: i32,
    pub paused: bool,
}

impl NowPlaying {
    fn from_entry(entry: QueueEntry) -> Self {
        Self {
            title: entry.title,
            source: entry.source,
            requester: entry.requester,
            transpose: 0,
            paused: false,
        }
    }
}

/// Supervisor state plus the player's position report
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub now_playing: Option<NowPlaying>,
    pub track_kind: TrackKind,
    pub queue_length: usize,
    /// Elapsed seconds, absent when the player is unreachable
    pub position: Option<i64>,
    /// Track length in seconds
    pub length: Option<i64>,
    pub volume: Option<i64>,
}

/// Control loop tying the queue to the player session
pub struct Supervisor {
    player: Arc<dyn MediaPlayer>,
    library: Arc<dyn Library>,
    queue: Mutex<PlaybackQueue>,
    now_playing: RwLock<Option<NowPlaying>>,
    state: RwLock<PlaybackState>,
    track_kind: RwLock<TrackKind>,
    advance: Mutex<()>,
    events: EventBus,
    tick_interval: Duration,
}

impl Supervisor {
    pub fn new(
        player: Arc<dyn MediaPlayer>,
        library: Arc<dyn Library>,
        config: &SupervisorConfig,
    ) -> Self {
        Self {
            player,
            library,
            queue: Mutex::new(PlaybackQueue::new()),
            now_playing: RwLock::new(None),
            state: RwLock::new(PlaybackState::Idle),
            track_kind: RwLock::new(TrackKind::default()),
            advance: Mutex::new(()),
            events: EventBus::default(),
            tick_interval: config.tick_interval(),
        }
    }

    /// Run the control loop until `shutdown` fires
    ///
    /// A tick in progress always completes before the loop exits.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        info!(
            tick_ms = self.tick_interval.as_millis() as u64,
            "Playback supervisor started"
        );
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => self.tick().await,
            }
        }

        self.set_state(PlaybackState::Stopped).await;
        info!("Playback supervisor stopped");
    }

    /// One supervision step
    pub async fn tick(&self) {
        let _advance = self.advance.lock().await;
        let alive = self.player.is_alive().await;
        let state = self.state().await;

        if alive {
            match state {
                PlaybackState::Starting => self.set_state(PlaybackState::Playing).await,
                PlaybackState::Transposing if !self.player.is_transposing() => {
                    self.set_state(PlaybackState::Playing).await
                }
                _ => {}
            }
            return;
        }

        if self.now_playing.read().await.is_some() {
            debug!("Player is no longer running, clearing now playing");
            self.clear_now_playing().await;
        }
        if state != PlaybackState::Idle {
            self.set_state(PlaybackState::Idle).await;
        }

        let next = {
            let mut queue = self.queue.lock().await;
            queue.dequeue_front().ok().map(|entry| (entry, queue.len()))
        };
        if let Some((entry, remaining)) = next {
            self.emit_queue_changed(remaining, QueueChangeTrigger::Dequeue);
            self.start_entry(entry).await;
        }
    }

    async fn start_entry(&self, entry: QueueEntry) {
        let kind = *self.track_kind.read().await;
        let pair = AssetPair::resolve(&entry.source, kind);
        info!(
            requester = %entry.requester,
            "Playing: {}",
            entry.title
        );
        self.set_state(PlaybackState::Starting).await;

        match self.player.start(&pair, 0).await {
            Ok(()) => self.set_now_playing(NowPlaying::from_entry(entry)).await,
            Err(e) => {
                // the entry is consumed; the caller has to enqueue it again
                error!("Failed to start {}: {}", entry.source.display(), e);
                self.set_state(PlaybackState::Idle).await;
            }
        }
    }

    // ========================================================================
    // Playback control
    // ========================================================================

    /// Kill the current track and clear the now-playing record
    ///
    /// Returns `PlayerUnreachable` when nothing was playing; the record is
    /// cleared either way.
    pub async fn skip(&self) -> Result<()> {
        let _advance = self.advance.lock().await;
        let was_alive = self.player.is_alive().await;
        self.halt().await;

        if was_alive {
            info!("Skipped current song");
            Ok(())
        } else {
            warn!("No song to skip");
            Err(Error::PlayerUnreachable("skip".to_string()))
        }
    }

    async fn halt(&self) {
        self.player.stop().await;
        self.player.kill().await;
        self.clear_now_playing().await;
        self.set_state(PlaybackState::Idle).await;
    }

    /// Pause or resume depending on what the player reports
    ///
    /// Returns the paused flag after the toggle.
    pub async fn toggle_pause(&self) -> Result<bool> {
        let paused = if self.player.is_playing().await {
            self.player.pause().await?;
            true
        } else if self.player.is_paused().await {
            self.player.resume().await?;
            false
        } else {
            warn!("Nothing playing, can't toggle pause");
            return Err(Error::PlayerUnreachable("pause".to_string()));
        };

        if let Some(now) = self.now_playing.write().await.as_mut() {
            now.paused = paused;
        }
        let state = if paused {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        };
        self.set_state(state).await;
        Ok(paused)
    }

    /// Restart the current song from the top with a new pitch shift
    pub async fn transpose(&self, semitones: i32) -> Result<()> {
        let _advance = self.advance.lock().await;
        let current = self
            .now_playing
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::PlayerUnreachable("transpose".to_string()))?;

        let kind = *self.track_kind.read().await;
        let pair = AssetPair::resolve(&current.source, kind);
        info!("Transposing by {} semitones: {}", semitones, current.title);
        self.set_state(PlaybackState::Transposing).await;

        if let Err(e) = self.player.start(&pair, semitones).await {
            error!("Transpose restart failed: {}", e);
            self.clear_now_playing().await;
            self.set_state(PlaybackState::Idle).await;
            return Err(e);
        }

        self.set_now_playing(NowPlaying {
            transpose: semitones,
            paused: false,
            ..current
        })
        .await;
        self.events.emit_lossy(KaraEvent::TransposeChanged {
            semitones,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// Choose which rendering is heard, switching the live track if needed
    pub async fn select_track_kind(&self, kind: TrackKind) -> Result<()> {
        let previous = std::mem::replace(&mut *self.track_kind.write().await, kind);
        if previous == kind {
            debug!(%kind, "Track kind unchanged");
            return Ok(());
        }

        if self.player.is_alive().await {
            if let Err(e) = self.player.switch_track_pair().await {
                *self.track_kind.write().await = previous;
                return Err(e);
            }
        }
        info!(%kind, "Track kind selected");
        self.events.emit_lossy(KaraEvent::TrackKindChanged {
            kind,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    pub async fn seek(&self, position: i64) -> Result<()> {
        self.player.seek(position).await
    }

    pub async fn restart(&self) -> Result<()> {
        self.player.restart().await
    }

    pub async fn fast_forward(&self) -> Result<()> {
        self.player.fast_forward().await
    }

    pub async fn fast_backward(&self) -> Result<()> {
        self.player.fast_backward().await
    }

    pub async fn volume_up(&self) -> Result<()> {
        self.player.volume_up().await
    }

    pub async fn volume_down(&self) -> Result<()> {
        self.player.volume_down().await
    }

    // ========================================================================
    // Queue
    // ========================================================================

    /// Queue a library song for `requester`
    ///
    /// Only songs in the current library listing are accepted.
    pub async fn enqueue(&self, source: PathBuf, requester: &str) -> Result<QueueEntry> {
        if !self.library.list_available().await.contains(&source) {
            warn!("Song is not in the library, will not add: {}", source.display());
            return Err(Error::EntryNotFound(source.display().to_string()));
        }
        let entry = QueueEntry::new(source, requester);
        let length = {
            let mut queue = self.queue.lock().await;
            queue.enqueue(entry.clone())?;
            queue.len()
        };
        self.emit_queue_changed(length, QueueChangeTrigger::Enqueue);
        Ok(entry)
    }

    pub async fn queue_edit(&self, fragment: &str, edit: QueueEdit) -> Result<()> {
        let length = {
            let mut queue = self.queue.lock().await;
            queue.reorder(fragment, edit)?;
            queue.len()
        };
        let trigger = match edit {
            QueueEdit::Delete => QueueChangeTrigger::Remove,
            QueueEdit::Up | QueueEdit::Down => QueueChangeTrigger::Reorder,
        };
        self.emit_queue_changed(length, trigger);
        Ok(())
    }

    /// Append `count` random songs from the library snapshot taken now
    pub async fn queue_add_random(&self, count: usize) -> Result<usize> {
        let songs = self.library.list_available().await;
        let (added, length) = {
            let mut queue = self.queue.lock().await;
            let added = queue.fill_random(count, &songs, &mut rand::thread_rng())?;
            (added, queue.len())
        };
        self.emit_queue_changed(length, QueueChangeTrigger::RandomFill);
        Ok(added)
    }

    /// Empty the queue and stop the current track
    pub async fn queue_clear(&self) {
        let _advance = self.advance.lock().await;
        let dropped = self.queue.lock().await.clear();
        info!("Clearing queue ({} entries)", dropped);
        self.emit_queue_changed(0, QueueChangeTrigger::Clear);

        if self.player.is_alive().await || self.now_playing.read().await.is_some() {
            self.halt().await;
        }
    }

    // ========================================================================
    // Library
    // ========================================================================

    pub async fn library_songs(&self) -> Vec<PathBuf> {
        self.library.list_available().await
    }

    pub async fn refresh_library(&self) -> Result<()> {
        self.library.refresh().await
    }

    pub async fn delete_song(&self, song: &Path) -> Result<()> {
        self.library.delete(song).await
    }

    pub async fn rename_song(&self, song: &Path, new_name: &str) -> Result<PathBuf> {
        self.library.rename(song, new_name).await
    }

    // ========================================================================
    // Status
    // ========================================================================

    pub async fn state(&self) -> PlaybackState {
        *self.state.read().await
    }

    pub async fn now_playing(&self) -> Option<NowPlaying> {
        self.now_playing.read().await.clone()
    }

    pub async fn queue_snapshot(&self) -> Vec<QueueEntry> {
        self.queue.lock().await.snapshot()
    }

    pub async fn track_kind(&self) -> TrackKind {
        *self.track_kind.read().await
    }

    pub async fn playback_status(&self) -> PlaybackStatus {
        let report = if self.player.is_alive().await {
            self.player.status().await.ok()
        } else {
            None
        };

        PlaybackStatus {
            state: self.state().await,
            now_playing: self.now_playing().await,
            track_kind: self.track_kind().await,
            queue_length: self.queue.lock().await.len(),
            position: report.as_ref().map(|s| s.time),
            length: report.as_ref().map(|s| s.length),
            volume: report.as_ref().map(|s| s.volume),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<KaraEvent> {
        self.events.subscribe()
    }

    // ========================================================================
    // Internal
    // ========================================================================

    async fn set_state(&self, new_state: PlaybackState) {
        let old_state = std::mem::replace(&mut *self.state.write().await, new_state);
        if old_state != new_state {
            debug!(%old_state, %new_state, "Playback state changed");
            self.events.emit_lossy(KaraEvent::PlaybackStateChanged {
                old_state,
                new_state,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    async fn set_now_playing(&self, now: NowPlaying) {
        let event = KaraEvent::NowPlayingChanged {
            title: Some(now.title.clone()),
            requester: Some(now.requester.clone()),
            transpose: now.transpose,
            timestamp: chrono::Utc::now(),
        };
        *self.now_playing.write().await = Some(now);
        self.events.emit_lossy(event);
    }

    async fn clear_now_playing(&self) {
        if self.now_playing.write().await.take().is_some() {
            self.events.emit_lossy(KaraEvent::NowPlayingChanged {
                title: None,
                requester: None,
                transpose: 0,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    fn emit_queue_changed(&self, length: usize, trigger: QueueChangeTrigger) {
        self.events.emit_lossy(KaraEvent::QueueChanged {
            length,
            trigger,
            timestamp: chrono::Utc::now(),
        });
    }
}
