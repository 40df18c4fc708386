//! Scripted media player
//!
//! Records every launch and answers liveness from flags the test controls.

use async_trait::async_trait;
use kara_common::AssetPair;
use kara_player::player::{MediaPlayer, PlayerState, PlayerStatus};
use kara_player::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct MockPlayer {
    alive: AtomicBool,
    playing: AtomicBool,
    transposing: AtomicBool,
    fail_start: AtomicBool,
    die_on_start: AtomicBool,
    position: AtomicI64,
    volume: AtomicI64,
    switches: AtomicUsize,
    kills: AtomicUsize,
    starts: Mutex<Vec<(AssetPair, i32)>>,
}

impl MockPlayer {
    pub fn new() -> Self {
        Self {
            alive: AtomicBool::new(false),
            playing: AtomicBool::new(false),
            transposing: AtomicBool::new(false),
            fail_start: AtomicBool::new(false),
            die_on_start: AtomicBool::new(false),
            position: AtomicI64::new(0),
            volume: AtomicI64::new(256),
            switches: AtomicUsize::new(0),
            kills: AtomicUsize::new(0),
            starts: Mutex::new(Vec::new()),
        }
    }

    /// Simulate the process exiting on its own
    pub fn finish_track(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.playing.store(false, Ordering::SeqCst);
    }

    /// Launches fail with `ProcessStartFailure`
    pub fn fail_starts(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Launched processes report not alive right away
    pub fn die_on_start(&self, die: bool) {
        self.die_on_start.store(die, Ordering::SeqCst);
    }

    /// Close the transposing grace window
    pub fn end_grace(&self) {
        self.transposing.store(false, Ordering::SeqCst);
    }

    pub fn process_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> Vec<(AssetPair, i32)> {
        self.starts.lock().unwrap().clone()
    }

    pub fn switches(&self) -> usize {
        self.switches.load(Ordering::SeqCst)
    }

    pub fn kills(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }

    pub fn position(&self) -> i64 {
        self.position.load(Ordering::SeqCst)
    }

    pub fn volume(&self) -> i64 {
        self.volume.load(Ordering::SeqCst)
    }

    fn require_alive(&self, command: &str) -> Result<()> {
        if self.alive.load(Ordering::SeqCst) || self.transposing.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::PlayerUnreachable(command.to_string()))
        }
    }
}

#[async_trait]
impl MediaPlayer for MockPlayer {
    async fn start(&self, pair: &AssetPair, transpose: i32) -> Result<()> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(Error::ProcessStartFailure("mock launch refused".to_string()));
        }
        self.starts.lock().unwrap().push((pair.clone(), transpose));
        let dies = self.die_on_start.load(Ordering::SeqCst);
        self.alive.store(!dies, Ordering::SeqCst);
        self.playing.store(!dies, Ordering::SeqCst);
        self.transposing.store(transpose != 0, Ordering::SeqCst);
        self.position.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.require_alive("pause")?;
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        self.require_alive("resume")?;
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }

    async fn kill(&self) {
        self.kills.fetch_add(1, Ordering::SeqCst);
        self.alive.store(false, Ordering::SeqCst);
        self.playing.store(false, Ordering::SeqCst);
        self.transposing.store(false, Ordering::SeqCst);
    }

    async fn seek(&self, position: i64) -> Result<()> {
        self.require_alive("seek")?;
        self.position.store(position.max(0), Ordering::SeqCst);
        Ok(())
    }

    async fn fast_forward(&self) -> Result<()> {
        self.require_alive("fast_forward")?;
        self.position.fetch_add(7, Ordering::SeqCst);
        Ok(())
    }

    async fn fast_backward(&self) -> Result<()> {
        self.require_alive("fast_backward")?;
        let target = (self.position.load(Ordering::SeqCst) - 7).max(0);
        self.position.store(target, Ordering::SeqCst);
        Ok(())
    }

    async fn restart(&self) -> Result<()> {
        self.seek(0).await?;
        self.resume().await
    }

    async fn volume_up(&self) -> Result<()> {
        self.require_alive("volume_up")?;
        self.volume.fetch_add(10, Ordering::SeqCst);
        Ok(())
    }

    async fn volume_down(&self) -> Result<()> {
        self.require_alive("volume_down")?;
        self.volume.fetch_sub(10, Ordering::SeqCst);
        Ok(())
    }

    async fn switch_track_pair(&self) -> Result<()> {
        self.require_alive("switch_track_pair")?;
        self.switches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst) || self.transposing.load(Ordering::SeqCst)
    }

    fn is_transposing(&self) -> bool {
        self.transposing.load(Ordering::SeqCst)
    }

    async fn is_playing(&self) -> bool {
        self.alive.load(Ordering::SeqCst) && self.playing.load(Ordering::SeqCst)
    }

    async fn is_paused(&self) -> bool {
        self.alive.load(Ordering::SeqCst) && !self.playing.load(Ordering::SeqCst)
    }

    async fn status(&self) -> Result<PlayerStatus> {
        self.require_alive("status")?;
        let state = if self.playing.load(Ordering::SeqCst) {
            PlayerState::Playing
        } else {
            PlayerState::Paused
        };
        Ok(PlayerStatus {
            state,
            volume: self.volume(),
            time: self.position(),
            length: 200,
        })
    }
}
