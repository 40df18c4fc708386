//! VLC player session
//!
//! Owns at most one VLC process at a time together with its control
//! channel, near-end watcher and transposing grace timer. Launches are
//! serialized; status queries and commands never wait for a launch in
//! progress beyond the brief moment its state is swapped in.

use super::process::PlayerProcess;
use super::protocol::{generate_credential, ControlChannel, PlayerCommand, PlayerState, PlayerStatus};
use super::watcher::{NearEndWatcher, WatchSettings};
use super::MediaPlayer;
use crate::config::PlayerConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use kara_common::AssetPair;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Pause between `pl_next` and the re-seek when swapping renderings
const SWITCH_SEEK_DELAY: Duration = Duration::from_millis(100);

#[derive(Default)]
struct SessionInner {
    process: Option<PlayerProcess>,
    channel: Option<ControlChannel>,
    watcher: Option<NearEndWatcher>,
    grace: Option<JoinHandle<()>>,
    pair: Option<AssetPair>,
}

impl SessionInner {
    fn process_alive(&self) -> bool {
        self.process.as_ref().is_some_and(|p| p.is_alive())
    }
}

/// One VLC process driven over its HTTP interface
pub struct VlcSession {
    config: PlayerConfig,
    launch_lock: Mutex<()>,
    inner: Mutex<SessionInner>,
    transposing: Arc<AtomicBool>,
}

impl VlcSession {
    pub fn new(config: PlayerConfig) -> Self {
        info!("Player executable: {}", config.path.display());
        Self {
            config,
            launch_lock: Mutex::new(()),
            inner: Mutex::new(SessionInner::default()),
            transposing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Command line for one launch, excluding the program itself
    pub fn launch_args(&self, credential: &str, media: &Path, transpose: i32) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-f".into(),
            "--play-and-exit".into(),
            "--extraintf".into(),
            "http".into(),
            "--http-port".into(),
            self.config.http_port.to_string(),
            "--http-password".into(),
            credential.to_string(),
        ];
        args.extend(self.config.extra_args.iter().cloned());

        if transpose != 0 {
            args.extend([
                "--audio-filter".to_string(),
                "scaletempo_pitch".to_string(),
                "--pitch-shift".to_string(),
                transpose.to_string(),
                "--speex-resampler-quality".to_string(),
                self.config.resampler_quality.to_string(),
                "--src-converter-type".to_string(),
                self.config.src_converter_type.to_string(),
            ]);
        }

        // media is never read as an option
        args.push("--".to_string());
        args.push(media.to_string_lossy().into_owned());
        args
    }

    /// Pair currently loaded in the player, primary first
    pub async fn active_pair(&self) -> Option<AssetPair> {
        self.inner.lock().await.pair.clone()
    }

    /// Control channel of the live process
    async fn live_channel(&self, command: &str) -> Result<ControlChannel> {
        let inner = self.inner.lock().await;
        let alive = self.transposing.load(Ordering::SeqCst) || inner.process_alive();
        match (alive, inner.channel.clone()) {
            (true, Some(channel)) => Ok(channel),
            _ => Err(Error::PlayerUnreachable(command.to_string())),
        }
    }

    /// Live channel for a user-facing command; refusals are logged
    async fn command_channel(&self, command: &str) -> Result<ControlChannel> {
        self.live_channel(command).await.inspect_err(|_| {
            warn!("No active player process. Could not run command: {}", command);
        })
    }

    async fn command(&self, command: PlayerCommand) -> Result<()> {
        let channel = self.command_channel(command.name()).await?;
        channel.send(&command).await
    }

    /// Kill the tracked process and its watcher
    async fn teardown(&self) {
        let (process, watcher) = {
            let mut inner = self.inner.lock().await;
            inner.channel = None;
            inner.pair = None;
            (inner.process.take(), inner.watcher.take())
        };

        if let Some(watcher) = watcher {
            watcher.stop();
        }
        if let Some(mut process) = process {
            debug!(pid = ?process.pid(), "Tearing down player process");
            process.kill().await;
        }
    }

    /// Report alive for the grace window regardless of the process state
    fn open_grace_window(&self, inner: &mut SessionInner) {
        if let Some(previous) = inner.grace.take() {
            previous.abort();
        }
        self.transposing.store(true, Ordering::SeqCst);
        debug!("Transposing file...");

        let flag = Arc::clone(&self.transposing);
        let grace = self.config.transpose_grace();
        inner.grace = Some(tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            flag.store(false, Ordering::SeqCst);
            debug!("Transposing complete");
        }));
    }

    fn close_grace_window(&self, inner: &mut SessionInner) {
        if let Some(grace) = inner.grace.take() {
            grace.abort();
        }
        self.transposing.store(false, Ordering::SeqCst);
    }

    /// Status for a user-facing command
    async fn current_status(&self, command: &str) -> Result<(ControlChannel, PlayerStatus)> {
        let channel = self.command_channel(command).await?;
        let status = channel.status().await?;
        Ok((channel, status))
    }

    /// Player state, or None when no process answers
    async fn player_state(&self) -> Option<PlayerState> {
        let channel = self.live_channel("status").await.ok()?;
        channel.status().await.ok().map(|status| status.state)
    }
}

#[async_trait]
impl MediaPlayer for VlcSession {
    async fn start(&self, pair: &AssetPair, transpose: i32) -> Result<()> {
        let _launch = self.launch_lock.lock().await;

        if matches!(
            self.player_state().await,
            Some(PlayerState::Playing | PlayerState::Paused)
        ) {
            debug!("Player is currently playing, stopping track...");
            self.stop().await;
            // control server stays borked if relaunched right after a stop
            tokio::time::sleep(self.config.settle_after_stop()).await;
        }
        self.teardown().await;

        let credential = generate_credential();
        let channel = ControlChannel::new(
            self.config.http_port,
            credential.clone(),
            self.config.status_timeout(),
        )?;
        let args = self.launch_args(&credential, &pair.primary, transpose);
        debug!(
            player = %self.config.path.display(),
            media = %pair.primary.display(),
            transpose,
            "Launching player"
        );

        let kill_switch = {
            let mut inner = self.inner.lock().await;
            if transpose != 0 {
                self.open_grace_window(&mut inner);
            }

            let process = match PlayerProcess::spawn(&self.config.path, &args) {
                Ok(process) => process,
                Err(e) => {
                    self.close_grace_window(&mut inner);
                    return Err(e);
                }
            };
            let kill_switch = process.kill_switch();

            inner.process = Some(process);
            inner.channel = Some(channel.clone());
            inner.pair = Some(pair.clone());
            kill_switch
        };
        info!(media = %pair.primary.display(), transpose, "Player launched");

        tokio::time::sleep(self.config.post_launch_delay()).await;

        if tokio::fs::try_exists(&pair.secondary).await.unwrap_or(false) {
            let enqueue = PlayerCommand::Enqueue(pair.secondary.clone());
            if let Err(e) = channel.send(&enqueue).await {
                warn!(
                    secondary = %pair.secondary.display(),
                    "Failed to enqueue paired track: {}", e
                );
            }
        } else {
            debug!(secondary = %pair.secondary.display(), "No paired track on disk");
        }

        let watcher = NearEndWatcher::spawn(
            channel.clone(),
            kill_switch,
            WatchSettings {
                start_delay: self.config.watcher_delay(),
                poll_interval: self.config.poll_interval(),
                near_end_ratio: self.config.near_end_ratio,
            },
        );

        let mut inner = self.inner.lock().await;
        let same_process = inner
            .channel
            .as_ref()
            .is_some_and(|c| c.credential() == channel.credential());
        if same_process {
            inner.watcher = Some(watcher);
        } else {
            // killed while we were settling
            watcher.stop();
        }
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.command(PlayerCommand::Pause).await
    }

    async fn resume(&self) -> Result<()> {
        self.command(PlayerCommand::Play).await
    }

    async fn stop(&self) {
        let Ok(channel) = self.live_channel(PlayerCommand::Stop.name()).await else {
            debug!("No player process to stop");
            return;
        };
        if let Err(e) = channel.send(&PlayerCommand::Stop).await {
            warn!(
                "Track stop: server may have shut down before http return code received: {}",
                e
            );
        }
    }

    async fn kill(&self) {
        self.teardown().await;
        let mut inner = self.inner.lock().await;
        self.close_grace_window(&mut inner);
    }

    async fn seek(&self, position: i64) -> Result<()> {
        self.command(PlayerCommand::Seek(position.max(0))).await
    }

    async fn fast_forward(&self) -> Result<()> {
        let (channel, status) = self.current_status("fast_forward").await?;
        channel
            .send(&PlayerCommand::Seek(status.time + self.config.seek_step_secs))
            .await
    }

    async fn fast_backward(&self) -> Result<()> {
        let (channel, status) = self.current_status("fast_backward").await?;
        let target = (status.time - self.config.seek_step_secs).max(0);
        channel.send(&PlayerCommand::Seek(target)).await
    }

    async fn restart(&self) -> Result<()> {
        self.seek(0).await?;
        self.resume().await
    }

    async fn volume_up(&self) -> Result<()> {
        let (channel, status) = self.current_status("volume_up").await?;
        let target = status.volume + self.config.volume_step;
        if target < self.config.max_volume {
            channel.send(&PlayerCommand::Volume(target)).await
        } else {
            debug!(volume = status.volume, "Volume already at maximum");
            Ok(())
        }
    }

    async fn volume_down(&self) -> Result<()> {
        let (channel, status) = self.current_status("volume_down").await?;
        let target = (status.volume - self.config.volume_step).max(0);
        channel.send(&PlayerCommand::Volume(target)).await
    }

    async fn switch_track_pair(&self) -> Result<()> {
        let (channel, status) = self.current_status("switch_track_pair").await?;
        let position = status.time;

        channel.send(&PlayerCommand::Next).await?;
        tokio::time::sleep(SWITCH_SEEK_DELAY).await;
        channel.send(&PlayerCommand::Seek(position)).await?;

        let Some(swapped) = self.inner.lock().await.pair.as_ref().map(AssetPair::swapped) else {
            return Ok(());
        };

        // queue the previous primary again so the swap can be repeated
        if tokio::fs::try_exists(&swapped.secondary).await.unwrap_or(false) {
            if let Err(e) = channel
                .send(&PlayerCommand::Enqueue(swapped.secondary.clone()))
                .await
            {
                warn!("Failed to re-enqueue {}: {}", swapped.secondary.display(), e);
            }
        }

        let mut inner = self.inner.lock().await;
        let same_process = inner
            .channel
            .as_ref()
            .is_some_and(|c| c.credential() == channel.credential());
        if same_process {
            info!(kind = %swapped.primary_kind, position, "Switched track pair");
            inner.pair = Some(swapped);
        } else {
            debug!("Player replaced during track switch; keeping new pair");
        }
        Ok(())
    }

    async fn is_alive(&self) -> bool {
        if self.transposing.load(Ordering::SeqCst) {
            return true;
        }
        self.inner.lock().await.process_alive()
    }

    fn is_transposing(&self) -> bool {
        self.transposing.load(Ordering::SeqCst)
    }

    async fn is_playing(&self) -> bool {
        self.player_state().await == Some(PlayerState::Playing)
    }

    async fn is_paused(&self) -> bool {
        self.player_state().await == Some(PlayerState::Paused)
    }

    async fn status(&self) -> Result<PlayerStatus> {
        self.live_channel("status").await?.status().await
    }
}
