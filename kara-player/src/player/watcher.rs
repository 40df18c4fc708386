//! Near-end-of-track watcher
//!
//! The player does not reliably report end of stream before its control
//! server goes away, so one watcher task per process polls the status and
//! kills the process once the elapsed/total ratio passes the threshold.
//! Any status failure means the process is already gone and the watcher
//! exits quietly.

use super::process::KillSwitch;
use super::protocol::{ControlChannel, PlayerState};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Watcher pacing
#[derive(Debug, Clone, Copy)]
pub struct WatchSettings {
    /// Wait before the first poll (control server start-up)
    pub start_delay: Duration,
    /// Delay between polls
    pub poll_interval: Duration,
    /// Ratio above which the track counts as finished
    pub near_end_ratio: f64,
}

/// Handle to a running watcher task
pub struct NearEndWatcher {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl NearEndWatcher {
    /// Start watching the process behind `channel`
    pub fn spawn(channel: ControlChannel, kill: KillSwitch, settings: WatchSettings) -> Self {
        let cancel = CancellationToken::new();
        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => debug!("Near-end watcher cancelled"),
                    _ = watch(channel, kill, settings) => {}
                }
            })
        };
        Self { cancel, handle }
    }

    /// True once the task has returned
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Tear the watcher down
    pub fn stop(self) {
        self.cancel.cancel();
    }
}

impl Drop for NearEndWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn watch(channel: ControlChannel, kill: KillSwitch, settings: WatchSettings) {
    tokio::time::sleep(settings.start_delay).await;

    loop {
        let status = match channel.status().await {
            Ok(status) => status,
            Err(e) => {
                debug!("Near-end watcher lost the player: {}", e);
                break;
            }
        };

        match status.state {
            PlayerState::Playing => {
                if let Some(progress) = status.progress() {
                    if progress > settings.near_end_ratio {
                        info!(
                            time = status.time,
                            length = status.length,
                            "Track reached its end, stopping player"
                        );
                        kill.trigger();
                        break;
                    }
                }
            }
            // keep watching through a pause
            PlayerState::Paused => {}
            PlayerState::Stopped | PlayerState::Unknown => break,
        }

        tokio::time::sleep(settings.poll_interval).await;
    }

    debug!("Near-end watcher exits");
}
