//! External player process handle
//!
//! The child is owned by a reaper task that waits for it to exit or for a
//! kill request. Liveness is read from a flag the reaper clears, so checking
//! it never blocks on the process.

use crate::error::{Error, Result};
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How long `kill` waits for the reaper to confirm exit
const KILL_WAIT: Duration = Duration::from_secs(2);

/// Cloneable request to terminate a running player
///
/// Handed to the near-end watcher so it can end the track without owning
/// the process.
#[derive(Clone)]
pub struct KillSwitch(CancellationToken);

impl KillSwitch {
    /// Switch not tied to any process yet
    pub fn new() -> Self {
        Self(CancellationToken::new())
    }

    pub fn trigger(&self) {
        self.0.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.0.is_cancelled()
    }
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::new()
    }
}

/// One launched player process
pub struct PlayerProcess {
    pid: Option<u32>,
    alive: Arc<AtomicBool>,
    kill: CancellationToken,
    reaper: Option<JoinHandle<()>>,
}

impl PlayerProcess {
    /// Launch `program` with `args`
    pub fn spawn(program: &Path, args: &[String]) -> Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::ProcessStartFailure(format!("{}: {}", program.display(), e)))?;

        let pid = child.id();
        let alive = Arc::new(AtomicBool::new(true));
        let kill = CancellationToken::new();

        let reaper = {
            let alive = Arc::clone(&alive);
            let kill = kill.clone();
            tokio::spawn(async move {
                let exited = tokio::select! {
                    status = child.wait() => Some(status),
                    _ = kill.cancelled() => None,
                };

                match exited {
                    Some(Ok(status)) => debug!(?pid, %status, "Player process exited"),
                    Some(Err(e)) => warn!(?pid, "Failed waiting on player process: {}", e),
                    None => match child.kill().await {
                        Ok(()) => debug!(?pid, "Player process killed"),
                        Err(e) => warn!(?pid, "Failed to kill player process: {}", e),
                    },
                }
                alive.store(false, Ordering::SeqCst);
            })
        };

        Ok(Self {
            pid,
            alive,
            kill,
            reaper: Some(reaper),
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// True until the process has exited or been killed
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub fn kill_switch(&self) -> KillSwitch {
        KillSwitch(self.kill.clone())
    }

    /// Forcibly terminate and wait (bounded) for the reaper to finish
    pub async fn kill(&mut self) {
        self.kill.cancel();
        if let Some(reaper) = self.reaper.take() {
            if tokio::time::timeout(KILL_WAIT, reaper).await.is_err() {
                warn!(pid = ?self.pid, "Player process did not exit within {:?}", KILL_WAIT);
            }
        }
    }
}

impl Drop for PlayerProcess {
    fn drop(&mut self) {
        // Reaper kills the child; kill_on_drop covers an aborted runtime
        self.kill.cancel();
    }
}
