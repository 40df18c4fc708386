//! Playback-related type definitions

use serde::{Deserialize, Serialize};

/// Supervisor playback state
///
/// `Transposing` overlays `Playing` while a pitch-shifted restart is inside
/// its start-up grace window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing playing (queue may be non-empty)
    #[default]
    Idle,
    /// Player launched for the dequeued entry, not yet seen alive
    Starting,
    /// Player alive and playing
    Playing,
    /// Player alive and paused
    Paused,
    /// Restarted with a new pitch shift, grace window pending
    Transposing,
    /// Supervisor loop has exited
    Stopped,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Starting => write!(f, "starting"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Transposing => write!(f, "transposing"),
            PlaybackState::Stopped => write!(f, "stopped"),
        }
    }
}

/// What caused a queue change
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueueChangeTrigger {
    /// Entry appended by a user
    Enqueue,
    /// Head entry pulled for playback
    Dequeue,
    /// Entry moved up or down
    Reorder,
    /// Entry deleted from the queue
    Remove,
    /// Randomizer appended entries
    RandomFill,
    /// Whole queue cleared
    Clear,
}
