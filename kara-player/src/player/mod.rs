//! External media player control
//!
//! [`MediaPlayer`] is the seam between the supervisor and whatever actually
//! renders the song. [`VlcSession`] drives a VLC process through its HTTP
//! remote-control interface.

pub mod process;
pub mod protocol;
pub mod session;
pub mod watcher;

pub use protocol::{PlayerCommand, PlayerState, PlayerStatus};
pub use session::VlcSession;

use crate::error::Result;
use async_trait::async_trait;
use kara_common::AssetPair;

/// Control surface of one external player session
///
/// At most one player process exists per session. Every control command
/// fails with `Error::PlayerUnreachable` when no process is alive, except
/// `stop`, which only logs.
#[async_trait]
pub trait MediaPlayer: Send + Sync {
    /// Launch `pair.primary`, replacing any running process
    ///
    /// A non-zero `transpose` pitch-shifts by that many semitones and opens a
    /// grace window during which `is_alive` reports true regardless of the
    /// process state.
    async fn start(&self, pair: &AssetPair, transpose: i32) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn resume(&self) -> Result<()>;

    /// Stop playback; transport errors are logged, not returned
    async fn stop(&self);

    /// Forcibly terminate the process and tear down its watcher
    async fn kill(&self);

    /// Seek to an absolute position in seconds
    async fn seek(&self, position: i64) -> Result<()>;

    async fn fast_forward(&self) -> Result<()>;

    async fn fast_backward(&self) -> Result<()>;

    /// Back to the start of the track and play
    async fn restart(&self) -> Result<()>;

    async fn volume_up(&self) -> Result<()>;

    async fn volume_down(&self) -> Result<()>;

    /// Swap to the enqueued secondary asset, keeping the position
    async fn switch_track_pair(&self) -> Result<()>;

    /// Process alive, or transposing grace window open
    async fn is_alive(&self) -> bool;

    /// Transposing grace window open
    fn is_transposing(&self) -> bool;

    async fn is_playing(&self) -> bool;

    async fn is_paused(&self) -> bool;

    /// Current status document
    async fn status(&self) -> Result<PlayerStatus>;
}
