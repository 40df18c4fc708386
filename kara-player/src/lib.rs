//! Kara player library
//!
//! Playback supervision core of the karaoke controller:
//! - `player`: one external VLC process driven over its HTTP control interface
//! - `queue`: pending song requests
//! - `supervisor`: control loop and now-playing record
//! - `library`: songs folder listing
//! - `api`: HTTP control surface

pub mod api;
pub mod config;
pub mod error;
pub mod library;
pub mod player;
pub mod queue;
pub mod supervisor;

pub use error::{Error, Result};
pub use supervisor::Supervisor;
