//! Test helper modules for kara-player integration tests
//!
//! Provides reusable test doubles:
//! - MockPlayer: scripted stand-in for the VLC session
//! - StaticLibrary: in-memory song listing
//! - supervisor builders wiring both into a `Supervisor`

#![allow(dead_code)]

pub mod mock_player;
pub mod static_library;

pub use mock_player::MockPlayer;
pub use static_library::StaticLibrary;

use kara_player::config::SupervisorConfig;
use kara_player::Supervisor;
use std::path::PathBuf;
use std::sync::Arc;

/// Song path the way the library lists it
pub fn song(name: &str) -> PathBuf {
    PathBuf::from(format!("/songs/{}---abc123_accompaniment.mp4", name))
}

/// Library listing most tests queue from
pub fn catalogue() -> Vec<PathBuf> {
    ["A", "B", "Africa", "Hello"].into_iter().map(song).collect()
}

/// Supervisor whose library holds `catalogue()`
pub fn stocked_supervisor() -> (Arc<Supervisor>, Arc<MockPlayer>) {
    supervisor_with(catalogue())
}

/// Supervisor over a fresh mock player and the given library songs
pub fn supervisor_with(songs: Vec<PathBuf>) -> (Arc<Supervisor>, Arc<MockPlayer>) {
    let player = Arc::new(MockPlayer::new());
    let library = Arc::new(StaticLibrary::new(songs));
    let supervisor = Arc::new(Supervisor::new(
        player.clone(),
        library,
        &SupervisorConfig {
            tick_interval_ms: 20,
        },
    ));
    (supervisor, player)
}
