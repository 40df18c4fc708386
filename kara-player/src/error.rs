//! Error types for kara-player
//!
//! Queue misuse and player failures are surfaced to the caller and never
//! retried. Status-query failures inside the supervisor loop and the
//! near-end watcher are folded into "not alive" before they get here.

use thiserror::Error;

/// Main error type for kara-player
#[derive(Error, Debug)]
pub enum Error {
    /// No live player process when a control command was attempted
    #[error("Player unreachable: {0}")]
    PlayerUnreachable(String),

    /// Source already present in the queue
    #[error("Already in queue: {0}")]
    DuplicateEntry(String),

    /// No queue entry matches the requested fragment
    #[error("Not in queue: {0}")]
    EntryNotFound(String),

    /// Queue has no entries
    #[error("Queue is empty")]
    QueueEmpty,

    /// Library listing has no entries
    #[error("Library is empty")]
    LibraryEmpty,

    /// More random entries requested than the library can supply
    #[error("Cannot pick {requested} random songs from {available} candidates")]
    InsufficientLibrary {
        /// Number of entries requested
        requested: usize,
        /// Distinct candidates available
        available: usize,
    },

    /// Queue edit that cannot be applied (already first/last)
    #[error("Invalid queue edit: {0}")]
    InvalidEdit(String),

    /// External player failed to launch
    #[error("Player failed to start: {0}")]
    ProcessStartFailure(String),

    /// Control endpoint request failed
    #[error("Player transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Control endpoint answered with a document we cannot read
    #[error("Bad player status: {0}")]
    StatusParse(String),

    /// Invalid request parameter
    #[error("Bad request: {0}")]
    InvalidRequest(String),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from shared helpers
    #[error(transparent)]
    Common(#[from] kara_common::Error),
}

/// Convenience Result type using kara-player Error
pub type Result<T> = std::result::Result<T, Error>;
