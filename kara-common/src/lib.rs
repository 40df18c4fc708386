//! # Kara Common Library
//!
//! Shared code for the karaoke controller crates including:
//! - Error types
//! - Configuration file and songs folder resolution
//! - Event types (KaraEvent enum) and the EventBus
//! - Song file naming conventions (display titles, vocal/accompaniment pairs)

pub mod config;
pub mod error;
pub mod events;
pub mod naming;

pub use error::{Error, Result};
pub use naming::{AssetPair, TrackKind};
