//! Event types for the karaoke event system
//!
//! Provides shared event definitions and the EventBus used to push status
//! changes to UI observers.

mod playback_types;

pub use playback_types::{PlaybackState, QueueChangeTrigger};

use crate::naming::TrackKind;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Karaoke event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum KaraEvent {
    /// Supervisor state changed
    PlaybackStateChanged {
        /// State before change
        old_state: PlaybackState,
        /// State after change
        new_state: PlaybackState,
        /// When state changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Now playing record set or cleared
    NowPlayingChanged {
        /// Display title (None when cleared)
        title: Option<String>,
        /// Who requested the song
        requester: Option<String>,
        /// Active pitch shift in semitones
        transpose: i32,
        /// When the record changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Queue contents changed
    QueueChanged {
        /// Queue length after the change
        length: usize,
        /// What changed the queue
        trigger: QueueChangeTrigger,
        /// When queue changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Primary rendering switched between vocal and accompaniment
    TrackKindChanged {
        /// Rendering now heard
        kind: TrackKind,
        /// When it switched
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Current song restarted with a new pitch shift
    TransposeChanged {
        /// New pitch shift in semitones
        semitones: i32,
        /// When the restart was issued
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl KaraEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            KaraEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            KaraEvent::NowPlayingChanged { .. } => "NowPlayingChanged",
            KaraEvent::QueueChanged { .. } => "QueueChanged",
            KaraEvent::TrackKindChanged { .. } => "TrackKindChanged",
            KaraEvent::TransposeChanged { .. } => "TransposeChanged",
        }
    }
}

/// Broadcast channel for KaraEvent
///
/// Slow subscribers lose the oldest events once the channel capacity is
/// exceeded.
pub struct EventBus {
    tx: broadcast::Sender<KaraEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use kara_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.subscriber_count(), 0);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<KaraEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: KaraEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit_lossy(KaraEvent::TransposeChanged {
            semitones: -2,
            timestamp: chrono::Utc::now(),
        });

        match rx.recv().await.unwrap() {
            KaraEvent::TransposeChanged { semitones, .. } => assert_eq!(semitones, -2),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.emit_lossy(KaraEvent::QueueChanged {
            length: 0,
            trigger: QueueChangeTrigger::Clear,
            timestamp: chrono::Utc::now(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = KaraEvent::PlaybackStateChanged {
            old_state: PlaybackState::Idle,
            new_state: PlaybackState::Starting,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PlaybackStateChanged");
        assert_eq!(json["old_state"], "idle");
        assert_eq!(json["new_state"], "starting");
        assert_eq!(event.event_type(), "PlaybackStateChanged");
    }
}
