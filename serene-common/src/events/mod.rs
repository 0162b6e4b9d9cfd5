//! Event types for the Serene event system
//!
//! Provides shared event definitions and EventBus for playback hosts.

mod playback_types;

pub use playback_types::PlaybackState;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Playback session events
///
/// Events are broadcast via EventBus and can be serialized for delivery to
/// UI layers. All session notifications use this enum so consumers get
/// exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Playback of an activity began (step 0 is current)
    SessionStarted {
        session_id: Uuid,
        activity_id: String,
        step_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Current step changed (start, advance, or retreat)
    ///
    /// Triggers:
    /// - UI: Scroll the gallery carousel
    /// - UI: Show the step title and instructions
    StepChanged {
        session_id: Uuid,
        /// 0-based index into the activity's steps
        step_index: usize,
        /// 1-based number shown to the user
        step_number: usize,
        time_left_seconds: u32,
        /// Gallery slot shown for this step (None for an empty gallery)
        gallery_position: Option<usize>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Countdown decremented within the current step
    ///
    /// NOTE: Emitted once per clock tick; consumers that only need step
    /// boundaries should ignore it.
    TimerTick {
        session_id: Uuid,
        step_index: usize,
        time_left_seconds: u32,
    },

    /// Session state changed (Idle → Running, Running ↔ Paused, → Complete)
    PlaybackStateChanged {
        session_id: Uuid,
        old_state: PlaybackState,
        new_state: PlaybackState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Last step finished
    ///
    /// Emitted exactly once per session.
    SessionCompleted {
        session_id: Uuid,
        activity_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session torn down before completion (user navigated away)
    SessionAbandoned {
        session_id: Uuid,
        activity_id: String,
        step_index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SessionEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::SessionStarted { .. } => "SessionStarted",
            SessionEvent::StepChanged { .. } => "StepChanged",
            SessionEvent::TimerTick { .. } => "TimerTick",
            SessionEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            SessionEvent::SessionCompleted { .. } => "SessionCompleted",
            SessionEvent::SessionAbandoned { .. } => "SessionAbandoned",
        }
    }

    /// Session the event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            SessionEvent::SessionStarted { session_id, .. }
            | SessionEvent::StepChanged { session_id, .. }
            | SessionEvent::TimerTick { session_id, .. }
            | SessionEvent::PlaybackStateChanged { session_id, .. }
            | SessionEvent::SessionCompleted { session_id, .. }
            | SessionEvent::SessionAbandoned { session_id, .. } => *session_id,
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for session events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the player)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use serene_common::events::{EventBus, PlaybackState, SessionEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit(SessionEvent::PlaybackStateChanged {
///     session_id: uuid::Uuid::new_v4(),
///     old_state: PlaybackState::Running,
///     new_state: PlaybackState::Paused,
///     timestamp: chrono::Utc::now(),
/// }).ok();
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Capacity is the number of events buffered per subscriber before the
    /// oldest are dropped.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: SessionEvent,
    ) -> Result<usize, broadcast::error::SendError<SessionEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}
