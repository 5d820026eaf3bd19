//! Per-room subscription lifecycle.
//!
//! Each room moves `Unsubscribed -> Subscribing -> Subscribed` at most
//! once and then stays subscribed for the session; reconnect and cleanup
//! belong to the external transport. A failed attach rolls back to
//! `Unsubscribed` so a later join can retry.

use std::collections::HashMap;

use palaver_core::RoomId;

/// Lifecycle of a room's event-stream attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriptionState {
    /// No attachment requested yet.
    #[default]
    Unsubscribed,

    /// Attach request in flight.
    Subscribing,

    /// Stream attached; inbound events for the room are accepted.
    Subscribed,
}

/// Tracks the attach state machine per room.
///
/// Invariant: at most one active subscription per room. Attaching a room
/// that is already subscribing or subscribed is a no-op, not an error.
#[derive(Debug, Default, Clone)]
pub struct SubscriptionManager {
    states: HashMap<RoomId, SubscriptionState>,
}

impl SubscriptionManager {
    /// Create a manager with no subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for a room.
    pub fn state(&self, room: &RoomId) -> SubscriptionState {
        self.states.get(room).copied().unwrap_or_default()
    }

    /// Whether inbound events for the room should be accepted.
    pub fn is_subscribed(&self, room: &RoomId) -> bool {
        self.state(room) == SubscriptionState::Subscribed
    }

    /// Begin attaching a room's event stream.
    ///
    /// Returns `false` when the room is already subscribing or
    /// subscribed, so the caller issues at most one attach per room.
    pub fn begin_attach(&mut self, room: &RoomId) -> bool {
        match self.state(room) {
            SubscriptionState::Unsubscribed => {
                self.states.insert(room.clone(), SubscriptionState::Subscribing);
                true
            },
            SubscriptionState::Subscribing | SubscriptionState::Subscribed => false,
        }
    }

    /// Mark an attach as completed.
    pub fn confirm(&mut self, room: &RoomId) {
        self.states.insert(room.clone(), SubscriptionState::Subscribed);
    }

    /// Roll back a failed attach so a later join can retry.
    pub fn abort(&mut self, room: &RoomId) {
        self.states.remove(room);
    }

    /// Number of rooms currently in `Subscribed`.
    pub fn subscribed_count(&self) -> usize {
        self.states.values().filter(|s| **s == SubscriptionState::Subscribed).count()
    }
}
