//! Read-cursor tracking.
//!
//! Invariant: a recorded cursor never decreases. Both write paths (the
//! explicit user action and the auto-advance when a message lands in the
//! open room) funnel through [`CursorTracker::advance`], which takes the
//! maximum of the current and proposed positions.

use std::collections::HashMap;

use crate::types::{MessageId, RoomId, UserId};

/// Per-room, per-user last-read position.
#[derive(Debug, Default, Clone)]
pub struct CursorTracker {
    positions: HashMap<RoomId, HashMap<UserId, MessageId>>,
}

impl CursorTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the cursor to `max(current, position)`.
    ///
    /// Returns the recorded position when the cursor actually moved,
    /// `None` when the proposal was at or behind the current value (a
    /// silent no-op, not an error).
    pub fn advance(
        &mut self,
        room: &RoomId,
        user: &UserId,
        position: MessageId,
    ) -> Option<MessageId> {
        let by_user = self.positions.entry(room.clone()).or_default();
        match by_user.get(user) {
            Some(&current) if current >= position => None,
            _ => {
                by_user.insert(user.clone(), position);
                Some(position)
            },
        }
    }

    /// The recorded position for a (room, user) pair, if any.
    pub fn position(&self, room: &RoomId, user: &UserId) -> Option<MessageId> {
        self.positions.get(room).and_then(|by_user| by_user.get(user)).copied()
    }
}
