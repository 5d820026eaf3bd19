//! Typing registry.
//!
//! Pure set membership per room. No timers live here: timeout-based
//! expiry is owned by the transport, which emits an explicit stop event.
//! Set and clear are both idempotent.

use std::collections::{HashMap, HashSet};

use crate::types::{RoomId, UserId};

/// Per-room set of users currently composing a message.
#[derive(Debug, Default, Clone)]
pub struct TypingRegistry {
    typists: HashMap<RoomId, HashSet<UserId>>,
}

impl TypingRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `user` is composing in `room`.
    ///
    /// Returns `true` when the entry was newly added.
    pub fn start(&mut self, room: &RoomId, user: &UserId) -> bool {
        self.typists.entry(room.clone()).or_default().insert(user.clone())
    }

    /// Clear the composing entry for `user` in `room`.
    ///
    /// Clearing an absent entry is a no-op. Returns `true` when an entry
    /// was actually removed.
    pub fn stop(&mut self, room: &RoomId, user: &UserId) -> bool {
        let Some(users) = self.typists.get_mut(room) else {
            return false;
        };
        let removed = users.remove(user);
        if users.is_empty() {
            self.typists.remove(room);
        }
        removed
    }

    /// Whether `user` is currently composing in `room`.
    pub fn is_typing(&self, room: &RoomId, user: &UserId) -> bool {
        self.typists.get(room).is_some_and(|users| users.contains(user))
    }

    /// Users currently composing in `room`.
    pub fn typists(&self, room: &RoomId) -> impl Iterator<Item = &UserId> {
        self.typists.get(room).into_iter().flatten()
    }
}
