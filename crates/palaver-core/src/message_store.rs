//! Per-room message store.
//!
//! Append-only mapping from room to ordered messages. Identifiers are
//! monotonic per room, so identifier order is display order; a `BTreeMap`
//! keeps iteration in that order without re-sorting on insert.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use crate::types::{Message, MessageId, RoomId};

/// Append-only, idempotent store of messages keyed by room and identifier.
#[derive(Debug, Default, Clone)]
pub struct MessageStore {
    rooms: HashMap<RoomId, BTreeMap<MessageId, Message>>,
}

impl MessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a message under its room and identifier.
    ///
    /// Re-inserting an identifier already present is not an error: the
    /// entry is overwritten with identical content and ordering is
    /// unchanged. Returns `true` when the identifier was new.
    pub fn insert(&mut self, message: Message) -> bool {
        let room = message.room.clone();
        let id = message.id;
        let replaced = self.rooms.entry(room.clone()).or_default().insert(id, message);
        if replaced.is_some() {
            tracing::debug!(room = %room, id = %id, "duplicate message id, entry overwritten");
        }
        replaced.is_none()
    }

    /// Highest identifier ever seen in a room.
    pub fn latest(&self, room: &RoomId) -> Option<MessageId> {
        self.rooms.get(room).and_then(|messages| messages.keys().next_back().copied())
    }

    /// Messages of a room in identifier order.
    pub fn messages(&self, room: &RoomId) -> impl Iterator<Item = &Message> {
        self.rooms.get(room).into_iter().flat_map(BTreeMap::values)
    }

    /// Number of messages held for a room.
    pub fn len(&self, room: &RoomId) -> usize {
        self.rooms.get(room).map_or(0, BTreeMap::len)
    }

    /// Whether any message is held for a room.
    pub fn has_messages(&self, room: &RoomId) -> bool {
        self.len(room) > 0
    }

    /// Messages in a room with an identifier strictly above `cursor`.
    ///
    /// With no cursor recorded, every held message counts as unread.
    pub fn count_after(&self, room: &RoomId, cursor: Option<MessageId>) -> usize {
        let Some(messages) = self.rooms.get(room) else {
            return 0;
        };
        match cursor {
            None => messages.len(),
            Some(position) => {
                messages.range((Bound::Excluded(position), Bound::Unbounded)).count()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;

    fn message(room: &str, id: u64) -> Message {
        Message {
            id: MessageId::new(id),
            sender: UserId::from("alice"),
            room: RoomId::from(room),
            body: format!("message {id}"),
            timestamp_ms: 1_000 + id,
        }
    }

    #[test]
    fn empty_store_has_no_latest() {
        let store = MessageStore::new();
        assert_eq!(store.latest(&RoomId::from("general")), None);
        assert!(!store.has_messages(&RoomId::from("general")));
    }

    #[test]
    fn insert_returns_true_for_new_id() {
        let mut store = MessageStore::new();
        assert!(store.insert(message("general", 1)));
        assert!(!store.insert(message("general", 1)));
    }

    #[test]
    fn duplicate_insert_leaves_store_unchanged() {
        let mut store = MessageStore::new();
        let room = RoomId::from("general");
        store.insert(message("general", 1));
        store.insert(message("general", 2));
        store.insert(message("general", 5));

        store.insert(message("general", 2));

        assert_eq!(store.len(&room), 3);
        let ids: Vec<u64> = store.messages(&room).map(|m| m.id.value()).collect();
        assert_eq!(ids, vec![1, 2, 5]);
    }

    #[test]
    fn latest_is_highest_id_regardless_of_arrival_order() {
        let mut store = MessageStore::new();
        let room = RoomId::from("general");
        store.insert(message("general", 5));
        store.insert(message("general", 1));
        store.insert(message("general", 3));
        assert_eq!(store.latest(&room), Some(MessageId::new(5)));
    }

    #[test]
    fn rooms_are_independent() {
        let mut store = MessageStore::new();
        store.insert(message("general", 1));
        store.insert(message("random", 9));
        assert_eq!(store.latest(&RoomId::from("general")), Some(MessageId::new(1)));
        assert_eq!(store.latest(&RoomId::from("random")), Some(MessageId::new(9)));
    }

    #[test]
    fn count_after_respects_cursor() {
        let mut store = MessageStore::new();
        let room = RoomId::from("general");
        for id in [1, 2, 5, 7] {
            store.insert(message("general", id));
        }
        assert_eq!(store.count_after(&room, None), 4);
        assert_eq!(store.count_after(&room, Some(MessageId::new(2))), 2);
        assert_eq!(store.count_after(&room, Some(MessageId::new(7))), 0);
        // Cursor between identifiers counts only the strictly-greater ones
        assert_eq!(store.count_after(&room, Some(MessageId::new(3))), 2);
    }
}
