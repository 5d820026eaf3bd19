//! Room directory.
//!
//! Local copy of the rooms the active user belongs to, ordered for
//! display by last activity. Leaving a room only drops the local copy;
//! the room itself may still exist server-side.

use std::collections::HashMap;

use crate::types::{Room, RoomId, UserId};

/// The set of rooms visible to the active user.
#[derive(Debug, Default, Clone)]
pub struct RoomDirectory {
    rooms: HashMap<RoomId, Room>,
}

impl RoomDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a room snapshot from the service.
    ///
    /// A locally derived `last_activity_ms` can run ahead of the server's
    /// snapshot; the fresher value wins so the room list never jumps
    /// backwards on a refresh.
    pub fn upsert(&mut self, mut room: Room) {
        if let Some(existing) = self.rooms.get(&room.id) {
            room.last_activity_ms = room.last_activity_ms.max(existing.last_activity_ms);
        }
        self.rooms.insert(room.id.clone(), room);
    }

    /// Drop the local copy of a room.
    pub fn remove(&mut self, room: &RoomId) -> Option<Room> {
        self.rooms.remove(room)
    }

    /// Look up a room by id.
    pub fn get(&self, room: &RoomId) -> Option<&Room> {
        self.rooms.get(room)
    }

    /// Whether the directory holds a room.
    pub fn contains(&self, room: &RoomId) -> bool {
        self.rooms.contains_key(room)
    }

    /// Number of rooms held.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Identifiers of all held rooms, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &RoomId> {
        self.rooms.keys()
    }

    /// Advance a room's activity timestamp. Never moves backwards.
    pub fn touch(&mut self, room: &RoomId, timestamp_ms: u64) {
        if let Some(entry) = self.rooms.get_mut(room) {
            entry.last_activity_ms = entry.last_activity_ms.max(timestamp_ms);
        }
    }

    /// Rooms ordered by most recent activity, name as tie-breaker so the
    /// list is stable.
    pub fn by_activity(&self) -> Vec<&Room> {
        let mut rooms: Vec<&Room> = self.rooms.values().collect();
        rooms.sort_by(|a, b| {
            b.last_activity_ms
                .cmp(&a.last_activity_ms)
                .then_with(|| a.name.cmp(&b.name))
        });
        rooms
    }

    /// The conversation key a participant derives for a private room with
    /// another user: the two identifiers concatenated, initiator first.
    pub fn conversation_name(me: &UserId, other: &UserId) -> String {
        format!("{me}{other}")
    }

    /// Find an existing private conversation between two users.
    ///
    /// Either participant may have created the room, so both
    /// concatenation orders of the pair are checked.
    pub fn find_conversation(&self, a: &UserId, b: &UserId) -> Option<&Room> {
        let ab = Self::conversation_name(a, b);
        let ba = Self::conversation_name(b, a);
        self.rooms.values().find(|room| room.private && (room.name == ab || room.name == ba))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str, name: &str, private: bool) -> Room {
        Room {
            id: RoomId::from(id),
            name: name.to_owned(),
            private,
            member_ids: Vec::new(),
            created_at_ms: 0,
            last_activity_ms: 0,
        }
    }

    #[test]
    fn upsert_and_get() {
        let mut directory = RoomDirectory::new();
        directory.upsert(room("general", "General", false));
        assert!(directory.contains(&RoomId::from("general")));
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn upsert_keeps_fresher_local_activity() {
        let mut directory = RoomDirectory::new();
        directory.upsert(room("general", "General", false));
        directory.touch(&RoomId::from("general"), 500);

        // Server refresh carries a stale activity timestamp
        directory.upsert(room("general", "General", false));

        let held = directory.get(&RoomId::from("general")).map(|r| r.last_activity_ms);
        assert_eq!(held, Some(500));
    }

    #[test]
    fn touch_never_moves_backwards() {
        let mut directory = RoomDirectory::new();
        let id = RoomId::from("general");
        directory.upsert(room("general", "General", false));
        directory.touch(&id, 900);
        directory.touch(&id, 300);
        assert_eq!(directory.get(&id).map(|r| r.last_activity_ms), Some(900));
    }

    #[test]
    fn by_activity_orders_most_recent_first() {
        let mut directory = RoomDirectory::new();
        directory.upsert(room("a", "Alpha", false));
        directory.upsert(room("b", "Beta", false));
        directory.upsert(room("c", "Gamma", false));
        directory.touch(&RoomId::from("b"), 200);
        directory.touch(&RoomId::from("c"), 100);

        let names: Vec<&str> = directory.by_activity().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "Gamma", "Alpha"]);
    }

    #[test]
    fn find_conversation_matches_either_key_order() {
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");
        let mut directory = RoomDirectory::new();
        directory.upsert(room("dm", "bobalice", true));

        assert!(directory.find_conversation(&alice, &bob).is_some());
        assert!(directory.find_conversation(&bob, &alice).is_some());
    }

    #[test]
    fn find_conversation_ignores_non_private_rooms() {
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");
        let mut directory = RoomDirectory::new();
        directory.upsert(room("public", "alicebob", false));

        assert!(directory.find_conversation(&alice, &bob).is_none());
    }
}
