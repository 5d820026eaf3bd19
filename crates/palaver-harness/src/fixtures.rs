//! Fixture builders shared by the test suites.

use palaver_core::{Message, MessageId, Room, RoomId, UserId};

/// A public room with no members and no activity.
pub fn room(id: &str, name: &str) -> Room {
    Room {
        id: RoomId::from(id),
        name: name.to_owned(),
        private: false,
        member_ids: Vec::new(),
        created_at_ms: 0,
        last_activity_ms: 0,
    }
}

/// A private two-party room keyed by `name`.
pub fn private_room(id: &str, name: &str, members: &[&str]) -> Room {
    Room {
        id: RoomId::from(id),
        name: name.to_owned(),
        private: true,
        member_ids: members.iter().map(|m| UserId::from(*m)).collect(),
        created_at_ms: 0,
        last_activity_ms: 0,
    }
}

/// A message with a timestamp derived from its identifier.
pub fn message(room: &str, id: u64, sender: &str) -> Message {
    Message {
        id: MessageId::new(id),
        sender: UserId::from(sender),
        room: RoomId::from(room),
        body: format!("message {id}"),
        timestamp_ms: 1_000 + id,
    }
}
