//! Identifier newtypes and wire-facing records.
//!
//! User and room identifiers are opaque strings assigned by the service.
//! Message identifiers are canonical integers: they are parsed and
//! validated at ingestion (via [`FromStr`]) and never compared as strings.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque user identifier assigned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a user id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Opaque room identifier assigned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Create a room id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Message identifier, monotonically increasing per room.
///
/// Doubles as the ordering key for display and as the read-cursor position
/// marker: the maximum identifier ever seen in a room defines "latest".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    /// Create a message id from its integer value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The integer value of the identifier.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for MessageId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for MessageId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

/// A single chat message.
///
/// Immutable once created: the store never mutates or deletes a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Per-room monotonic identifier.
    pub id: MessageId,
    /// Author of the message.
    pub sender: UserId,
    /// Room the message belongs to.
    pub room: RoomId,
    /// Message body.
    pub body: String,
    /// Server-assigned timestamp, milliseconds since the epoch.
    pub timestamp_ms: u64,
}

/// A room the user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Room identifier.
    pub id: RoomId,
    /// Display name. For private conversations this is the deterministic
    /// pair key derived from the two participant identifiers.
    pub name: String,
    /// Whether this is a private two-party conversation.
    pub private: bool,
    /// Members in server order.
    pub member_ids: Vec<UserId>,
    /// Creation timestamp, milliseconds since the epoch.
    pub created_at_ms: u64,
    /// Last-activity timestamp used for room-list ordering. Advanced
    /// locally when messages arrive, so it may run ahead of the server's
    /// snapshot.
    #[serde(default)]
    pub last_activity_ms: u64,
}

/// Request payload for creating a room.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomOptions {
    /// Display name for the new room.
    pub name: String,
    /// Whether the room is a private conversation.
    pub private: bool,
    /// Users to invite on creation.
    pub add_user_ids: Vec<UserId>,
}

/// Request payload for adding or removing a room member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipChange {
    /// The member being added or removed.
    pub user_id: UserId,
    /// The room whose membership changes.
    pub room_id: RoomId,
}
