//! Chat service contract.
//!
//! The authenticated user handle the auth layer gives the session
//! controller. Production implementations wrap the external pub/sub
//! client (which owns reconnect and wire-level dedup); `palaver-harness`
//! provides an in-memory fake for tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{MembershipChange, MessageId, Room, RoomId, RoomOptions, UserId};

/// Failures from delegated service operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The service rejected the request.
    #[error("request rejected: {reason}")]
    Rejected {
        /// Service-provided reason.
        reason: String,
    },

    /// The room is unknown to the service.
    #[error("unknown room: {0}")]
    UnknownRoom(RoomId),

    /// The user is unknown to the service.
    #[error("unknown user: {0}")]
    UnknownUser(UserId),

    /// Transport-level failure reaching the service.
    #[error("transport failure: {reason}")]
    Transport {
        /// Description of the transport failure.
        reason: String,
    },
}

/// Authenticated user handle exposed by the auth/session layer.
///
/// Async operations run to completion or failure: the core issues no
/// retries and applies no timeouts. Between issuing a request and its
/// completion, events for unrelated rooms may interleave freely.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Identifier of the authenticated user.
    fn id(&self) -> UserId;

    /// Display name of the authenticated user.
    fn display_name(&self) -> String;

    /// Rooms the user currently belongs to.
    fn rooms(&self) -> Vec<Room>;

    /// Server-known read cursor for a room, if one was ever set.
    fn read_cursor(&self, room_id: &RoomId) -> Option<MessageId>;

    /// Create a room and return it.
    async fn create_room(&self, options: RoomOptions) -> Result<Room, ServiceError>;

    /// Add a member to a room. Returns the refreshed room.
    async fn add_user_to_room(&self, change: MembershipChange) -> Result<Room, ServiceError>;

    /// Remove another member from a room. Returns the refreshed room.
    ///
    /// Self-removal is a distinct server operation: use
    /// [`ChatService::leave_room`] instead.
    async fn remove_user_from_room(&self, change: MembershipChange) -> Result<Room, ServiceError>;

    /// Leave a room voluntarily.
    async fn leave_room(&self, room_id: &RoomId) -> Result<(), ServiceError>;

    /// Persist the read cursor for a room.
    async fn set_read_cursor(
        &self,
        room_id: &RoomId,
        position: MessageId,
    ) -> Result<(), ServiceError>;

    /// Send a message to a room. Delivery echoes back through the event
    /// stream like any other inbound message.
    async fn send_message(&self, room_id: &RoomId, body: String) -> Result<(), ServiceError>;

    /// Attach the event stream for a room.
    async fn subscribe_to_room(&self, room_id: &RoomId) -> Result<(), ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ServiceError::UnknownRoom(RoomId::from("general"));
        assert_eq!(err.to_string(), "unknown room: general");

        let err = ServiceError::Rejected { reason: "not a member".to_owned() };
        assert_eq!(err.to_string(), "request rejected: not a member");
    }
}
