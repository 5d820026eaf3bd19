//! Inbound events and session effects.
//!
//! The transport's callback hooks become typed [`InboundEvent`]s fed to
//! the controller's single processing point, and presentation side
//! effects come back as [`SessionEffect`]s for the caller to execute.
//! Neither direction carries ambient mutable state or closures.

use palaver_core::{Message, RoomId, UserId};

/// Event delivered by the transport for a subscribed room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A new message arrived in a room.
    NewMessage(Message),

    /// A user started composing in a room.
    TypingStarted {
        /// Room the signal is for.
        room: RoomId,
        /// The composing user.
        user: UserId,
    },

    /// A user stopped composing, either explicitly or via the
    /// transport-owned typing timeout.
    TypingStopped {
        /// Room the signal is for.
        room: RoomId,
        /// The user who stopped.
        user: UserId,
    },

    /// Externally tracked presence data changed. The core stores no
    /// presence itself; this only prompts a snapshot refresh.
    PresenceChanged,
}

/// Presentation side effect requested by the controller.
///
/// The controller never renders; it hands these back for the caller to
/// act on after applying an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEffect {
    /// Scroll the open room's message list to the latest entry.
    ScrollToLatest,

    /// Derived state changed: re-read the snapshot.
    Refresh,
}
