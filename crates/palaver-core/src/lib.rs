//! Palaver core
//!
//! Data model and leaf stores for the chat client synchronization core.
//! Everything here is owned and mutated exclusively by the session
//! controller in `palaver-client`; this crate only defines the entities,
//! the per-entity stores, and the contract with the external service.
//!
//! # Components
//!
//! - [`MessageStore`]: per-room, append-only message map with monotonic
//!   identifiers
//! - [`CursorTracker`]: per-room, per-user read position, never decreasing
//! - [`TypingRegistry`]: transient set of composing users per room
//! - [`RoomDirectory`]: local copy of the rooms the user belongs to,
//!   ordered by last activity
//! - [`ChatService`]: the authenticated user handle provided by the
//!   auth/session layer

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cursor;
pub mod directory;
pub mod message_store;
pub mod service;
pub mod typing;
pub mod types;

pub use cursor::CursorTracker;
pub use directory::RoomDirectory;
pub use message_store::MessageStore;
pub use service::{ChatService, ServiceError};
pub use typing::TypingRegistry;
pub use types::{MembershipChange, Message, MessageId, Room, RoomId, RoomOptions, UserId};
