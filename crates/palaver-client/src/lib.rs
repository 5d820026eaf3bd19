//! Palaver client
//!
//! Session controller for the Palaver chat synchronization core. Owns
//! room, message, typing, and cursor state and reconciles the inbound
//! event stream with a single coherent view for the presentation layer.
//!
//! # Architecture
//!
//! The controller is a state machine driven by explicit messages:
//!
//! - User actions are async methods that may delegate to the
//!   [`ChatService`] handle (create room, membership changes, cursors)
//! - Inbound transport events become typed [`InboundEvent`]s applied at a
//!   single processing point ([`SessionController::apply`])
//! - Presentation side effects come back as [`SessionEffect`]s; state is
//!   read through the [`Snapshot`]
//!
//! # Components
//!
//! - [`SessionController`]: top-level orchestrator and action surface
//! - [`SubscriptionManager`]: per-room attach state machine
//! - [`Command`]: chat-input mini-command parser

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod command;
mod error;
mod event;
mod session;
mod subscription;

pub use command::Command;
pub use error::SessionError;
pub use event::{InboundEvent, SessionEffect};
pub use palaver_core::{
    ChatService, MembershipChange, Message, MessageId, Room, RoomId, RoomOptions, ServiceError,
    UserId,
};
pub use session::{SessionController, Snapshot, UiFlags};
pub use subscription::{SubscriptionManager, SubscriptionState};
