//! Session error types.

use std::num::ParseIntError;

use palaver_core::ServiceError;
use thiserror::Error;

/// Errors surfaced to the caller of session operations.
///
/// Nothing here is fatal to the session: every failure is either a
/// rejected action for the presentation layer to display or a guard that
/// was silently absorbed upstream.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No authenticated user has been set.
    #[error("no active user")]
    NoActiveUser,

    /// The operation needs an open room and none is set.
    #[error("no current room")]
    NoCurrentRoom,

    /// A cursor position failed to parse as an integer identifier.
    #[error("invalid cursor position: {0}")]
    InvalidPosition(#[from] ParseIntError),

    /// A delegated service operation failed.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
}
