//! Chat-input command dispatch.
//!
//! Recognizes `invite <userId>`, `remove <userId>` and `leave` by the
//! first whitespace-delimited token. Anything else is ordinary chat text
//! and parses to `None`, since arbitrary input shares this path.

use palaver_core::UserId;

/// Parsed chat-input command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `invite <userId>`: add a member to the current room.
    Invite(UserId),

    /// `remove <userId>`: remove a member from the current room.
    Remove(UserId),

    /// `leave`: the caller leaves the current room.
    Leave,
}

impl Command {
    /// Parse the leading command token of a chat input line.
    ///
    /// Returns `None` for unrecognized or incomplete input; the caller
    /// treats that as a silent no-op, never an error.
    pub fn parse(text: &str) -> Option<Self> {
        let mut tokens = text.split_whitespace();
        match tokens.next()? {
            "invite" => tokens.next().map(|id| Self::Invite(UserId::from(id))),
            "remove" => tokens.next().map(|id| Self::Remove(UserId::from(id))),
            "leave" => Some(Self::Leave),
            _ => None,
        }
    }
}
