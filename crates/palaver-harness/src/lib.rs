//! Test harness for the Palaver chat core.
//!
//! Provides [`FakeChatService`], an in-memory implementation of the
//! `ChatService` contract that records every delegated call, plus small
//! fixture builders. Integration and property suites live in `tests/`.
//!
//! The fake is deliberately dumb: it applies requests to local maps and
//! never pushes events on its own. Tests drive the inbound stream by
//! feeding `InboundEvent`s to the controller directly, which keeps every
//! scenario deterministic.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fake_service;
pub mod fixtures;

pub use fake_service::{FakeChatService, ServiceCall};
