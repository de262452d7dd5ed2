//! deltabot core: wire-level contracts, normalized values, and the error surface.
//!
//! This crate defines the JSON-RPC envelopes exchanged with the worker
//! process, the raw event envelope it pushes, protocol constants, and the
//! error type shared by the runtime and bots. It carries no async runtime so
//! it can be reused by tooling and tests without pulling in tokio.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed worker output surfaces as `BotError::Decode` instead of
//! bringing the bot down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;
pub mod value;

/// Shared result type.
pub use error::{BotError, ErrorKind, Result};
pub use value::NormalizedValue;
