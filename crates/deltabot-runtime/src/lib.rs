//! deltabot runtime library entry.
//!
//! Wires the worker transport, the call proxy, event classification, the
//! hook registry and the client event loop together. Consumed by the
//! `deltabot` binary, by bots through the `deltabot` facade, and by
//! integration tests.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod events;
pub mod transport;

pub use client::{is_not_known_command, Client};
pub use transport::Rpc;
