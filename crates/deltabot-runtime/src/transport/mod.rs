//! Transport layer (worker stdio JSON-RPC).
//!
//! Owns the worker's pipes: one task drains replies and routes them to the
//! awaiting caller by id, one task serializes outgoing requests. `Rpc` is the
//! cloneable handle callers use to issue calls concurrently.

pub mod codec;
pub mod methods;
pub mod process;
pub mod rpc;

pub use rpc::Rpc;
