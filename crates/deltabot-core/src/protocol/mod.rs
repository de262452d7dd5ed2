//! Protocol modules (JSON-RPC envelopes + worker events).
//!
//! Both directions of the worker pipe carry one UTF-8 JSON object per line:
//! - `rpc`: request encoding and response decoding.
//! - `event`: the envelope returned by `get_next_event` and its kind tags.
//! - `consts`: special ids and markers defined by the worker's chat protocol.
//!
//! All parsers are panic-free: malformed input is reported as
//! `BotError::Decode`.

pub mod consts;
pub mod event;
pub mod rpc;
