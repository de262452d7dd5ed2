//! Events seen by hooks.
//!
//! Raw worker events plus the synthetic events derived from unseen messages:
//! new messages (with parsed commands) and group changes classified from
//! system message text.

pub mod command;
pub mod system_msg;
pub mod types;

pub use command::{parse_command, ParsedCommand};
pub use system_msg::{classify, SystemMessage};
pub use types::{
    Event, GroupImageChangedEvent, GroupNameChangedEvent, MemberListChangedEvent,
    MessageSnapshot, NewMessageEvent,
};
