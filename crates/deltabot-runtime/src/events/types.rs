use serde::Deserialize;
use serde_json::{Map, Value};

use deltabot_core::error::Result;
use deltabot_core::protocol::event::EventEnvelope;
use deltabot_core::NormalizedValue;

use crate::dispatch::FilterKind;

/// Message as returned by `get_message` (after key normalization).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageSnapshot {
    pub id: u32,
    pub chat_id: u32,
    pub from_id: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub is_info: bool,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub system_message_type: Option<String>,
    /// Every other field the worker sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessageSnapshot {
    pub fn from_value(value: &NormalizedValue) -> Result<Self> {
        value.deserialize()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMessageEvent {
    pub account_id: u32,
    pub msg: MessageSnapshot,
    /// Empty unless the text starts with a command.
    pub command: String,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberListChangedEvent {
    pub account_id: u32,
    pub msg: MessageSnapshot,
    pub member: String,
    pub member_added: bool,
    /// Address of whoever made the change, `me` for the account itself.
    pub actor: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupImageChangedEvent {
    pub account_id: u32,
    pub msg: MessageSnapshot,
    pub image_deleted: bool,
    pub actor: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupNameChangedEvent {
    pub account_id: u32,
    pub msg: MessageSnapshot,
    pub old_name: String,
    pub actor: String,
}

/// Anything a hook can receive.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Raw(EventEnvelope),
    NewMessage(NewMessageEvent),
    MemberListChanged(MemberListChangedEvent),
    GroupImageChanged(GroupImageChangedEvent),
    GroupNameChanged(GroupNameChangedEvent),
}

impl Event {
    pub fn account_id(&self) -> u32 {
        match self {
            Event::Raw(e) => e.account_id,
            Event::NewMessage(e) => e.account_id,
            Event::MemberListChanged(e) => e.account_id,
            Event::GroupImageChanged(e) => e.account_id,
            Event::GroupNameChanged(e) => e.account_id,
        }
    }

    /// Filter variant whose hooks receive this event.
    pub fn filter_kind(&self) -> FilterKind {
        match self {
            Event::Raw(_) => FilterKind::RawEvent,
            Event::NewMessage(_) => FilterKind::NewMessage,
            Event::MemberListChanged(_) => FilterKind::MemberListChanged,
            Event::GroupImageChanged(_) => FilterKind::GroupImageChanged,
            Event::GroupNameChanged(_) => FilterKind::GroupNameChanged,
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &str {
        match self {
            Event::Raw(e) => e.kind.as_str(),
            Event::NewMessage(_) => "NewMessage",
            Event::MemberListChanged(_) => "MemberListChanged",
            Event::GroupImageChanged(_) => "GroupImageChanged",
            Event::GroupNameChanged(_) => "GroupNameChanged",
        }
    }

    /// The message behind a synthetic event.
    pub fn message(&self) -> Option<&MessageSnapshot> {
        match self {
            Event::Raw(_) => None,
            Event::NewMessage(e) => Some(&e.msg),
            Event::MemberListChanged(e) => Some(&e.msg),
            Event::GroupImageChanged(e) => Some(&e.msg),
            Event::GroupNameChanged(e) => Some(&e.msg),
        }
    }
}
