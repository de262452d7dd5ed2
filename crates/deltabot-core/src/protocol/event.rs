//! Worker event envelope.
//!
//! `get_next_event` blocks on the worker side and returns
//! `{"contextId": <account>, "event": {"kind": <tag>, ...kind fields}}`.

use std::fmt;

use serde_json::Value;

use crate::error::{BotError, Result};
use crate::value::NormalizedValue;

/// Event kind tag. Unknown tags are kept as `Other` so new worker versions
/// do not break the event loop.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Info,
    Warning,
    Error,
    ErrorSelfNotInGroup,
    SmtpConnected,
    ImapConnected,
    SmtpMessageSent,
    ImapInboxIdle,
    IncomingMsg,
    IncomingMsgBunch,
    MsgsChanged,
    MsgsNoticed,
    MsgDelivered,
    MsgFailed,
    MsgRead,
    ReactionsChanged,
    ChatModified,
    ContactsChanged,
    ConfigureProgress,
    ImexProgress,
    ConnectivityChanged,
    SecurejoinInviterProgress,
    SecurejoinJoinerProgress,
    WebxdcStatusUpdate,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Info => "Info",
            EventKind::Warning => "Warning",
            EventKind::Error => "Error",
            EventKind::ErrorSelfNotInGroup => "ErrorSelfNotInGroup",
            EventKind::SmtpConnected => "SmtpConnected",
            EventKind::ImapConnected => "ImapConnected",
            EventKind::SmtpMessageSent => "SmtpMessageSent",
            EventKind::ImapInboxIdle => "ImapInboxIdle",
            EventKind::IncomingMsg => "IncomingMsg",
            EventKind::IncomingMsgBunch => "IncomingMsgBunch",
            EventKind::MsgsChanged => "MsgsChanged",
            EventKind::MsgsNoticed => "MsgsNoticed",
            EventKind::MsgDelivered => "MsgDelivered",
            EventKind::MsgFailed => "MsgFailed",
            EventKind::MsgRead => "MsgRead",
            EventKind::ReactionsChanged => "ReactionsChanged",
            EventKind::ChatModified => "ChatModified",
            EventKind::ContactsChanged => "ContactsChanged",
            EventKind::ConfigureProgress => "ConfigureProgress",
            EventKind::ImexProgress => "ImexProgress",
            EventKind::ConnectivityChanged => "ConnectivityChanged",
            EventKind::SecurejoinInviterProgress => "SecurejoinInviterProgress",
            EventKind::SecurejoinJoinerProgress => "SecurejoinJoinerProgress",
            EventKind::WebxdcStatusUpdate => "WebxdcStatusUpdate",
            EventKind::Other(s) => s.as_str(),
        }
    }

    pub fn parse(tag: &str) -> Self {
        match tag {
            "Info" => EventKind::Info,
            "Warning" => EventKind::Warning,
            "Error" => EventKind::Error,
            "ErrorSelfNotInGroup" => EventKind::ErrorSelfNotInGroup,
            "SmtpConnected" => EventKind::SmtpConnected,
            "ImapConnected" => EventKind::ImapConnected,
            "SmtpMessageSent" => EventKind::SmtpMessageSent,
            "ImapInboxIdle" => EventKind::ImapInboxIdle,
            "IncomingMsg" => EventKind::IncomingMsg,
            "IncomingMsgBunch" => EventKind::IncomingMsgBunch,
            "MsgsChanged" => EventKind::MsgsChanged,
            "MsgsNoticed" => EventKind::MsgsNoticed,
            "MsgDelivered" => EventKind::MsgDelivered,
            "MsgFailed" => EventKind::MsgFailed,
            "MsgRead" => EventKind::MsgRead,
            "ReactionsChanged" => EventKind::ReactionsChanged,
            "ChatModified" => EventKind::ChatModified,
            "ContactsChanged" => EventKind::ContactsChanged,
            "ConfigureProgress" => EventKind::ConfigureProgress,
            "ImexProgress" => EventKind::ImexProgress,
            "ConnectivityChanged" => EventKind::ConnectivityChanged,
            "SecurejoinInviterProgress" => EventKind::SecurejoinInviterProgress,
            "SecurejoinJoinerProgress" => EventKind::SecurejoinJoinerProgress,
            "WebxdcStatusUpdate" => EventKind::WebxdcStatusUpdate,
            other => EventKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw event as delivered by the worker.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    /// Originating account (the worker's `contextId`).
    pub account_id: u32,
    pub kind: EventKind,
    /// The inner event object, kind tag included.
    pub fields: NormalizedValue,
}

impl EventEnvelope {
    /// Parse the (already normalized) result of `get_next_event`.
    pub fn from_reply(reply: NormalizedValue) -> Result<Self> {
        let account_id = reply
            .u64_field("context_id")
            .and_then(|id| u32::try_from(id).ok())
            .ok_or_else(|| BotError::Decode("event without context_id".into()))?;
        let fields = reply
            .get("event")
            .cloned()
            .filter(Value::is_object)
            .ok_or_else(|| BotError::Decode("event without event object".into()))?;
        let fields = NormalizedValue::new(fields);
        let kind = fields
            .str_field("kind")
            .map(EventKind::parse)
            .ok_or_else(|| BotError::Decode("event without kind".into()))?;
        Ok(Self {
            account_id,
            kind,
            fields,
        })
    }
}
