//! Event filters.
//!
//! A filter is conjunctive: every declared constraint must hold and an unset
//! constraint always holds. The optional extra predicate runs last, only
//! after the structural constraints passed. Two filters are equal when they
//! are the same variant with the same constraints (patterns compare by
//! source, predicates by identity).

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use deltabot_core::error::{BotError, Result};
use deltabot_core::protocol::event::{EventEnvelope, EventKind};

use crate::client::Client;
use crate::events::{
    Event, GroupImageChangedEvent, GroupNameChangedEvent, MemberListChangedEvent,
    NewMessageEvent,
};

/// Filter variant; hooks are stored per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    RawEvent,
    NewMessage,
    MemberListChanged,
    GroupImageChanged,
    GroupNameChanged,
}

impl FilterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterKind::RawEvent => "raw_event",
            FilterKind::NewMessage => "new_message",
            FilterKind::MemberListChanged => "member_list_changed",
            FilterKind::GroupImageChanged => "group_image_changed",
            FilterKind::GroupNameChanged => "group_name_changed",
        }
    }

    /// Kinds fed by the unseen-message scan.
    pub fn is_message_derived(self) -> bool {
        !matches!(self, FilterKind::RawEvent)
    }
}

type PredicateFn = dyn Fn(&Client, &Event) -> bool + Send + Sync;

/// Caller-supplied extra condition. Compared by identity: clones of one
/// predicate are equal, two separately created closures are not.
#[derive(Clone)]
pub struct ExtraPredicate(Arc<PredicateFn>);

impl ExtraPredicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Client, &Event) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    fn check(&self, client: &Client, event: &Event) -> bool {
        (self.0)(client, event)
    }
}

impl PartialEq for ExtraPredicate {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl fmt::Debug for ExtraPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExtraPredicate({:p})", Arc::as_ptr(&self.0))
    }
}

fn flag_matches(want: Option<bool>, actual: bool) -> bool {
    want.map_or(true, |w| w == actual)
}

/// Raw worker events, optionally restricted to some kinds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEventFilter {
    kinds: Vec<EventKind>,
    func: Option<ExtraPredicate>,
}

impl RawEventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(mut self, kinds: impl IntoIterator<Item = EventKind>) -> Self {
        for kind in kinds {
            if !self.kinds.contains(&kind) {
                self.kinds.push(kind);
            }
        }
        self
    }

    pub fn func(mut self, func: ExtraPredicate) -> Self {
        self.func = Some(func);
        self
    }

    fn matches_fields(&self, ev: &EventEnvelope) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&ev.kind)
    }
}

/// New messages: text pattern, command, sender kind and info flag.
#[derive(Debug, Clone)]
pub struct NewMessageFilter {
    pattern: Option<Regex>,
    command: Option<String>,
    is_bot: Option<bool>,
    is_info: Option<bool>,
    func: Option<ExtraPredicate>,
}

impl Default for NewMessageFilter {
    fn default() -> Self {
        Self {
            pattern: None,
            command: None,
            is_bot: Some(false),
            is_info: None,
            func: None,
        }
    }
}

impl PartialEq for NewMessageFilter {
    fn eq(&self, other: &Self) -> bool {
        self.pattern.as_ref().map(Regex::as_str) == other.pattern.as_ref().map(Regex::as_str)
            && self.command == other.command
            && self.is_bot == other.is_bot
            && self.is_info == other.is_info
            && self.func == other.func
    }
}

impl NewMessageFilter {
    /// Matches messages from non-bots; see `is_bot` to change that.
    pub fn new() -> Self {
        Self::default()
    }

    /// Text must match `pattern` at its start.
    pub fn pattern(mut self, pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern)
            .map_err(|e| BotError::InvalidFilter(format!("bad pattern {pattern:?}: {e}")))?;
        self.pattern = Some(re);
        Ok(self)
    }

    /// Only messages whose parsed command equals `command` (e.g. `/help`).
    pub fn command(mut self, command: impl Into<String>) -> Self {
        let command = command.into();
        self.command = (!command.is_empty()).then_some(command);
        self
    }

    /// `Some(true)`: bots only, `Some(false)`: humans only, `None`: both.
    pub fn is_bot(mut self, is_bot: Option<bool>) -> Self {
        self.is_bot = is_bot;
        self
    }

    /// `Some(true)`: info messages only, `Some(false)`: normal only, `None`: both.
    pub fn is_info(mut self, is_info: Option<bool>) -> Self {
        self.is_info = is_info;
        self
    }

    pub fn func(mut self, func: ExtraPredicate) -> Self {
        self.func = Some(func);
        self
    }

    pub fn get_command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Validate and wrap. A command filter can never match info messages.
    pub fn build(self) -> Result<EventFilter> {
        if self.is_info == Some(true) && self.command.is_some() {
            return Err(BotError::InvalidFilter(
                "command and is_info can not be used together".into(),
            ));
        }
        Ok(EventFilter::NewMessage(CheckedNewMessage(self)))
    }

    fn matches_fields(&self, ev: &NewMessageEvent) -> bool {
        if !flag_matches(self.is_bot, ev.msg.is_bot) {
            return false;
        }
        if !flag_matches(self.is_info, ev.msg.is_info) {
            return false;
        }
        if let Some(cmd) = &self.command {
            if *cmd != ev.command {
                return false;
            }
        }
        if let Some(re) = &self.pattern {
            // anchored at the start of the text, not necessarily at its end
            if !re.find(&ev.msg.text).is_some_and(|m| m.start() == 0) {
                return false;
            }
        }
        true
    }
}

/// A `NewMessageFilter` that passed `build()`. It has no other constructor,
/// so an `EventFilter::NewMessage` never pairs `command` with `is_info`.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedNewMessage(NewMessageFilter);

impl CheckedNewMessage {
    pub fn constraints(&self) -> &NewMessageFilter {
        &self.0
    }
}

impl TryFrom<NewMessageFilter> for EventFilter {
    type Error = BotError;

    fn try_from(filter: NewMessageFilter) -> Result<Self> {
        filter.build()
    }
}

/// Group member additions/removals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberListChangedFilter {
    added: Option<bool>,
    func: Option<ExtraPredicate>,
}

impl MemberListChangedFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn added(mut self, added: Option<bool>) -> Self {
        self.added = added;
        self
    }

    pub fn func(mut self, func: ExtraPredicate) -> Self {
        self.func = Some(func);
        self
    }

    fn matches_fields(&self, ev: &MemberListChangedEvent) -> bool {
        flag_matches(self.added, ev.member_added)
    }
}

/// Group image set or deleted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupImageChangedFilter {
    deleted: Option<bool>,
    func: Option<ExtraPredicate>,
}

impl GroupImageChangedFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deleted(mut self, deleted: Option<bool>) -> Self {
        self.deleted = deleted;
        self
    }

    pub fn func(mut self, func: ExtraPredicate) -> Self {
        self.func = Some(func);
        self
    }

    fn matches_fields(&self, ev: &GroupImageChangedEvent) -> bool {
        flag_matches(self.deleted, ev.image_deleted)
    }
}

/// Group renamed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupNameChangedFilter {
    func: Option<ExtraPredicate>,
}

impl GroupNameChangedFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn func(mut self, func: ExtraPredicate) -> Self {
        self.func = Some(func);
        self
    }

    fn matches_fields(&self, _ev: &GroupNameChangedEvent) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventFilter {
    RawEvent(RawEventFilter),
    NewMessage(CheckedNewMessage),
    MemberListChanged(MemberListChangedFilter),
    GroupImageChanged(GroupImageChangedFilter),
    GroupNameChanged(GroupNameChangedFilter),
}

impl Default for EventFilter {
    /// Every raw event.
    fn default() -> Self {
        EventFilter::RawEvent(RawEventFilter::default())
    }
}

impl From<RawEventFilter> for EventFilter {
    fn from(f: RawEventFilter) -> Self {
        EventFilter::RawEvent(f)
    }
}

impl From<MemberListChangedFilter> for EventFilter {
    fn from(f: MemberListChangedFilter) -> Self {
        EventFilter::MemberListChanged(f)
    }
}

impl From<GroupImageChangedFilter> for EventFilter {
    fn from(f: GroupImageChangedFilter) -> Self {
        EventFilter::GroupImageChanged(f)
    }
}

impl From<GroupNameChangedFilter> for EventFilter {
    fn from(f: GroupNameChangedFilter) -> Self {
        EventFilter::GroupNameChanged(f)
    }
}

impl EventFilter {
    pub fn kind(&self) -> FilterKind {
        match self {
            EventFilter::RawEvent(_) => FilterKind::RawEvent,
            EventFilter::NewMessage(_) => FilterKind::NewMessage,
            EventFilter::MemberListChanged(_) => FilterKind::MemberListChanged,
            EventFilter::GroupImageChanged(_) => FilterKind::GroupImageChanged,
            EventFilter::GroupNameChanged(_) => FilterKind::GroupNameChanged,
        }
    }

    /// Command declared by a `NewMessage` filter.
    pub fn command(&self) -> Option<&str> {
        match self {
            EventFilter::NewMessage(f) => f.0.get_command(),
            _ => None,
        }
    }

    /// Structural constraints only (kinds, pattern, flags).
    pub fn matches_fields(&self, event: &Event) -> bool {
        match (self, event) {
            (EventFilter::RawEvent(f), Event::Raw(ev)) => f.matches_fields(ev),
            (EventFilter::NewMessage(f), Event::NewMessage(ev)) => f.0.matches_fields(ev),
            (EventFilter::MemberListChanged(f), Event::MemberListChanged(ev)) => {
                f.matches_fields(ev)
            }
            (EventFilter::GroupImageChanged(f), Event::GroupImageChanged(ev)) => {
                f.matches_fields(ev)
            }
            (EventFilter::GroupNameChanged(f), Event::GroupNameChanged(ev)) => {
                f.matches_fields(ev)
            }
            _ => false,
        }
    }

    fn func(&self) -> Option<&ExtraPredicate> {
        match self {
            EventFilter::RawEvent(f) => f.func.as_ref(),
            EventFilter::NewMessage(f) => f.0.func.as_ref(),
            EventFilter::MemberListChanged(f) => f.func.as_ref(),
            EventFilter::GroupImageChanged(f) => f.func.as_ref(),
            EventFilter::GroupNameChanged(f) => f.func.as_ref(),
        }
    }

    /// Full predicate: structural constraints, then the extra predicate.
    pub fn matches(&self, client: &Client, event: &Event) -> bool {
        self.matches_fields(event) && self.func().map_or(true, |f| f.check(client, event))
    }
}
