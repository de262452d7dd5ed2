//! Event loop.
//!
//! `run_until` is the only place the client blocks: it waits on
//! `get_next_event`, hands the raw event to the hooks, runs the catch-up
//! pass when a message arrived and finally asks the caller's predicate
//! whether to stop. Hooks for one event run one after another and finish
//! before the next event is fetched.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;

use deltabot_core::error::Result;
use deltabot_core::protocol::consts::{contact_id, COMMAND_PREFIX, WEBXDC_INFO_MESSAGE};
use deltabot_core::protocol::event::{EventEnvelope, EventKind};

use crate::dispatch::{EventFilter, Hook, HookRegistry};
use crate::events::command::split_first_word;
use crate::events::{
    classify, parse_command, Event, GroupImageChangedEvent, GroupNameChangedEvent,
    MemberListChangedEvent, MessageSnapshot, NewMessageEvent, SystemMessage,
};
use crate::transport::Rpc;

struct ClientInner {
    rpc: Rpc,
    hooks: HookRegistry,
    bot: bool,
}

/// Cloneable handle shared with hooks.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("bot", &self.inner.bot)
            .field("hooks", &self.inner.hooks)
            .finish()
    }
}

impl Client {
    pub fn new(rpc: Rpc) -> Self {
        Self::with_flag(rpc, false)
    }

    /// A client whose accounts are configured with the bot flag set.
    pub fn new_bot(rpc: Rpc) -> Self {
        Self::with_flag(rpc, true)
    }

    fn with_flag(rpc: Rpc, bot: bool) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                rpc,
                hooks: HookRegistry::new(),
                bot,
            }),
        }
    }

    pub fn rpc(&self) -> &Rpc {
        &self.inner.rpc
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.inner.hooks
    }

    pub fn is_bot(&self) -> bool {
        self.inner.bot
    }

    /// Register `hook` for events matching `filter`. Registering the same
    /// pair twice has no effect.
    pub fn add_hook(&self, hook: Hook, filter: impl Into<EventFilter>) {
        let filter = filter.into();
        let kind = filter.kind();
        if self.inner.hooks.add(hook, filter) {
            tracing::debug!(filter = kind.as_str(), "hook registered");
        }
    }

    pub fn add_hooks<I>(&self, hooks: I)
    where
        I: IntoIterator<Item = (Hook, EventFilter)>,
    {
        for (hook, filter) in hooks {
            self.add_hook(hook, filter);
        }
    }

    pub fn remove_hook(&self, hook: &Hook, filter: &EventFilter) -> bool {
        self.inner.hooks.remove(hook, filter)
    }

    /// Set credentials and extra options, then run the worker's configure.
    ///
    /// Progress is reported through `ConfigureProgress` events, so callers
    /// usually run `run_until` concurrently to observe it.
    pub async fn configure(
        &self,
        account_id: u32,
        addr: &str,
        password: &str,
        mut extra: BTreeMap<String, String>,
    ) -> Result<()> {
        let rpc = self.rpc();
        rpc.set_config(account_id, "addr", Some(addr)).await?;
        rpc.set_config(account_id, "mail_pw", Some(password)).await?;
        if self.inner.bot {
            extra.entry("bot".to_string()).or_insert_with(|| "1".to_string());
        }
        if !extra.is_empty() {
            rpc.batch_set_config(account_id, &extra).await?;
        }
        rpc.configure(account_id).await?;
        tracing::debug!(account_id, "account configured");
        Ok(())
    }

    /// Process events forever; only returns on error.
    pub async fn run_forever(&self, account: Option<u32>) -> Result<()> {
        self.run_until(account, |_| false).await.map(|_| ())
    }

    /// Process events until `predicate` accepts one, and return that event.
    ///
    /// With `Some(account)` only that account's io is started and only its
    /// messages are scanned; raw events of every account still reach the
    /// hooks.
    pub async fn run_until<P>(&self, account: Option<u32>, mut predicate: P) -> Result<EventEnvelope>
    where
        P: FnMut(&EventEnvelope) -> bool,
    {
        tracing::debug!(?account, "listening to incoming events");
        let rpc = self.rpc();
        let accounts = match account {
            Some(account_id) => {
                rpc.start_io(account_id).await?;
                vec![account_id]
            }
            None => {
                rpc.start_io_for_all_accounts().await?;
                self.account_ids().await?
            }
        };
        for account_id in accounts {
            if rpc.is_configured(account_id).await?.deserialize::<bool>()? {
                self.process_messages(account_id).await?;
            }
        }

        loop {
            let envelope = EventEnvelope::from_reply(rpc.get_next_event().await?)?;
            self.dispatch(&Event::Raw(envelope.clone())).await;
            let account_id = envelope.account_id;
            if envelope.kind == EventKind::IncomingMsg && account.map_or(true, |a| a == account_id) {
                self.process_messages(account_id).await?;
            }
            if predicate(&envelope) {
                return Ok(envelope);
            }
        }
    }

    /// Ids of every account the worker manages.
    pub async fn account_ids(&self) -> Result<Vec<u32>> {
        self.rpc().get_all_account_ids().await?.deserialize()
    }

    /// Catch-up pass over the account's unseen messages.
    async fn process_messages(&self, account_id: u32) -> Result<()> {
        if !self.inner.hooks.wants_messages() {
            return Ok(());
        }
        let rpc = self.rpc();
        loop {
            let ids: Vec<u32> = rpc.get_next_msgs(account_id).await?.deserialize()?;
            if ids.is_empty() {
                return Ok(());
            }
            for msg_id in ids {
                let msg = MessageSnapshot::from_value(&rpc.get_message(account_id, msg_id).await?)?;
                let is_system = msg.is_info
                    && msg.system_message_type.as_deref() != Some(WEBXDC_INFO_MESSAGE);
                if msg.from_id != contact_id::SELF && msg.from_id != contact_id::DEVICE {
                    self.on_new_msg(account_id, msg.clone()).await?;
                }
                if is_system {
                    self.on_info_msg(account_id, msg).await;
                }
                rpc.markseen_msgs(account_id, &[msg_id]).await?;
            }
        }
    }

    async fn on_new_msg(&self, account_id: u32, msg: MessageSnapshot) -> Result<()> {
        let mut event = NewMessageEvent {
            account_id,
            msg,
            command: String::new(),
            payload: String::new(),
        };
        if !event.msg.is_info && event.msg.text.starts_with(COMMAND_PREFIX) {
            let (first_word, _) = split_first_word(&event.msg.text);
            let self_addr = if first_word.contains('@') {
                self.self_address(account_id).await?
            } else {
                None
            };
            let commands = self.inner.hooks.commands();
            if let Some(parsed) = parse_command(&event.msg.text, self_addr.as_deref(), &commands) {
                event.command = parsed.command;
                event.payload = parsed.payload;
            }
        }
        self.dispatch(&Event::NewMessage(event)).await;
        Ok(())
    }

    async fn on_info_msg(&self, account_id: u32, msg: MessageSnapshot) {
        let event = match classify(&msg.text) {
            SystemMessage::GroupImageChanged { actor, deleted } => {
                Event::GroupImageChanged(GroupImageChangedEvent {
                    account_id,
                    msg,
                    image_deleted: deleted,
                    actor,
                })
            }
            SystemMessage::GroupNameChanged { actor, old_name } => {
                Event::GroupNameChanged(GroupNameChangedEvent {
                    account_id,
                    msg,
                    old_name,
                    actor,
                })
            }
            SystemMessage::MemberListChanged {
                member,
                added,
                actor,
            } => Event::MemberListChanged(MemberListChangedEvent {
                account_id,
                msg,
                member,
                member_added: added,
                actor,
            }),
            SystemMessage::Unclassified => {
                tracing::warn!(
                    account_id,
                    msg_id = msg.id,
                    text = %msg.text,
                    "ignoring unsupported system message"
                );
                return;
            }
        };
        self.dispatch(&event).await;
    }

    async fn self_address(&self, account_id: u32) -> Result<Option<String>> {
        let contact = self.rpc().get_contact(account_id, contact_id::SELF).await?;
        Ok(contact.str_field("address").map(str::to_owned))
    }

    /// Run every hook whose filter matches `event`, in registration order.
    ///
    /// A hook that fails or panics is logged and skipped; the remaining hooks
    /// still run.
    pub async fn dispatch(&self, event: &Event) {
        let kind = event.filter_kind();
        for entry in self.inner.hooks.snapshot(kind) {
            let matched =
                std::panic::catch_unwind(AssertUnwindSafe(|| entry.filter.matches(self, event)));
            match matched {
                Ok(true) => {}
                Ok(false) => continue,
                Err(_) => {
                    tracing::error!(
                        filter = kind.as_str(),
                        event = event.label(),
                        "filter predicate panicked"
                    );
                    continue;
                }
            }

            match AssertUnwindSafe(entry.hook.call(self, event)).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(
                    filter = kind.as_str(),
                    event = event.label(),
                    account_id = event.account_id(),
                    error = %e,
                    error_kind = e.kind().as_str(),
                    "hook failed"
                ),
                Err(_) => tracing::error!(
                    filter = kind.as_str(),
                    event = event.label(),
                    account_id = event.account_id(),
                    "hook panicked"
                ),
            }
        }
    }
}

/// Extra predicate for `NewMessage` filters: true unless the message's
/// command is claimed by a registered command hook.
///
/// ```ignore
/// let fallback = NewMessageFilter::new().func(ExtraPredicate::new(is_not_known_command));
/// ```
pub fn is_not_known_command(client: &Client, event: &Event) -> bool {
    let Event::NewMessage(ev) = event else {
        return true;
    };
    if !ev.command.starts_with(COMMAND_PREFIX) {
        return true;
    }
    !client.hooks().commands().contains(&ev.command)
}
