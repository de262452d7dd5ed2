use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use deltabot_core::error::Result;

use crate::client::Client;
use crate::dispatch::filter::{EventFilter, FilterKind};
use crate::events::Event;

/// Callback invoked for events matching its filter.
#[async_trait]
pub trait EventHook: Send + Sync {
    async fn handle(&self, client: &Client, event: &Event) -> Result<()>;
}

/// Shared hook handle. Two handles are the same hook when they point at the
/// same callback object.
#[derive(Clone)]
pub struct Hook(Arc<dyn EventHook>);

impl Hook {
    pub fn new<H: EventHook + 'static>(hook: H) -> Self {
        Self(Arc::new(hook))
    }

    pub fn from_arc(hook: Arc<dyn EventHook>) -> Self {
        Self(hook)
    }

    pub async fn call(&self, client: &Client, event: &Event) -> Result<()> {
        self.0.handle(client, event).await
    }
}

impl PartialEq for Hook {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl Eq for Hook {}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hook({:p})", Arc::as_ptr(&self.0))
    }
}

struct FnHook<F>(F);

#[async_trait]
impl<F, Fut> EventHook for FnHook<F>
where
    F: Fn(Client, Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn handle(&self, client: &Client, event: &Event) -> Result<()> {
        (self.0)(client.clone(), event.clone()).await
    }
}

/// Wrap an async closure as a hook.
///
/// ```ignore
/// let echo = hook_fn(|client, event| async move {
///     if let Event::NewMessage(ev) = event {
///         client.rpc().misc_send_text_message(ev.account_id, ev.msg.chat_id, &ev.msg.text).await?;
///     }
///     Ok(())
/// });
/// ```
pub fn hook_fn<F, Fut>(f: F) -> Hook
where
    F: Fn(Client, Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Hook::new(FnHook(f))
}

#[derive(Debug, Clone, PartialEq)]
pub struct HookEntry {
    pub hook: Hook,
    pub filter: EventFilter,
}

/// Registered hooks, keyed by filter variant.
///
/// Entries behave as a set: adding an entry equal to an existing one is a
/// no-op. Dispatch works on a cloned snapshot so registration may happen
/// while hooks run.
#[derive(Default)]
pub struct HookRegistry {
    hooks: DashMap<FilterKind, Vec<HookEntry>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self {
            hooks: DashMap::new(),
        }
    }

    /// Returns false if the same (hook, filter) pair was already registered.
    pub fn add(&self, hook: Hook, filter: EventFilter) -> bool {
        let entry = HookEntry { hook, filter };
        let mut slot = self.hooks.entry(entry.filter.kind()).or_default();
        if slot.contains(&entry) {
            return false;
        }
        slot.push(entry);
        true
    }

    /// Returns false if no such pair was registered.
    pub fn remove(&self, hook: &Hook, filter: &EventFilter) -> bool {
        let Some(mut slot) = self.hooks.get_mut(&filter.kind()) else {
            return false;
        };
        let before = slot.len();
        slot.retain(|e| !(e.hook == *hook && e.filter == *filter));
        before != slot.len()
    }

    pub fn snapshot(&self, kind: FilterKind) -> Vec<HookEntry> {
        self.hooks
            .get(&kind)
            .map(|slot| slot.value().clone())
            .unwrap_or_default()
    }

    /// Commands declared by the registered `NewMessage` filters.
    pub fn commands(&self) -> HashSet<String> {
        self.hooks
            .get(&FilterKind::NewMessage)
            .map(|slot| {
                slot.iter()
                    .filter_map(|e| e.filter.command().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether any hook consumes message-derived events.
    pub fn wants_messages(&self) -> bool {
        self.hooks
            .iter()
            .any(|slot| slot.key().is_message_derived() && !slot.value().is_empty())
    }

    pub fn len(&self) -> usize {
        self.hooks.iter().map(|slot| slot.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry").field("len", &self.len()).finish()
    }
}

/// Hooks collected before a client exists; see `Client::add_hooks`.
#[derive(Debug, Clone, Default)]
pub struct HookCollection {
    entries: Vec<(Hook, EventFilter)>,
}

impl HookCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, filter: impl Into<EventFilter>, hook: Hook) -> &mut Self {
        let filter = filter.into();
        if !self.entries.iter().any(|(h, f)| *h == hook && *f == filter) {
            self.entries.push((hook, filter));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for HookCollection {
    type Item = (Hook, EventFilter);
    type IntoIter = std::vec::IntoIter<(Hook, EventFilter)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
