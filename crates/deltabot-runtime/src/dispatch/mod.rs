//! Hook registry and event filters.
//!
//! Re-exports the filter variants, the hook trait and the registry so bots
//! can depend on this module directly.

pub mod filter;
pub mod registry;

pub use filter::{
    CheckedNewMessage, EventFilter, ExtraPredicate, FilterKind, GroupImageChangedFilter,
    GroupNameChangedFilter, MemberListChangedFilter, NewMessageFilter, RawEventFilter,
};
pub use registry::{hook_fn, EventHook, Hook, HookCollection, HookEntry, HookRegistry};
