//! Top-level facade crate for deltabot.
//!
//! Re-exports the core contracts and the runtime so bots can depend on a
//! single crate. Most bots only need the prelude:
//!
//! ```ignore
//! use deltabot::prelude::*;
//!
//! let client = Client::new_bot(Rpc::spawn(&WorkerConfig::default(), false)?);
//! client.add_hook(
//!     hook_fn(|client, event| async move {
//!         if let Event::NewMessage(ev) = event {
//!             client.rpc().misc_send_text_message(ev.account_id, ev.msg.chat_id, &ev.msg.text).await?;
//!         }
//!         Ok(())
//!     }),
//!     NewMessageFilter::new().build()?,
//! );
//! client.run_forever(None).await?;
//! ```

pub mod core {
    pub use deltabot_core::*;
}

pub mod runtime {
    pub use deltabot_runtime::*;
}

/// Types used by nearly every bot.
pub mod prelude {
    pub use deltabot_core::protocol::event::{EventEnvelope, EventKind};
    pub use deltabot_core::{BotError, ErrorKind, NormalizedValue, Result};
    pub use deltabot_runtime::config::WorkerConfig;
    pub use deltabot_runtime::dispatch::{
        hook_fn, CheckedNewMessage, EventFilter, EventHook, ExtraPredicate,
        GroupImageChangedFilter, GroupNameChangedFilter, Hook, HookCollection,
        MemberListChangedFilter, NewMessageFilter, RawEventFilter,
    };
    pub use deltabot_runtime::events::{Event, MessageSnapshot};
    pub use deltabot_runtime::{is_not_known_command, Client, Rpc};
}
