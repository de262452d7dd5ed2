//! Named remote methods.
//!
//! `Rpc::call` reaches any method by name. The wrappers below are generated
//! from a method list so call sites read like local calls; adding a method
//! is one line in the list. Every wrapper returns the normalized result.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use deltabot_core::error::{BotError, Result};
use deltabot_core::NormalizedValue;

use crate::transport::Rpc;

fn to_param<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| BotError::Encode(format!("param json: {e}")))
}

macro_rules! remote_methods {
    ($( $(#[$meta:meta])* fn $name:ident($($arg:ident: $ty:ty),* $(,)?); )*) => {
        impl Rpc {
            $(
                $(#[$meta])*
                pub async fn $name(&self, $($arg: $ty),*) -> Result<NormalizedValue> {
                    let params: Vec<Value> = vec![$(to_param(&$arg)?),*];
                    self.call(stringify!($name), params).await
                }
            )*
        }
    };
}

remote_methods! {
    /// Worker and core version information.
    fn get_system_info();
    fn get_all_account_ids();
    fn add_account();
    fn remove_account(account_id: u32);
    fn is_configured(account_id: u32);
    fn get_config(account_id: u32, key: &str);
    fn set_config(account_id: u32, key: &str, value: Option<&str>);
    fn batch_set_config(account_id: u32, config: &BTreeMap<String, String>);
    /// Runs the (slow) configuration; progress arrives as `ConfigureProgress` events.
    fn configure(account_id: u32);
    fn start_io_for_all_accounts();
    fn stop_io_for_all_accounts();
    fn start_io(account_id: u32);
    fn stop_io(account_id: u32);
    /// Blocks on the worker side until an event is available.
    fn get_next_event();
    /// Ids of messages not yet handed to the bot.
    fn get_next_msgs(account_id: u32);
    fn get_message(account_id: u32, msg_id: u32);
    fn markseen_msgs(account_id: u32, msg_ids: &[u32]);
    fn get_contact(account_id: u32, contact_id: u32);
    fn misc_send_text_message(account_id: u32, chat_id: u32, text: &str);
    fn create_group_chat(account_id: u32, name: &str, protect: bool);
}
