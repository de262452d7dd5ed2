//! Account lookup helpers used by bot front-ends.

use deltabot_core::error::{BotError, Result};
use deltabot_core::NormalizedValue;

use crate::client::Client;

/// Config key holding the id of the bot administration group.
const ADMIN_CHAT_KEY: &str = "ui.admin_chat";
const ADMIN_CHAT_NAME: &str = "Bot Admins";

fn opt_string(value: &NormalizedValue) -> Option<String> {
    value.as_value().as_str().map(str::to_owned)
}

impl Client {
    /// Resolve an account given either its numeric id or its address.
    ///
    /// A numeric argument is returned as is, without asking the worker.
    /// `None` when no account has that address.
    pub async fn get_account(&self, addr_or_id: &str) -> Result<Option<u32>> {
        if let Ok(id) = addr_or_id.parse::<u32>() {
            return Ok((id != 0).then_some(id));
        }
        for account_id in self.account_ids().await? {
            if self.get_address(account_id).await?.as_deref() == Some(addr_or_id) {
                return Ok(Some(account_id));
            }
        }
        Ok(None)
    }

    /// Existing account for `addr`, or a new one with `addr` set.
    pub async fn get_or_create_account(&self, addr: &str) -> Result<u32> {
        if let Some(account_id) = self.get_account(addr).await? {
            return Ok(account_id);
        }
        let account_id: u32 = self.rpc().add_account().await?.deserialize()?;
        self.rpc().set_config(account_id, "addr", Some(addr)).await?;
        tracing::debug!(account_id, addr, "account created");
        Ok(account_id)
    }

    /// The configured address, or the pending `addr` of an unconfigured account.
    pub async fn get_address(&self, account_id: u32) -> Result<Option<String>> {
        let rpc = self.rpc();
        let key = if rpc.is_configured(account_id).await?.deserialize::<bool>()? {
            "configured_addr"
        } else {
            "addr"
        };
        Ok(opt_string(&rpc.get_config(account_id, key).await?))
    }

    /// Id of the administration group, created on first use. `None` while
    /// the account is not configured.
    pub async fn get_admin_chat(&self, account_id: u32) -> Result<Option<u32>> {
        let rpc = self.rpc();
        if !rpc.is_configured(account_id).await?.deserialize::<bool>()? {
            return Ok(None);
        }
        let stored = opt_string(&rpc.get_config(account_id, ADMIN_CHAT_KEY).await?)
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|id| *id != 0);
        match stored {
            Some(chat_id) => Ok(Some(chat_id)),
            None => self.reset_admin_chat(account_id).await,
        }
    }

    /// Create a fresh administration group and remember it.
    pub async fn reset_admin_chat(&self, account_id: u32) -> Result<Option<u32>> {
        let rpc = self.rpc();
        if !rpc.is_configured(account_id).await?.deserialize::<bool>()? {
            return Ok(None);
        }
        let chat_id: u32 = rpc
            .create_group_chat(account_id, ADMIN_CHAT_NAME, true)
            .await?
            .deserialize()?;
        if chat_id == 0 {
            return Err(BotError::Internal("worker returned chat id 0".into()));
        }
        rpc.set_config(account_id, ADMIN_CHAT_KEY, Some(chat_id.to_string().as_str()))
            .await?;
        tracing::info!(account_id, chat_id, "admin chat created");
        Ok(Some(chat_id))
    }
}
