//! Constants of the worker's chat protocol used by the event loop.

/// Leading character of a bot command (`/help`).
pub const COMMAND_PREFIX: &str = "/";

/// Separator between command words (`/set_name`).
pub const COMMAND_WORD_SEPARATOR: char = '_';

/// Reserved contact ids.
pub mod contact_id {
    /// The account itself.
    pub const SELF: u32 = 1;
    /// Sender of info/system messages.
    pub const INFO: u32 = 2;
    /// The synthetic device chat actor.
    pub const DEVICE: u32 = 5;
    /// Ids up to and including this one are reserved.
    pub const LAST_SPECIAL: u32 = 9;
}

/// `systemMessageType` of webxdc info messages; these are not group changes.
pub const WEBXDC_INFO_MESSAGE: &str = "WebxdcInfoMessage";
