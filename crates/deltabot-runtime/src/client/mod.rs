//! The bot client: event loop, hook dispatch and account helpers.

mod accounts;
pub mod runner;

pub use runner::{is_not_known_command, Client};
