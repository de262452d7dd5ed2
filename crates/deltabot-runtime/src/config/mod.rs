//! Bot configuration: strict YAML, validated before use.
//!
//! Unknown keys are rejected at every level and `BotConfig::validate`
//! range-checks the values, so a loaded config can be used as is.

pub mod schema;

use std::path::Path;

use deltabot_core::error::{BotError, Result};

pub use schema::{BotConfig, LogLevel, ServeSection, WorkerConfig, ACCOUNTS_PATH_ENV};

/// Read and validate the YAML file at `path`. Errors name the file.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<BotConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| BotError::Config(format!("cannot read {}: {e}", path.display())))?;
    load_from_str(&text).map_err(|e| match e {
        BotError::Config(msg) => BotError::Config(format!("{}: {msg}", path.display())),
        other => other,
    })
}

/// Parse and validate YAML text.
pub fn load_from_str(text: &str) -> Result<BotConfig> {
    let cfg = serde_yaml::from_str::<BotConfig>(text)
        .map_err(|e| BotError::Config(format!("yaml: {e}")))?;
    cfg.validate().map(|()| cfg)
}
