use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use deltabot_core::error::{BotError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    pub version: u32,

    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub serve: ServeSection,
}

impl BotConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(BotError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.worker.validate()?;
        self.serve.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Worker stderr is only interesting while debugging.
    pub fn shows_worker_stderr(self) -> bool {
        self <= LogLevel::Debug
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    /// Worker executable (looked up in `PATH` when not absolute).
    #[serde(default = "default_program")]
    pub program: String,

    /// Passed to the worker as `DC_ACCOUNTS_PATH`.
    #[serde(default)]
    pub accounts_dir: Option<PathBuf>,

    /// Extra environment for the worker process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Inherit the worker's stderr instead of discarding it.
    #[serde(default)]
    pub inherit_stderr: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            accounts_dir: None,
            env: BTreeMap::new(),
            inherit_stderr: false,
        }
    }
}

impl WorkerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.program.trim().is_empty() {
            return Err(BotError::Config("worker.program must not be empty".into()));
        }
        if self.env.contains_key(ACCOUNTS_PATH_ENV) && self.accounts_dir.is_some() {
            return Err(BotError::Config(format!(
                "set either worker.accounts_dir or worker.env.{ACCOUNTS_PATH_ENV}, not both"
            )));
        }
        Ok(())
    }
}

/// Environment variable the worker reads its accounts location from.
pub const ACCOUNTS_PATH_ENV: &str = "DC_ACCOUNTS_PATH";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServeSection {
    /// Serve only this account (single-account mode).
    #[serde(default)]
    pub account: Option<u32>,

    /// Delay before the outer loop restarts a failed event loop.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            account: None,
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl ServeSection {
    pub fn validate(&self) -> Result<()> {
        if !(1000..=600000).contains(&self.retry_delay_ms) {
            return Err(BotError::Config(
                "serve.retry_delay_ms must be between 1000 and 600000".into(),
            ));
        }
        if self.account == Some(0) {
            return Err(BotError::Config("serve.account must be a positive id".into()));
        }
        Ok(())
    }
}

fn default_program() -> String {
    "deltachat-rpc-server".into()
}
fn default_retry_delay_ms() -> u64 {
    5000
}
