//! Worker process launch.

use std::process::Stdio;

use tokio::process::{Child, Command};

use deltabot_core::error::{BotError, Result};

use crate::config::schema::{WorkerConfig, ACCOUNTS_PATH_ENV};

/// Spawn the worker with piped stdin/stdout.
///
/// On unix the worker gets its own process group so a terminal Ctrl-C
/// reaches only the bot, which then shuts the worker down through `close()`.
pub fn spawn_worker(cfg: &WorkerConfig, show_stderr: bool) -> Result<Child> {
    let mut cmd = Command::new(&cfg.program);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(if show_stderr {
            Stdio::inherit()
        } else {
            Stdio::null()
        })
        .envs(&cfg.env)
        .kill_on_drop(true);

    if let Some(dir) = &cfg.accounts_dir {
        cmd.env(ACCOUNTS_PATH_ENV, dir);
    }

    #[cfg(unix)]
    cmd.process_group(0);

    let child = cmd
        .spawn()
        .map_err(|e| BotError::Io(format!("spawn {} failed: {e}", cfg.program)))?;
    tracing::debug!(program = %cfg.program, pid = ?child.id(), "worker started");
    Ok(child)
}
