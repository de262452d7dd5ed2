//! deltabot: serve every configured account of a worker.
//!
//! - `deltabot [config.yaml]`, default `deltabot.yaml`
//! - Logs worker info/warning/error events through tracing
//! - Retries the event loop after `serve.retry_delay_ms` when it fails
//! - Ctrl-C closes the transport and stops the worker

use std::process::ExitCode;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use deltabot_core::error::{BotError, Result};
use deltabot_core::protocol::event::EventKind;
use deltabot_runtime::config::{self, BotConfig, ServeSection};
use deltabot_runtime::dispatch::{hook_fn, RawEventFilter};
use deltabot_runtime::events::Event;
use deltabot_runtime::{Client, Rpc};

const DEFAULT_CONFIG: &str = "deltabot.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let cfg = match config::load_from_file(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("deltabot: {e}");
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.log_level.as_directive()));
    fmt().with_env_filter(filter).init();

    match run(cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, kind = e.kind().as_str(), "deltabot stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: BotConfig) -> Result<()> {
    let show_stderr = cfg.worker.inherit_stderr || cfg.log_level.shows_worker_stderr();
    let rpc = Rpc::spawn(&cfg.worker, show_stderr)?;
    tracing::info!(program = %cfg.worker.program, "worker started");

    let client = Client::new_bot(rpc.clone());
    client.add_hook(
        hook_fn(log_worker_event),
        RawEventFilter::new().kinds([EventKind::Info, EventKind::Warning, EventKind::Error]),
    );

    let outcome = tokio::select! {
        res = serve(&client, &cfg.serve) => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, shutting down");
            Ok(())
        }
    };

    let closed = rpc.close().await;
    outcome.and(closed)
}

async fn log_worker_event(_client: Client, event: Event) -> Result<()> {
    if let Event::Raw(ev) = &event {
        let msg = ev.fields.str_field("msg").unwrap_or_default();
        match ev.kind {
            EventKind::Info => tracing::debug!(account_id = ev.account_id, "{msg}"),
            EventKind::Warning => tracing::warn!(account_id = ev.account_id, "{msg}"),
            EventKind::Error => tracing::error!(account_id = ev.account_id, "{msg}"),
            _ => {}
        }
    }
    Ok(())
}

async fn serve(client: &Client, serve: &ServeSection) -> Result<()> {
    let rpc = client.rpc();
    let info = rpc.get_system_info().await?;
    tracing::debug!(
        core = info.str_field("deltachat_core_version").unwrap_or("unknown"),
        "running deltachat core"
    );

    let known = client.account_ids().await?;
    let accounts = match serve.account {
        Some(account_id) if !known.contains(&account_id) => {
            return Err(BotError::Config(format!("unknown account: {account_id}")));
        }
        Some(account_id) => vec![account_id],
        None => known,
    };

    let mut addrs = Vec::new();
    for account_id in accounts {
        if rpc.is_configured(account_id).await?.deserialize::<bool>()? {
            if let Some(addr) = client.get_address(account_id).await? {
                addrs.push(addr);
            }
        } else {
            tracing::error!(account_id, "account not configured");
        }
    }
    if addrs.is_empty() {
        return Err(BotError::Config(
            "there are no configured accounts to serve".into(),
        ));
    }
    tracing::info!(addrs = %addrs.join(", "), "listening");

    let delay = Duration::from_millis(serve.retry_delay_ms);
    loop {
        match client.run_forever(serve.account).await {
            Ok(()) => return Ok(()),
            Err(BotError::TransportClosed) => return Err(BotError::TransportClosed),
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind().as_str(), "event loop failed, retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}
