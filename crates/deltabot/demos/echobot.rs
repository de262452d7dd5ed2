//! Echo bot: repeats every message that is not a known command.
//!
//! `cargo run -p deltabot --example echobot` with `deltachat-rpc-server` in
//! `PATH` and `DC_ACCOUNTS_PATH` pointing at configured accounts.

use tracing_subscriber::{fmt, EnvFilter};

use deltabot::prelude::*;

async fn echo(client: Client, event: Event) -> Result<()> {
    if let Event::NewMessage(ev) = event {
        client
            .rpc()
            .misc_send_text_message(ev.account_id, ev.msg.chat_id, &ev.msg.text)
            .await?;
    }
    Ok(())
}

async fn help(client: Client, event: Event) -> Result<()> {
    if let Event::NewMessage(ev) = event {
        client
            .rpc()
            .misc_send_text_message(
                ev.account_id,
                ev.msg.chat_id,
                "I will repeat anything you say to me",
            )
            .await?;
    }
    Ok(())
}

async fn log_event(_client: Client, event: Event) -> Result<()> {
    if let Event::Raw(ev) = event {
        let msg = ev.fields.str_field("msg").unwrap_or_default();
        match ev.kind {
            EventKind::Warning => tracing::warn!(account_id = ev.account_id, "{msg}"),
            EventKind::Error => tracing::error!(account_id = ev.account_id, "{msg}"),
            _ => tracing::debug!(account_id = ev.account_id, kind = %ev.kind, "{msg}"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let rpc = Rpc::spawn(&WorkerConfig::default(), false)?;
    let client = Client::new_bot(rpc.clone());

    let mut hooks = HookCollection::new();
    hooks
        .on(RawEventFilter::new(), hook_fn(log_event))
        .on(NewMessageFilter::new().command("/help").build()?, hook_fn(help))
        .on(
            NewMessageFilter::new()
                .is_info(Some(false))
                .func(ExtraPredicate::new(is_not_known_command))
                .build()?,
            hook_fn(echo),
        );
    client.add_hooks(hooks);

    let served = tokio::select! {
        res = client.run_forever(None) => res,
        _ = tokio::signal::ctrl_c() => Ok(()),
    };
    rpc.close().await?;
    served
}
