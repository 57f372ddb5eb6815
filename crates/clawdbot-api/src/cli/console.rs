//! `clawdbot console`: a stdin/stdout channel through the relay.
//!
//! Each input line is one inbound message from the given principal. Replies
//! are printed as they arrive, so a slow provider does not block the prompt.

use std::sync::Arc;

use anyhow::Result;
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};

use clawdbot_core::channel::{memory_channel, run_relay};
use clawdbot_types::message::{InboundMessage, Principal};

use crate::state::AppState;

const CONSOLE_BUFFER: usize = 16;

pub async fn console(state: AppState, principal: Principal, quiet: bool) -> Result<i32> {
    let prober = Arc::clone(&state.prober)
        .spawn_periodic(state.health_interval, state.lifecycle.token());

    let (handle, source, sink) = memory_channel(CONSOLE_BUFFER);
    let (inbound, mut replies) = handle.split();

    let relay = tokio::spawn(run_relay(
        source,
        Arc::new(sink),
        Arc::clone(&state.relay),
        Arc::clone(&state.lifecycle),
    ));
    let printer = tokio::spawn(async move {
        while let Some(reply) = replies.recv().await {
            println!("{}\n", reply.text);
        }
    });

    if !quiet {
        println!(
            "  {} Console as {} (Ctrl+D to quit, /help for commands)\n",
            style("💬").bold(),
            style(&principal).cyan()
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = state.lifecycle.cancelled() => break,
            line = lines.next_line() => match line? {
                Some(line) => {
                    if inbound.send(InboundMessage::new(principal.clone(), line)).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    // At end of input the relay handles every queued line before it sees the
    // closed channel. After /shutdown, /restart or a signal, lines still
    // queued get the shutting-down reply. The drain waits for both.
    drop(inbound);
    if let Err(e) = relay.await {
        tracing::warn!(error = %e, "Relay task failed");
    }
    let code = state.finish().await;

    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "Reply printer failed");
    }
    if let Err(e) = prober.await {
        tracing::warn!(error = %e, "Health prober task failed");
    }
    Ok(code)
}
