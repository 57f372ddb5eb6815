//! `clawdbot serve`: the production workflow.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use console::style;

use crate::http::router::build_router;
use crate::state::AppState;

/// Run the HTTP surface and periodic prober until an exit intent is
/// recorded, then drain and return the process exit code.
pub async fn serve(state: AppState, quiet: bool) -> Result<i32> {
    let prober = std::sync::Arc::clone(&state.prober)
        .spawn_periodic(state.health_interval, state.lifecycle.token());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    if !quiet {
        println!(
            "  {} ClawDBot listening on {}",
            style("🦀").bold(),
            style(format!("http://{addr}")).cyan()
        );
        println!(
            "  {} → {}",
            style("Providers").dim(),
            state.registry.ids().join(" → ")
        );
        println!("  {}", style("Press Ctrl+C to stop").dim());
    }
    tracing::info!(%addr, "HTTP surface started");

    let lifecycle = std::sync::Arc::clone(&state.lifecycle);
    let router = build_router(state.clone());
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { lifecycle.cancelled().await })
            .await
    });

    tokio::select! {
        _ = state.lifecycle.cancelled() => {}
        result = &mut server => {
            result.context("HTTP server task panicked")??;
            anyhow::bail!("HTTP server stopped unexpectedly");
        }
    }

    let code = state.finish().await;
    match server.await {
        Ok(Err(e)) => tracing::warn!(error = %e, "HTTP server shutdown error"),
        Err(e) => tracing::warn!(error = %e, "HTTP server task failed"),
        Ok(Ok(())) => {}
    }
    if let Err(e) = prober.await {
        tracing::warn!(error = %e, "Health prober task failed");
    }

    if !quiet {
        println!("\n  Server stopped.");
    }
    Ok(code)
}
