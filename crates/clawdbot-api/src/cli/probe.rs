//! `clawdbot probe`: one-shot health check of every provider.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use crate::state::AppState;

/// Probe all providers once. Returns `true` when at least one is reachable.
pub async fn probe(state: &AppState, json: bool) -> Result<bool> {
    let records = state.prober.probe_all().await;
    let any_reachable = records.iter().any(|r| r.reachable);

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(any_reachable);
    }

    println!();
    println!("  {}", style("Provider Health").bold());
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Order").fg(Color::White),
        Cell::new("Provider").fg(Color::White),
        Cell::new("Kind").fg(Color::White),
        Cell::new("Model").fg(Color::White),
        Cell::new("Endpoint").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Latency").fg(Color::White),
        Cell::new("Error").fg(Color::White),
    ]);

    for (index, (provider, record)) in state
        .registry
        .list_providers()
        .iter()
        .zip(records.iter())
        .enumerate()
    {
        let config = provider.config();
        let status = if record.reachable {
            Cell::new("reachable").fg(Color::Green)
        } else {
            Cell::new("DOWN").fg(Color::Red)
        };
        let error = record.last_error.as_deref().unwrap_or("-");
        let error = if error.chars().count() > 40 {
            format!("{}...", error.chars().take(37).collect::<String>())
        } else {
            error.to_string()
        };

        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&config.id),
            Cell::new(config.kind),
            Cell::new(&config.model),
            Cell::new(config.endpoint_host()),
            status,
            Cell::new(record.latency_display()),
            Cell::new(error),
        ]);
    }

    println!("{table}");
    println!();
    Ok(any_reachable)
}
