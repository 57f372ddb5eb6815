//! `clawdbot check-config`: validate and print the effective settings.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use clawdbot_infra::config::Settings;

/// Print the settings with the bot token and API keys redacted.
pub fn check_config(settings: &Settings, json: bool) -> Result<()> {
    let redacted = settings.redacted();

    if json {
        println!("{}", serde_json::to_string_pretty(&redacted)?);
        return Ok(());
    }

    println!();
    println!("  {} Configuration is valid", style("✓").green().bold());
    println!();
    println!("  {:<18} {}", style("Bot token").dim(), redacted.bot_token);
    println!(
        "  {:<18} {}",
        style("Allowed ids").dim(),
        redacted.allowed_principals.join(", ")
    );
    println!("  {:<18} {}", style("Port").dim(), redacted.port);
    println!(
        "  {:<18} {}s",
        style("Health interval").dim(),
        redacted.health_interval_secs
    );
    println!(
        "  {:<18} {}s",
        style("Probe timeout").dim(),
        redacted.probe_timeout_secs
    );
    println!(
        "  {:<18} {}",
        style("Restart exit code").dim(),
        redacted.restart_exit_code
    );
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Order").fg(Color::White),
        Cell::new("Provider").fg(Color::White),
        Cell::new("Kind").fg(Color::White),
        Cell::new("Endpoint").fg(Color::White),
        Cell::new("Model").fg(Color::White),
        Cell::new("Timeout").fg(Color::White),
        Cell::new("API key").fg(Color::White),
    ]);
    for (index, provider) in redacted.providers.iter().enumerate() {
        let key = if provider.api_key_set {
            Cell::new("set").fg(Color::Green)
        } else {
            Cell::new("-").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&provider.id),
            Cell::new(provider.kind),
            Cell::new(&provider.endpoint),
            Cell::new(&provider.model),
            Cell::new(format!("{}s", provider.timeout_secs)),
            key,
        ]);
    }
    println!("{table}");
    println!();
    Ok(())
}
