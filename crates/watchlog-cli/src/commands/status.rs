use super::{credential_store, load_config};
use crate::output::Output;
use chrono::{Duration, Utc};
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use media_sync_config::ConfigError;
use media_sync_core::CredentialState;
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::Path;

pub fn run_status(config_path: Option<&Path>, output: &Output) -> Result<()> {
    let config = load_config(config_path)?;
    let buffer = Duration::minutes(i64::from(config.sync.expiration_buffer_minutes));
    let store = credential_store();
    let state = CredentialState::assess(store.load(), Utc::now(), buffer);

    let config_problem = match config.validate() {
        Ok(_) => None,
        Err(ConfigError::Missing(keys)) => Some(format!("missing {}", keys.join(", "))),
        Err(e) => Some(e.to_string()),
    };

    if !output.is_human() {
        output.json(&json!({
            "credentials_file": store.path().display().to_string(),
            "state": state.label(),
            "expires_at": state.record().map(|r| r.expires_at.to_rfc3339()),
            "refresh_due_at": state.record().map(|r| r.refresh_due_at(buffer).to_rfc3339()),
            "config_complete": config_problem.is_none(),
            "config_problem": config_problem,
        }));
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    let state_cell = match &state {
        CredentialState::Valid(_) => Cell::new(state.label()).fg(Color::Green),
        CredentialState::Expiring(_) => Cell::new(state.label()).fg(Color::Yellow),
        CredentialState::Unauthenticated => Cell::new(state.label()).fg(Color::Red),
    };

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Trakt Credentials").fg(Color::Cyan).add_attribute(Attribute::Bold),
        Cell::new(""),
    ]);
    table.add_row(vec![Cell::new("File"), Cell::new(store.path().display().to_string())]);
    table.add_row(vec![Cell::new("State"), state_cell]);
    if let Some(record) = state.record() {
        table.add_row(vec![
            Cell::new("Expires"),
            Cell::new(record.expires_at.format("%Y-%m-%d %H:%M UTC").to_string()),
        ]);
        table.add_row(vec![
            Cell::new("Refresh due"),
            Cell::new(record.refresh_due_at(buffer).format("%Y-%m-%d %H:%M UTC").to_string()),
        ]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", table);

    match config_problem {
        None => println!("{} Configuration complete", "✓".green()),
        Some(problem) => println!("{} Configuration incomplete: {}", "✗".red(), problem),
    }
    if matches!(state, CredentialState::Unauthenticated) {
        println!("{}", "Run 'watchlog auth' to authorize with Trakt.".bright_black());
    }

    Ok(())
}
