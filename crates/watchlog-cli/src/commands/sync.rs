use super::auth::banner_prompt;
use super::sync_ui::SyncUi;
use super::{credential_store, load_config};
use crate::output::Output;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use media_sync_core::{prepare_settings, SyncOrchestrator};
use media_sync_sources::{TogglClient, TraktClient};
use std::path::Path;
use std::sync::Arc;

pub async fn run_sync(
    dry_run: bool,
    days: Option<u32>,
    config_path: Option<&Path>,
    output: &Output,
) -> Result<()> {
    tracing::debug!(operation = "sync", dry_run, days = ?days, "Sync command started");

    // Validated before any client exists, so bad configuration never reaches the network
    let config = load_config(config_path)?;
    let settings = prepare_settings(&config, days)?;
    tracing::debug!(operation = "sync", settings = ?settings, "Configuration validated");

    let source = TraktClient::new(&settings);
    let destination = TogglClient::new(&settings);
    let ui = Arc::new(SyncUi::new(output.is_human() && !output.is_quiet()));

    let orchestrator = SyncOrchestrator::new(settings, source, destination, credential_store())
        .with_dry_run(dry_run)
        .with_observer(ui.clone())
        .with_prompt(banner_prompt());

    let result = orchestrator.run().await;
    ui.finish();
    let result = result.wrap_err("Sync failed")?;

    if output.is_human() {
        if result.dry_run {
            output.success(format!(
                "Dry run: {} would be created, {} already exist, {} failed ({} watched since {})",
                result.would_create,
                result.skipped,
                result.failed,
                result.fetched,
                result.since.format("%Y-%m-%d %H:%M UTC")
            ));
        } else {
            output.success(format!(
                "Sync completed: {} created, {} already exist, {} failed ({} watched) in {:.1?}",
                result.created, result.skipped, result.failed, result.fetched, result.duration
            ));
        }
        for error in &result.errors {
            output.warn(error);
        }
    } else {
        let report = serde_json::to_value(&result).wrap_err("Failed to serialize sync result")?;
        output.json(&report);
    }

    Ok(())
}
