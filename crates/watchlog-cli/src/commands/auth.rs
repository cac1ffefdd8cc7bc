use super::{credential_store, load_config};
use crate::output::Output;
use color_eyre::Result;
use media_sync_core::{prepare_settings, CredentialManager, DevicePrompt, SystemClock};
use media_sync_sources::{DeviceCode, TraktClient};
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

/// Prompt that prints the verification URL and user code in a banner on stderr,
/// so it stays visible when stdout is piped.
pub fn banner_prompt() -> DevicePrompt {
    Arc::new(|code: &DeviceCode| {
        let width = 60;
        eprintln!();
        eprintln!("{}", format!("╔{}╗", "═".repeat(width)).bright_white());
        eprintln!("{} {}", "║".bright_white(), "Trakt authorization required".bright_cyan().bold());
        eprintln!("{}", "║".bright_white());
        eprintln!("{}   1. Open  {}", "║".bright_white(), code.verification_url.underline());
        eprintln!("{}   2. Enter {}", "║".bright_white(), code.user_code.bold().bright_yellow());
        eprintln!("{}", "║".bright_white());
        eprintln!(
            "{} {}",
            "║".bright_white(),
            format!("Waiting for approval (code expires in {} min)...", code.expires_in / 60).bright_black()
        );
        eprintln!("{}", format!("╚{}╝", "═".repeat(width)).bright_white());
        eprintln!();
    })
}

/// Run the device flow unconditionally and replace the stored token.
pub async fn run_auth(config_path: Option<&Path>, output: &Output) -> Result<()> {
    let config = load_config(config_path)?;
    let settings = prepare_settings(&config, None)?;
    let store = credential_store();
    let source = TraktClient::new(&settings);

    let record = CredentialManager::new(&source, &store, &SystemClock, settings.expiration_buffer)
        .with_prompt(banner_prompt())
        .authenticate()
        .await?;

    if output.is_human() {
        output.success(format!(
            "Authenticated with Trakt. Token saved to {} (expires {})",
            store.path().display(),
            record.expires_at.format("%Y-%m-%d %H:%M UTC")
        ));
    } else {
        output.json(&json!({
            "success": true,
            "credentials_file": store.path().display().to_string(),
            "expires_at": record.expires_at.to_rfc3339(),
        }));
    }

    Ok(())
}
