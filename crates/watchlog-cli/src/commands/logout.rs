use super::credential_store;
use crate::output::Output;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;

pub fn run_logout(output: &Output) -> Result<()> {
    let store = credential_store();
    let removed = store
        .clear()
        .wrap_err_with(|| format!("Failed to remove credentials at {}", store.path().display()))?;

    if removed {
        output.success(format!("Removed stored credentials: {}", store.path().display()));
    } else {
        output.info("No stored credentials to remove");
    }
    Ok(())
}
