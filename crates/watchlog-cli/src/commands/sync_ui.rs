use indicatif::{ProgressBar, ProgressStyle};
use media_sync_core::{SubmitOutcome, SyncError, SyncObserver};
use std::io::IsTerminal;

/// Progress bar over the history items of a run.
///
/// Without a terminal (or when hidden) progress is reported as structured
/// tracing events instead.
pub struct SyncUi {
    bar: ProgressBar,
    interactive: bool,
}

impl SyncUi {
    pub fn new(visible: bool) -> Self {
        let interactive = visible && is_interactive();

        let bar = if interactive {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
            ) {
                bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
            }
            bar.set_message("Fetching watch history...");
            bar
        } else {
            tracing::info!(
                operation = "ui_init",
                mode = "non_interactive",
                "Progress bar disabled, reporting progress through logs"
            );
            ProgressBar::hidden()
        };

        Self { bar, interactive }
    }

    pub fn finish(&self) {
        if self.interactive {
            self.bar.finish_and_clear();
        }
    }
}

fn outcome_label(outcome: &Result<SubmitOutcome, &SyncError>) -> &'static str {
    match outcome {
        Ok(SubmitOutcome::Created) => "created",
        Ok(SubmitOutcome::AlreadyExists) => "exists",
        Ok(SubmitOutcome::WouldCreate) => "would create",
        Err(_) => "failed",
    }
}

impl SyncObserver for SyncUi {
    fn history_fetched(&self, count: usize) {
        if self.interactive {
            self.bar.set_length(count as u64);
            self.bar.set_message("Submitting entries");
        } else {
            tracing::info!(operation = "progress", total = count, "History fetched");
        }
    }

    fn item_finished(&self, description: &str, outcome: Result<SubmitOutcome, &SyncError>) {
        let label = outcome_label(&outcome);
        if self.interactive {
            self.bar.inc(1);
            self.bar.set_message(format!("{}: {}", label, description));
        } else {
            tracing::info!(
                operation = "progress",
                outcome = label,
                description = description,
                "Item processed"
            );
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome_label(&Ok(SubmitOutcome::Created)), "created");
        assert_eq!(outcome_label(&Ok(SubmitOutcome::AlreadyExists)), "exists");
        assert_eq!(outcome_label(&Ok(SubmitOutcome::WouldCreate)), "would create");
    }
}
