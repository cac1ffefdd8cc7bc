use crate::dedup::DuplicateDetector;
use crate::error::SyncError;
use media_sync_models::TimeEntryCandidate;
use media_sync_sources::TimeEntryDestination;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    AlreadyExists,
    /// Dry run: not a duplicate, but nothing was sent.
    WouldCreate,
}

/// Creates time entries that the destination does not already hold.
pub struct TimeEntrySink<'a, D: TimeEntryDestination + ?Sized> {
    destination: &'a D,
    dry_run: bool,
}

impl<'a, D: TimeEntryDestination + ?Sized> TimeEntrySink<'a, D> {
    pub fn new(destination: &'a D) -> Self {
        Self {
            destination,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Check for a duplicate and create the entry if there is none.
    ///
    /// Every failure is reported as [`SyncError::Submission`], including a
    /// failed duplicate check; in that case nothing is created.
    pub async fn submit(&self, candidate: &TimeEntryCandidate) -> Result<SubmitOutcome, SyncError> {
        let submission_error = |source| SyncError::Submission {
            description: candidate.description.clone(),
            source,
        };

        let exists = DuplicateDetector::new(self.destination)
            .exists(candidate)
            .await
            .map_err(submission_error)?;
        if exists {
            info!(
                operation = "submit",
                description = %candidate.description,
                "Entry already exists, skipping"
            );
            return Ok(SubmitOutcome::AlreadyExists);
        }

        if self.dry_run {
            info!(
                operation = "submit",
                description = %candidate.description,
                start = %candidate.start,
                "Dry run: would create entry"
            );
            return Ok(SubmitOutcome::WouldCreate);
        }

        self.destination
            .create_time_entry(candidate)
            .await
            .map_err(|e| {
                warn!(
                    operation = "submit",
                    description = %candidate.description,
                    error = %e,
                    "Failed to create time entry"
                );
                submission_error(e)
            })?;

        info!(
            operation = "submit",
            destination = self.destination.destination_name(),
            description = %candidate.description,
            "Time entry created"
        );
        Ok(SubmitOutcome::Created)
    }
}
