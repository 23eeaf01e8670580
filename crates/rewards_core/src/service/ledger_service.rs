//! Completion ledger use-case service.
//!
//! # Responsibility
//! - Record task completions under the one-per-task-per-day rule.
//! - Provide the reverse-chronological completion history.
//!
//! # Invariants
//! - A second completion of the same task by the same user within one UTC
//!   day yields `CompletionOutcome::Duplicate` and stores nothing.
//! - The pre-insert window check is advisory; the store's unique index is
//!   authoritative and its violation is reported as the same duplicate.

use crate::error::RetrievalError;
use crate::model::completion::{
    CompletionOutcome, CompletionRecord, DayWindow, DuplicateCompletion,
};
use crate::model::task::TaskId;
use crate::repo::completion_repo::CompletionRepository;
use crate::repo::error::RepoError;
use crate::service::section::Section;
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::time::Instant;

pub struct LedgerService<R: CompletionRepository> {
    repo: R,
}

impl<R: CompletionRepository> LedgerService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Records that `user_id` completed `task_id` at `now`.
    ///
    /// # Errors
    /// - `RetrievalError` when the user id is blank or the store fails.
    ///   Duplicates are not errors.
    pub fn record_completion(
        &self,
        task_id: TaskId,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome, RetrievalError> {
        const OPERATION: &str = "record_completion";
        let started_at = Instant::now();

        let user_id = normalize_user_id(user_id)
            .map_err(|err| RetrievalError::new(OPERATION, err))?;
        let window = DayWindow::containing(now);
        let duplicate = || DuplicateCompletion {
            task_id,
            user_id: user_id.to_string(),
            day: window.day,
        };

        let existing = self
            .repo
            .find_in_window(task_id, user_id, &window)
            .map_err(|err| RetrievalError::new(OPERATION, err))?;
        if !existing.is_empty() {
            info!(
                "event=completion_duplicate module=service status=ok task_id={task_id} day={} source=check",
                window.day
            );
            return Ok(CompletionOutcome::Duplicate(duplicate()));
        }

        match self.repo.insert_completion(task_id, user_id, now) {
            Ok(event) => {
                info!(
                    "event=completion_record module=service status=ok task_id={task_id} completion_id={} duration_ms={}",
                    event.id,
                    started_at.elapsed().as_millis()
                );
                Ok(CompletionOutcome::Recorded(event))
            }
            Err(RepoError::UniqueViolation(constraint)) => {
                warn!(
                    "event=completion_duplicate module=service status=warn task_id={task_id} day={} source=constraint constraint={constraint}",
                    window.day
                );
                Ok(CompletionOutcome::Duplicate(duplicate()))
            }
            Err(err) => {
                warn!(
                    "event=completion_record module=service status=error task_id={task_id} error={err}"
                );
                Err(RetrievalError::new(OPERATION, err))
            }
        }
    }

    /// Lists completions joined with task metadata, newest first.
    pub fn list_completions(
        &self,
        user_id: &str,
    ) -> Result<Vec<CompletionRecord>, RetrievalError> {
        const OPERATION: &str = "list_completions";
        let started_at = Instant::now();

        let user_id = normalize_user_id(user_id)
            .map_err(|err| RetrievalError::new(OPERATION, err))?;
        let records = self
            .repo
            .list_completions(user_id)
            .map_err(|err| RetrievalError::new(OPERATION, err))?;
        info!(
            "event=history_load module=service status=ok count={} duration_ms={}",
            records.len(),
            started_at.elapsed().as_millis()
        );
        Ok(records)
    }

    /// Loads history, treating failures as an empty list plus warning.
    pub fn load_history(&self, user_id: &str) -> Section<Vec<CompletionRecord>> {
        let section = Section::from_result(self.list_completions(user_id));
        if let Some(err) = &section.warning {
            warn!("event=history_load module=service status=error degraded=empty error={err}");
        }
        section
    }
}

fn normalize_user_id(user_id: &str) -> Result<&str, RepoError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(RepoError::InvalidInput(
            "user id must not be blank".to_string(),
        ));
    }
    Ok(trimmed)
}
