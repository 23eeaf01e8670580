//! Task catalog use-case service.
//!
//! # Responsibility
//! - Provide the read-only task list to callers.
//! - Degrade to "no tasks available" when the store cannot be reached.
//!
//! # Invariants
//! - No side effects on the store.

use crate::error::RetrievalError;
use crate::model::task::{Task, TaskId};
use crate::repo::catalog_repo::TaskCatalogRepository;
use crate::service::section::Section;
use log::{info, warn};
use std::time::Instant;

pub struct CatalogService<R: TaskCatalogRepository> {
    repo: R,
}

impl<R: TaskCatalogRepository> CatalogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists catalog tasks ordered by id.
    pub fn list_tasks(&self) -> Result<Vec<Task>, RetrievalError> {
        let started_at = Instant::now();
        let tasks = self
            .repo
            .list_tasks()
            .map_err(|err| RetrievalError::new("list_tasks", err))?;
        info!(
            "event=catalog_load module=service status=ok count={} duration_ms={}",
            tasks.len(),
            started_at.elapsed().as_millis()
        );
        Ok(tasks)
    }

    pub fn get_task(&self, id: TaskId) -> Result<Option<Task>, RetrievalError> {
        self.repo
            .get_task(id)
            .map_err(|err| RetrievalError::new("get_task", err))
    }

    /// Loads the catalog, treating failures as an empty catalog plus warning.
    pub fn load(&self) -> Section<Vec<Task>> {
        let section = Section::from_result(self.list_tasks());
        if let Some(err) = &section.warning {
            warn!("event=catalog_load module=service status=error degraded=empty error={err}");
        }
        section
    }
}
