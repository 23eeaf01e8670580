//! Task catalog model.
//!
//! # Responsibility
//! - Describe a rewardable activity and its point value.
//!
//! # Invariants
//! - `points` is never negative (enforced by the type and the store).
//! - `name` is never blank.
//! - `category` and `recurrence` are opaque labels for the core.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned catalog identifier.
pub type TaskId = i64;

/// One catalog entry, read-only from the core's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub points: u32,
    pub category: String,
    /// Recurrence label such as `daily` or `weekly`; not interpreted.
    pub recurrence: String,
    pub description: Option<String>,
}

/// Insert payload used when seeding the catalog store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewTask {
    pub name: String,
    pub points: u32,
    pub category: String,
    pub recurrence: String,
    pub description: Option<String>,
}

/// Validation failures for catalog records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    BlankName,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "task name must not be blank"),
        }
    }
}

impl Error for TaskValidationError {}

impl NewTask {
    pub fn new(name: impl Into<String>, points: u32) -> Self {
        Self {
            name: name.into(),
            points,
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_recurrence(mut self, recurrence: impl Into<String>) -> Self {
        self.recurrence = recurrence.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.trim().is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }

    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_name(&self.name)
    }

    /// Materializes the stored task once the store has assigned `id`.
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            name: self.name,
            points: self.points,
            category: self.category,
            recurrence: self.recurrence,
            description: self.description,
        }
    }
}

impl Task {
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_name(&self.name)
    }
}

fn validate_name(name: &str) -> Result<(), TaskValidationError> {
    if name.trim().is_empty() {
        return Err(TaskValidationError::BlankName);
    }
    Ok(())
}
