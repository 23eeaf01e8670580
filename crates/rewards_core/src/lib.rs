//! Core domain logic for the reward-points tracker.
//! This crate is the single source of truth for completion and points rules.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{default_config_path, ConfigError, RewardsConfig, DATABASE_ENV_VAR};
pub use error::RetrievalError;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::completion::{
    CompletionEvent, CompletionId, CompletionOutcome, CompletionRecord, DayWindow,
    DuplicateCompletion,
};
pub use model::goal::{
    default_goals, evaluate_goal, evaluate_goals, progress, Goal, GoalError, GoalProgress,
};
pub use model::task::{NewTask, Task, TaskId, TaskValidationError};
pub use repo::catalog_repo::{SqliteTaskCatalogRepository, TaskCatalogRepository};
pub use repo::completion_repo::{CompletionRepository, SqliteCompletionRepository};
pub use repo::error::{RepoError, RepoResult};
pub use repo::points_view_repo::{
    AggregateLookup, PointsViewRepository, SqlitePointsViewRepository, ViewAccess,
    DEFAULT_POINTS_VIEW,
};
pub use service::board::{Board, BoardConfig, BoardSnapshot, GoalStatus, SqliteBoard};
pub use service::catalog_service::CatalogService;
pub use service::ledger_service::LedgerService;
pub use service::points_aggregator::{
    sum_points, PointsAggregator, TotalComputation, TotalSource, TotalUpdate,
};
pub use service::section::Section;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
