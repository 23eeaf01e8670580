//! Reward board pipeline.
//!
//! # Responsibility
//! - Load the catalog and the ledger independently.
//! - Recompute the total after every acknowledged ledger change, then the
//!   goal progress from that total.
//! - Keep failures of one section from hiding the others.
//!
//! # Invariants
//! - Recomputation is explicit (`ledger_changed`); there is no implicit
//!   dependency graph.
//! - `complete_task` recomputes only after the store acknowledged the write,
//!   and never after a duplicate.
//! - Only catalog tasks can be completed.
//! - The user id is trimmed once here; every lookup uses the same value.

use crate::error::RetrievalError;
use crate::model::completion::{CompletionOutcome, CompletionRecord};
use crate::model::goal::{evaluate_goals, Goal, GoalError, GoalProgress};
use crate::model::task::{Task, TaskId};
use crate::repo::catalog_repo::{SqliteTaskCatalogRepository, TaskCatalogRepository};
use crate::repo::completion_repo::{CompletionRepository, SqliteCompletionRepository};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::points_view_repo::{PointsViewRepository, SqlitePointsViewRepository};
use crate::service::catalog_service::CatalogService;
use crate::service::ledger_service::LedgerService;
use crate::service::points_aggregator::{
    PointsAggregator, TotalComputation, TotalSource, TotalUpdate,
};
use crate::service::section::Section;
use chrono::{DateTime, Utc};
use log::warn;
use rusqlite::Connection;
use serde::Serialize;

/// Per-session board settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub user_id: String,
    pub goals: Vec<Goal>,
    /// Aggregate view to reconcile against; `None` sums the ledger.
    pub points_view: Option<String>,
}

pub struct Board<C, L, V>
where
    C: TaskCatalogRepository,
    L: CompletionRepository,
    V: PointsViewRepository,
{
    catalog: CatalogService<C>,
    ledger: LedgerService<L>,
    aggregator: PointsAggregator<V>,
    user_id: String,
    goals: Vec<Goal>,
    tasks: Option<Section<Vec<Task>>>,
    history: Section<Vec<CompletionRecord>>,
    total_source: TotalSource,
    total_warning: Option<RetrievalError>,
}

pub type SqliteBoard<'conn> = Board<
    SqliteTaskCatalogRepository<'conn>,
    SqliteCompletionRepository<'conn>,
    SqlitePointsViewRepository<'conn>,
>;

impl<'conn> SqliteBoard<'conn> {
    /// Builds a board over one migrated SQLite connection.
    pub fn from_connection(conn: &'conn Connection, config: BoardConfig) -> RepoResult<Self> {
        let catalog = SqliteTaskCatalogRepository::try_new(conn)?;
        let ledger = SqliteCompletionRepository::try_new(conn)?;
        let view = match config.points_view.as_deref() {
            Some(name) => Some(SqlitePointsViewRepository::try_new(conn, name)?),
            None => None,
        };
        Ok(Board::new(catalog, ledger, view, config))
    }
}

impl<C, L, V> Board<C, L, V>
where
    C: TaskCatalogRepository,
    L: CompletionRepository,
    V: PointsViewRepository,
{
    pub fn new(catalog: C, ledger: L, view: Option<V>, config: BoardConfig) -> Self {
        Self {
            catalog: CatalogService::new(catalog),
            ledger: LedgerService::new(ledger),
            aggregator: PointsAggregator::new(view),
            user_id: config.user_id.trim().to_string(),
            goals: config.goals,
            tasks: None,
            history: Section::default(),
            total_source: TotalSource::Ledger,
            total_warning: None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// Loads every section and publishes the initial total.
    pub fn load(&mut self) -> TotalUpdate {
        self.reload_catalog();
        self.ledger_changed()
    }

    pub fn reload_catalog(&mut self) {
        self.tasks = Some(self.catalog.load());
    }

    /// Reloads history and republishes the total.
    ///
    /// Call after every acknowledged ledger mutation.
    pub fn ledger_changed(&mut self) -> TotalUpdate {
        self.history = self.ledger.load_history(&self.user_id);
        let computation = self
            .aggregator
            .compute_total(&self.user_id, &self.history.data);
        let update = self.aggregator.refresh(&computation);
        self.total_source = computation.source;
        self.total_warning = computation.warning;
        update
    }

    /// Marks `task_id` complete for the board's user at `now`.
    ///
    /// # Errors
    /// - `RepoError::TaskNotFound` (as `record_completion`) when the catalog
    ///   has no such task; nothing is stored.
    /// - `RetrievalError` when the store fails; the board state is unchanged.
    pub fn complete_task(
        &mut self,
        task_id: TaskId,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome, RetrievalError> {
        if self.catalog.get_task(task_id)?.is_none() {
            warn!("event=completion_record module=service status=error task_id={task_id} error=task_not_found");
            return Err(RetrievalError::new(
                "record_completion",
                RepoError::TaskNotFound(task_id),
            ));
        }
        let outcome = self.ledger.record_completion(task_id, &self.user_id, now)?;
        if outcome.is_recorded() {
            self.ledger_changed();
        }
        Ok(outcome)
    }

    /// Computes the user's total from a fresh ledger read, without publishing.
    pub fn compute_total(&self) -> TotalComputation {
        let (history, history_warning) = match self.ledger.list_completions(&self.user_id) {
            Ok(history) => (history, None),
            Err(err) => (Vec::new(), Some(err)),
        };
        let mut computation = self.aggregator.compute_total(&self.user_id, &history);
        if computation.source == TotalSource::Ledger && computation.warning.is_none() {
            computation.warning = history_warning;
        }
        computation
    }

    /// `None` until the catalog has been loaded once.
    pub fn tasks(&self) -> Option<&Section<Vec<Task>>> {
        self.tasks.as_ref()
    }

    pub fn history(&self) -> &Section<Vec<CompletionRecord>> {
        &self.history
    }

    /// Last published total.
    pub fn total(&self) -> u64 {
        self.aggregator.current_total()
    }

    pub fn total_source(&self) -> TotalSource {
        self.total_source
    }

    /// Progress for each configured goal, evaluated independently.
    pub fn goal_progress(&self) -> Vec<Result<GoalProgress, GoalError>> {
        let results = evaluate_goals(self.total(), &self.goals);
        for err in results.iter().filter_map(|result| result.as_ref().err()) {
            warn!("event=goal_invalid module=service status=error error={err}");
        }
        results
    }

    /// All store warnings currently degrading a section.
    pub fn warnings(&self) -> Vec<&RetrievalError> {
        self.tasks
            .as_ref()
            .and_then(|tasks| tasks.warning.as_ref())
            .into_iter()
            .chain(self.history.warning.as_ref())
            .chain(self.total_warning.as_ref())
            .collect()
    }

    /// Serializable view of the whole board.
    pub fn snapshot(&self) -> BoardSnapshot {
        let goals = self
            .goal_progress()
            .into_iter()
            .zip(&self.goals)
            .map(|(result, goal)| match result {
                Ok(progress) => GoalStatus {
                    label: goal.label.clone(),
                    progress: Some(progress),
                    error: None,
                },
                Err(err) => GoalStatus {
                    label: goal.label.clone(),
                    progress: None,
                    error: Some(err.to_string()),
                },
            })
            .collect();

        BoardSnapshot {
            user_id: self.user_id.clone(),
            total: self.total(),
            total_source: self.total_source,
            tasks: self
                .tasks
                .as_ref()
                .map(|tasks| tasks.data.clone())
                .unwrap_or_default(),
            history: self.history.data.clone(),
            goals,
            warnings: self.warnings().iter().map(|err| err.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalStatus {
    pub label: String,
    pub progress: Option<GoalProgress>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardSnapshot {
    pub user_id: String,
    pub total: u64,
    pub total_source: TotalSource,
    pub tasks: Vec<Task>,
    pub history: Vec<CompletionRecord>,
    pub goals: Vec<GoalStatus>,
    pub warnings: Vec<String>,
}
