//! Task catalog contracts and SQLite implementation.
//!
//! # Responsibility
//! - Enumerate catalog tasks and their point values.
//! - Provide a seeding entry point for store administration.
//!
//! # Invariants
//! - Catalog reads have no side effects.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::model::task::{NewTask, Task, TaskId};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::schema::{ensure_migrated, ensure_table};
use rusqlite::{params, Connection, Row};

const TASK_COLUMNS: &[&str] = &[
    "id",
    "name",
    "points",
    "category",
    "recurrence",
    "description",
];

const TASK_SELECT_SQL: &str = "SELECT
    id,
    name,
    points,
    category,
    recurrence,
    description
FROM tasks";

/// Read-only view of the task catalog.
pub trait TaskCatalogRepository {
    /// Lists all tasks ordered by id.
    fn list_tasks(&self) -> RepoResult<Vec<Task>>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
}

/// SQLite-backed task catalog.
pub struct SqliteTaskCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskCatalogRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_migrated(conn)?;
        ensure_table(conn, "tasks", TASK_COLUMNS)?;
        Ok(Self { conn })
    }

    /// Adds one task to the catalog and returns it with its assigned id.
    ///
    /// The catalog is owned by the store; the core never calls this. It exists
    /// for seeding and administration tooling.
    pub fn insert_task(&self, task: &NewTask) -> RepoResult<Task> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (name, points, category, recurrence, description)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                task.name.trim(),
                task.points,
                task.category.as_str(),
                task.recurrence.as_str(),
                task.description.as_deref(),
            ],
        )?;

        let mut stored = task.clone();
        stored.name = task.name.trim().to_string();
        Ok(stored.into_task(self.conn.last_insert_rowid()))
    }
}

impl TaskCatalogRepository for SqliteTaskCatalogRepository<'_> {
    fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id: TaskId = row.get("id")?;
    let raw_points: i64 = row.get("points")?;
    let points = u32::try_from(raw_points).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid points value `{raw_points}` in tasks.points for task {id}"
        ))
    })?;

    let task = Task {
        id,
        name: row.get("name")?,
        points,
        category: row.get("category")?,
        recurrence: row.get("recurrence")?,
        description: row.get("description")?,
    };
    task.validate()?;
    Ok(task)
}
