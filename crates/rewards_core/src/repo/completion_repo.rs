//! Completion ledger contracts and SQLite implementation.
//!
//! # Responsibility
//! - Append completion events and query them by day window.
//! - Join completions with catalog metadata for history listings.
//!
//! # Invariants
//! - The ledger is append-only: no update or delete paths exist.
//! - `(task_id, user_id, completed_day)` is unique at the store level; a
//!   violating insert returns `RepoError::UniqueViolation`.
//! - History joins never drop a completion whose task is gone.

use crate::model::completion::{CompletionEvent, CompletionRecord, DayWindow};
use crate::model::task::TaskId;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::schema::{ensure_migrated, ensure_table};
use chrono::{DateTime, Utc};
use rusqlite::{ffi, params, Connection, ErrorCode, Row};

const COMPLETION_COLUMNS: &[&str] = &["id", "task_id", "user_id", "completed_at", "completed_day"];
const UNIQUE_TASK_USER_DAY: &str = "task_completions(task_id, user_id, completed_day)";

/// Append-only completion ledger.
pub trait CompletionRepository {
    /// Returns events for `(task_id, user_id)` whose timestamp lies in `window`.
    fn find_in_window(
        &self,
        task_id: TaskId,
        user_id: &str,
        window: &DayWindow,
    ) -> RepoResult<Vec<CompletionEvent>>;

    /// Inserts one event stamped with `completed_at` and its UTC day key.
    fn insert_completion(
        &self,
        task_id: TaskId,
        user_id: &str,
        completed_at: DateTime<Utc>,
    ) -> RepoResult<CompletionEvent>;

    /// Lists the user's completions joined with task name/points, newest first.
    fn list_completions(&self, user_id: &str) -> RepoResult<Vec<CompletionRecord>>;
}

/// SQLite-backed completion ledger.
pub struct SqliteCompletionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCompletionRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_migrated(conn)?;
        ensure_table(conn, "task_completions", COMPLETION_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl CompletionRepository for SqliteCompletionRepository<'_> {
    fn find_in_window(
        &self,
        task_id: TaskId,
        user_id: &str,
        window: &DayWindow,
    ) -> RepoResult<Vec<CompletionEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, user_id, completed_at
             FROM task_completions
             WHERE task_id = ?1
               AND user_id = ?2
               AND completed_at >= ?3
               AND completed_at < ?4
             ORDER BY completed_at ASC, id ASC;",
        )?;
        let mut rows = stmt.query(params![
            task_id,
            user_id,
            window.start.timestamp_millis(),
            window.end.timestamp_millis(),
        ])?;

        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }

    fn insert_completion(
        &self,
        task_id: TaskId,
        user_id: &str,
        completed_at: DateTime<Utc>,
    ) -> RepoResult<CompletionEvent> {
        let window = DayWindow::containing(completed_at);
        let inserted = self.conn.execute(
            "INSERT INTO task_completions (task_id, user_id, completed_at, completed_day)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                task_id,
                user_id,
                completed_at.timestamp_millis(),
                window.day_key(),
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation
                    && err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                return Err(RepoError::UniqueViolation(UNIQUE_TASK_USER_DAY));
            }
            Err(err) => return Err(err.into()),
        }

        Ok(CompletionEvent {
            id: self.conn.last_insert_rowid(),
            task_id,
            user_id: user_id.to_string(),
            completed_at: truncate_to_millis(completed_at)?,
        })
    }

    fn list_completions(&self, user_id: &str) -> RepoResult<Vec<CompletionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                c.id AS id,
                c.task_id AS task_id,
                c.user_id AS user_id,
                c.completed_at AS completed_at,
                t.name AS task_name,
                t.points AS task_points
             FROM task_completions c
             LEFT JOIN tasks t ON t.id = c.task_id
             WHERE c.user_id = ?1
             ORDER BY c.completed_at DESC, c.id DESC;",
        )?;
        let mut rows = stmt.query([user_id])?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let event = parse_event_row(row)?;
            let task_points = match row.get::<_, Option<i64>>("task_points")? {
                Some(raw) => Some(u32::try_from(raw).map_err(|_| {
                    RepoError::InvalidData(format!(
                        "invalid points value `{raw}` joined for completion {}",
                        event.id
                    ))
                })?),
                None => None,
            };
            records.push(CompletionRecord {
                task_name: row.get("task_name")?,
                task_points,
                event,
            });
        }
        Ok(records)
    }
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<CompletionEvent> {
    let id = row.get("id")?;
    let completed_at_ms: i64 = row.get("completed_at")?;
    Ok(CompletionEvent {
        id,
        task_id: row.get("task_id")?,
        user_id: row.get("user_id")?,
        completed_at: from_epoch_millis(completed_at_ms)?,
    })
}

fn from_epoch_millis(value: i64) -> RepoResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(value).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid completed_at value `{value}` in task_completions.completed_at"
        ))
    })
}

// The store keeps millisecond precision; returned events match what a
// read-back would produce.
fn truncate_to_millis(instant: DateTime<Utc>) -> RepoResult<DateTime<Utc>> {
    from_epoch_millis(instant.timestamp_millis())
}
