//! Read access to the precomputed points aggregate view.
//!
//! # Responsibility
//! - Locate the row belonging to a user and read its point total.
//! - Tolerate externally maintained views whose schema is not ours.
//!
//! # Invariants
//! - The typed contract (`user_id`, `total_points`) is always preferred.
//! - The substring heuristic is only used when the contract columns are
//!   absent, and every use is logged.
//! - The typed lookup matches user ids exactly, like the ledger's dedup and
//!   history queries. Only the heuristic for foreign views ignores case.
//! - A missing row is `AggregateLookup::Miss`, never an error.
//! - Non-numeric or negative totals read as 0.

use crate::repo::error::{RepoError, RepoResult};
use crate::repo::schema::{is_plain_identifier, quote_identifier, relation_columns, relation_exists};
use log::warn;
use rusqlite::types::Value;
use rusqlite::Connection;

/// View created by the core's own migrations.
pub const DEFAULT_POINTS_VIEW: &str = "v_total_points";

const TYPED_USER_COLUMN: &str = "user_id";
const TYPED_POINTS_COLUMN: &str = "total_points";

/// Outcome of a per-user aggregate lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateLookup {
    Found(u64),
    /// No row for the user; the total is 0.
    Miss,
}

impl AggregateLookup {
    pub fn total(self) -> u64 {
        match self {
            Self::Found(total) => total,
            Self::Miss => 0,
        }
    }
}

/// How the view's columns were resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAccess {
    Typed,
    Heuristic {
        user_column: String,
        points_column: String,
    },
}

/// Authoritative per-user point totals maintained outside the core.
pub trait PointsViewRepository {
    /// Returns whether the view exists in the store.
    fn is_available(&self) -> RepoResult<bool>;
    fn lookup_total(&self, user_id: &str) -> RepoResult<AggregateLookup>;
}

/// SQLite-backed points view reader.
pub struct SqlitePointsViewRepository<'conn> {
    conn: &'conn Connection,
    view_name: String,
}

impl<'conn> SqlitePointsViewRepository<'conn> {
    /// Binds a reader to `view_name`, which must be a plain SQL identifier.
    pub fn try_new(conn: &'conn Connection, view_name: impl Into<String>) -> RepoResult<Self> {
        let view_name = view_name.into();
        if !is_plain_identifier(&view_name) {
            return Err(RepoError::InvalidInput(format!(
                "points view name `{view_name}` is not a plain identifier"
            )));
        }
        Ok(Self { conn, view_name })
    }

    pub fn view_name(&self) -> &str {
        &self.view_name
    }

    /// Resolves which columns identify the user and hold the total.
    pub fn resolve_access(&self) -> RepoResult<ViewAccess> {
        let columns = relation_columns(self.conn, &self.view_name)?;
        resolve_columns(&columns).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "points view `{}` has no user or points column (columns: {})",
                self.view_name,
                columns.join(", ")
            ))
        })
    }

    fn lookup_typed(&self, user_id: &str) -> RepoResult<AggregateLookup> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TYPED_POINTS_COLUMN}
             FROM {}
             WHERE {TYPED_USER_COLUMN} = ?1
             LIMIT 1;",
            self.view_name
        ))?;
        let mut rows = stmt.query([user_id])?;
        if let Some(row) = rows.next()? {
            return Ok(AggregateLookup::Found(coerce_points(row.get(0)?)));
        }
        Ok(AggregateLookup::Miss)
    }

    fn lookup_heuristic(
        &self,
        user_id: &str,
        user_column: &str,
        points_column: &str,
    ) -> RepoResult<AggregateLookup> {
        warn!(
            "event=points_view_heuristic module=repo status=warn view={} user_column={} points_column={}",
            self.view_name, user_column, points_column
        );

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}, {} FROM {};",
            quote_identifier(user_column),
            quote_identifier(points_column),
            self.view_name
        ))?;
        let mut rows = stmt.query([])?;
        let wanted = user_id.to_lowercase();
        while let Some(row) = rows.next()? {
            let matches = value_as_text(row.get(0)?)
                .map(|candidate| candidate.to_lowercase() == wanted)
                .unwrap_or(false);
            if matches {
                return Ok(AggregateLookup::Found(coerce_points(row.get(1)?)));
            }
        }
        Ok(AggregateLookup::Miss)
    }
}

impl PointsViewRepository for SqlitePointsViewRepository<'_> {
    fn is_available(&self) -> RepoResult<bool> {
        relation_exists(self.conn, &self.view_name)
    }

    fn lookup_total(&self, user_id: &str) -> RepoResult<AggregateLookup> {
        match self.resolve_access()? {
            ViewAccess::Typed => self.lookup_typed(user_id),
            ViewAccess::Heuristic {
                user_column,
                points_column,
            } => self.lookup_heuristic(user_id, &user_column, &points_column),
        }
    }
}

/// Picks the typed contract when present, else the first column containing
/// `name`/`user` and the first containing `points` (case-insensitive).
pub fn resolve_columns(columns: &[String]) -> Option<ViewAccess> {
    let has = |wanted: &str| columns.iter().any(|c| c.eq_ignore_ascii_case(wanted));
    if has(TYPED_USER_COLUMN) && has(TYPED_POINTS_COLUMN) {
        return Some(ViewAccess::Typed);
    }

    let user_column = columns.iter().find(|c| {
        let lowered = c.to_lowercase();
        lowered.contains("name") || lowered.contains("user")
    })?;
    let points_column = columns
        .iter()
        .find(|c| c.to_lowercase().contains("points"))?;

    Some(ViewAccess::Heuristic {
        user_column: user_column.clone(),
        points_column: points_column.clone(),
    })
}

/// Reads a point total leniently: numbers and numeric text count, anything
/// else (including negatives) is 0.
pub fn coerce_points(value: Value) -> u64 {
    let number = match value {
        Value::Integer(n) => return u64::try_from(n).unwrap_or(0),
        Value::Real(f) => f,
        Value::Text(text) => match text.trim().parse::<f64>() {
            Ok(f) => f,
            Err(_) => return 0,
        },
        Value::Null | Value::Blob(_) => return 0,
    };

    if number.is_finite() && number > 0.0 {
        number.trunc() as u64
    } else {
        0
    }
}

fn value_as_text(value: Value) -> Option<String> {
    match value {
        Value::Text(text) => Some(text),
        Value::Integer(n) => Some(n.to_string()),
        _ => None,
    }
}
