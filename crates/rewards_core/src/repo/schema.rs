//! Connection readiness checks shared by SQLite repositories.

use crate::db::migrations::{current_version, latest_version};
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::Connection;

pub(crate) fn ensure_migrated(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_version(conn)?;
    let expected_version = latest_version();
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

pub(crate) fn ensure_table(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    if !relation_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    let present = relation_columns(conn, table)?;
    for column in columns {
        if !present.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }
    Ok(())
}

/// Returns whether a table or view named `name` exists.
pub(crate) fn relation_exists(conn: &Connection, name: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type IN ('table', 'view') AND name = ?1
        );",
        [name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Lists column names of a table or view, in declaration order.
///
/// `name` must already be a plain identifier.
pub(crate) fn relation_columns(conn: &Connection, name: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({name});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}

/// Accepts `[A-Za-z_][A-Za-z0-9_]*`, safe to splice into SQL text.
pub(crate) fn is_plain_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn quote_identifier(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
