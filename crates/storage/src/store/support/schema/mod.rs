#![forbid(unsafe_code)]

mod sql;

use super::super::{StoreError, migrations::add_column_if_missing};
use rusqlite::{Connection, params};

/// Reconciles the live schema with the declared one. Safe to run any number of times.
pub(in crate::store) fn ensure_declared_shape(
    conn: &Connection,
    now_ms: i64,
) -> Result<(), StoreError> {
    conn.execute_batch(&sql::full_schema_sql())?;

    for (column, decl) in sql::USER_COLUMNS {
        add_column_if_missing(conn, "users", column, decl)?;
    }
    for (column, decl) in sql::TASK_COLUMNS {
        add_column_if_missing(conn, "tasks", column, decl)?;
    }

    conn.execute(
        "INSERT OR IGNORE INTO counters(name, value) SELECT ?1, COUNT(1) FROM users",
        params![super::REGISTERED_USERS_COUNTER],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["created_at_ms", now_ms.to_string()],
    )?;

    Ok(())
}
