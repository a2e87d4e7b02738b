#![forbid(unsafe_code)]

use super::super::StoreError;
use rusqlite::{OptionalExtension, Transaction, params};

pub(in crate::store) const REGISTERED_USERS_COUNTER: &str = "registered_users";

pub(in crate::store) fn read_counter_tx(tx: &Transaction<'_>, name: &str) -> Result<i64, StoreError> {
    Ok(tx
        .query_row(
            "SELECT value FROM counters WHERE name=?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0))
}

pub(in crate::store) fn next_counter_tx(tx: &Transaction<'_>, name: &str) -> Result<i64, StoreError> {
    let next = read_counter_tx(tx, name)? + 1;
    tx.execute(
        r#"
        INSERT INTO counters(name, value) VALUES (?1, ?2)
        ON CONFLICT(name) DO UPDATE SET value=excluded.value
        "#,
        params![name, next],
    )?;
    Ok(next)
}
