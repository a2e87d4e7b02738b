#![forbid(unsafe_code)]

mod error;
pub mod migrations;
mod requests;
mod support;
mod tasks;
mod users;

pub use error::StoreError;
pub use requests::*;
pub use support::{decode_tags, encode_tags};

use migrations::{MigrationRegistry, MigrationReport};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use std::path::Path;
use std::time::Duration;

const DB_FILE_NAME: &str = "voxtask.db";
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct OpenOptions {
    pub busy_timeout: Duration,
    pub registry: MigrationRegistry,
}

impl OpenOptions {
    pub fn new() -> Result<Self, StoreError> {
        Ok(Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            registry: MigrationRegistry::builtin()?,
        })
    }
}

/// SQLite-backed user and task storage.
///
/// The only way to obtain a store is [`SqliteStore::open`] / [`SqliteStore::open_with`], both
/// of which finish the migration sweep before returning.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    migration_report: MigrationReport,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with(storage_dir, OpenOptions::new()?)
    }

    pub fn open_with(
        storage_dir: impl AsRef<Path>,
        options: OpenOptions,
    ) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref();
        std::fs::create_dir_all(storage_dir)?;

        let db_path = storage_dir.join(DB_FILE_NAME);
        let mut conn = Connection::open(&db_path)?;
        conn.busy_timeout(options.busy_timeout)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
            "#,
        )?;

        let migration_report = migrations::apply_pending(&mut conn, &options.registry)?;
        support::ensure_declared_shape(&conn, now_ms())?;

        tracing::debug!(
            db_path = %db_path.display(),
            from_version = migration_report.from_version,
            to_version = migration_report.to_version,
            "store opened"
        );

        Ok(Self {
            conn,
            migration_report,
        })
    }

    /// What the opening sweep did.
    pub fn migration_report(&self) -> &MigrationReport {
        &self.migration_report
    }

    pub fn schema_version(&self) -> Result<u32, StoreError> {
        migrations::current_version(&self.conn)
    }

    pub fn migration_history(&self) -> Result<Vec<SchemaVersionRow>, StoreError> {
        migrations::migration_history(&self.conn)
    }

    pub fn created_at_ms(&self) -> Result<Option<i64>, StoreError> {
        let raw = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key=?1",
                params!["created_at_ms"],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        raw.map(|value| {
            value
                .parse::<i64>()
                .map_err(|_| StoreError::CorruptRow("meta.created_at_ms"))
        })
        .transpose()
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                || message.as_deref().is_some_and(|value| {
                    value.contains("UNIQUE constraint failed")
                        || value.contains("PRIMARY KEY constraint failed")
                        || value.contains("FOREIGN KEY constraint failed")
                })
        }
        _ => false,
    }
}

fn to_u64(value: i64, what: &'static str) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::CorruptRow(what))
}

fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration,
        Err(_) => return 0,
    };

    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
