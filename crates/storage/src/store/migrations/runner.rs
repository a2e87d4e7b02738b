#![forbid(unsafe_code)]

use super::super::{SchemaVersionRow, StoreError, now_ms};
use super::MigrationRegistry;
use super::util::table_exists;
use rusqlite::{Connection, TransactionBehavior, params};

const VERSION_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_migrations (
      version INTEGER PRIMARY KEY,
      applied_at_ms INTEGER NOT NULL
    );
"#;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    /// Versions this sweep executed and recorded.
    pub applied: Vec<u32>,
    /// Versions found already recorded by a concurrent writer.
    pub skipped: Vec<u32>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

pub fn current_version(conn: &Connection) -> Result<u32, StoreError> {
    if !table_exists(conn, "schema_migrations")? {
        return Ok(0);
    }
    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    u32::try_from(version).map_err(|_| StoreError::CorruptRow("schema_migrations.version"))
}

pub fn migration_history(conn: &Connection) -> Result<Vec<SchemaVersionRow>, StoreError> {
    if !table_exists(conn, "schema_migrations")? {
        return Ok(Vec::new());
    }
    let mut stmt =
        conn.prepare("SELECT version, applied_at_ms FROM schema_migrations ORDER BY version ASC")?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let version = u32::try_from(row.get::<_, i64>(0)?)
            .map_err(|_| StoreError::CorruptRow("schema_migrations.version"))?;
        out.push(SchemaVersionRow {
            version,
            applied_at_ms: row.get(1)?,
        });
    }
    Ok(out)
}

/// Applies every registry migration newer than the recorded version, in ascending order.
///
/// Each version runs in its own IMMEDIATE transaction together with its `schema_migrations`
/// row, so a version is either fully applied and recorded or not at all. A failure stops the
/// sweep; versions recorded before it stay applied.
pub fn apply_pending(
    conn: &mut Connection,
    registry: &MigrationRegistry,
) -> Result<MigrationReport, StoreError> {
    conn.execute_batch(VERSION_TABLE_SQL)?;

    let from_version = current_version(conn)?;
    if from_version > registry.latest() {
        return Err(StoreError::SchemaTooNew {
            supported: registry.latest(),
            found: from_version,
        });
    }

    let mut report = MigrationReport {
        from_version,
        to_version: from_version,
        ..MigrationReport::default()
    };
    let mut expected = from_version;

    for migration in registry.pending(from_version) {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Re-read under the write lock: another process may have migrated meanwhile.
        let found = current_version(&tx)?;
        if found >= migration.version {
            tracing::debug!(
                version = migration.version,
                found,
                "schema migration already recorded by another writer"
            );
            report.skipped.push(migration.version);
            expected = found;
            continue;
        }
        if found != expected {
            return Err(StoreError::MigrationConflict {
                version: migration.version,
                expected,
                found,
            });
        }

        if let Err(err) = (migration.action)(&tx) {
            tracing::error!(
                version = migration.version,
                description = migration.description,
                error = %err,
                "schema migration failed"
            );
            return Err(StoreError::MigrationFailed {
                version: migration.version,
                description: migration.description,
                source: Box::new(err),
            });
        }

        tx.execute(
            "INSERT INTO schema_migrations(version, applied_at_ms) VALUES (?1, ?2)",
            params![migration.version, now_ms()],
        )?;
        tx.commit()?;

        tracing::info!(
            version = migration.version,
            description = migration.description,
            "schema migration applied"
        );
        report.applied.push(migration.version);
        expected = migration.version;
    }

    report.to_version = current_version(conn)?;
    Ok(report)
}
