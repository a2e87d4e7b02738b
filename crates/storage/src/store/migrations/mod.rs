#![forbid(unsafe_code)]

//! Versioned schema evolution.
//!
//! A [`MigrationRegistry`] is an explicit, validated list of migrations. [`apply_pending`]
//! brings a connection up to the registry's latest version, recording one row in
//! `schema_migrations` per applied version.

mod builtin;
mod runner;
mod util;

pub use runner::{MigrationReport, apply_pending, current_version, migration_history};
pub use util::{add_column_if_missing, column_exists, table_exists};

use super::StoreError;
use rusqlite::Connection;

/// A migration must tolerate being run against a schema that already has its changes
/// (`CREATE ... IF NOT EXISTS`, [`add_column_if_missing`]).
pub type MigrationAction = fn(&Connection) -> Result<(), StoreError>;

#[derive(Clone, Copy)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub action: MigrationAction,
}

impl Migration {
    pub const fn new(version: u32, description: &'static str, action: MigrationAction) -> Self {
        Self {
            version,
            description,
            action,
        }
    }
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("version", &self.version)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Migrations sorted by version; versions are exactly `1..=n`.
#[derive(Clone, Debug)]
pub struct MigrationRegistry {
    migrations: Vec<Migration>,
}

impl MigrationRegistry {
    pub fn new(mut migrations: Vec<Migration>) -> Result<Self, StoreError> {
        migrations.sort_by_key(|migration| migration.version);

        for window in migrations.windows(2) {
            if window[0].version == window[1].version {
                return Err(StoreError::InvalidRegistry(format!(
                    "duplicate migration version {}",
                    window[0].version
                )));
            }
        }

        for (index, migration) in migrations.iter().enumerate() {
            let expected = u32::try_from(index + 1)
                .map_err(|_| StoreError::InvalidRegistry("too many migrations".to_string()))?;
            if migration.version != expected {
                return Err(StoreError::InvalidRegistry(format!(
                    "missing migration version {expected} (next registered is {})",
                    migration.version
                )));
            }
        }

        Ok(Self { migrations })
    }

    /// The registry the service runs at startup.
    pub fn builtin() -> Result<Self, StoreError> {
        Self::new(builtin::migrations())
    }

    pub fn latest(&self) -> u32 {
        self.migrations
            .last()
            .map(|migration| migration.version)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.iter()
    }

    /// Migrations strictly newer than `current`, ascending.
    pub fn pending(&self, current: u32) -> impl Iterator<Item = &Migration> {
        self.migrations
            .iter()
            .filter(move |migration| migration.version > current)
    }
}
