#![forbid(unsafe_code)]

mod accounts;
mod admin;
mod tasks;

pub use accounts::{AdminAccount, ExternalIdentity};

use crate::collaborators::Collaborators;
use crate::{ServiceError, resolver};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use vt_core::Principal;
use vt_storage::SqliteStore;

/// Boundary operations over one migrated store.
///
/// Construction takes an already-open [`SqliteStore`], so the migration sweep has finished
/// before any operation can run. The store sits behind a mutex: the quota count and the insert
/// it guards execute under one lock, as do the registration counter reads.
#[derive(Debug)]
pub struct TaskService {
    store: Mutex<SqliteStore>,
    collaborators: Collaborators,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub schema_version: u32,
}

impl TaskService {
    pub fn new(store: SqliteStore) -> Self {
        Self::with_collaborators(store, Collaborators::default())
    }

    pub fn with_collaborators(store: SqliteStore, collaborators: Collaborators) -> Self {
        Self {
            store: Mutex::new(store),
            collaborators,
        }
    }

    pub fn resolve(&self, credential: Option<&str>) -> Result<Principal, ServiceError> {
        resolver::resolve(&self.store(), credential)
    }

    pub fn health(&self) -> Result<HealthReport, ServiceError> {
        let schema_version = self.store().schema_version()?;
        Ok(HealthReport {
            status: "healthy",
            schema_version,
        })
    }

    // A panic mid-operation leaves no open transaction behind (rusqlite rolls back on drop), so
    // the connection is still usable after poisoning.
    fn store(&self) -> MutexGuard<'_, SqliteStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now_ms(&self) -> i64 {
        self.collaborators.clock.now_ms()
    }

    fn next_id(&self) -> String {
        self.collaborators.ids.next_id()
    }
}
