#![forbid(unsafe_code)]

use super::super::*;
use rusqlite::params;
use vt_core::{PrincipalId, TaskId};

impl SqliteStore {
    /// Hard delete, scoped by owner.
    pub fn delete_task(&mut self, task_id: &TaskId, owner_id: &PrincipalId) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "DELETE FROM tasks WHERE id=?1 AND owner_id=?2",
            params![task_id.as_str(), owner_id.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::UnknownId);
        }
        Ok(())
    }
}
