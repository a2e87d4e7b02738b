#![forbid(unsafe_code)]

use super::super::*;
use super::{TASK_COLUMNS, task_from_row};
use rusqlite::params;
use vt_core::{PrincipalId, Task, TaskId};

impl SqliteStore {
    /// Tasks of one owner in insertion order.
    pub fn list_tasks_by_owner(&self, owner_id: &PrincipalId) -> Result<Vec<Task>, StoreError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id=?1 ORDER BY rowid ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![owner_id.as_str()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(task_from_row(row)?);
        }
        Ok(out)
    }

    pub fn count_tasks_by_owner(&self, owner_id: &PrincipalId) -> Result<u64, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(1) FROM tasks WHERE owner_id=?1",
            params![owner_id.as_str()],
            |row| row.get(0),
        )?;
        to_u64(count, "tasks count")
    }

    /// Unscoped lookup, for callers that run the ownership check themselves.
    pub fn find_task(&self, task_id: &TaskId) -> Result<Option<Task>, StoreError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id=?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![task_id.as_str()])?;
        let task = match rows.next()? {
            Some(row) => Some(task_from_row(row)?),
            None => None,
        };
        Ok(task)
    }

    pub fn get_task(
        &self,
        task_id: &TaskId,
        owner_id: &PrincipalId,
    ) -> Result<Option<Task>, StoreError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id=?1 AND owner_id=?2");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![task_id.as_str(), owner_id.as_str()])?;
        let task = match rows.next()? {
            Some(row) => Some(task_from_row(row)?),
            None => None,
        };
        Ok(task)
    }
}
