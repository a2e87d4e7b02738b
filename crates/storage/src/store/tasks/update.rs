#![forbid(unsafe_code)]

use super::super::*;
use super::{TASK_COLUMNS, task_from_row};
use rusqlite::params;
use vt_core::{PrincipalId, Task, TaskId, TaskPatch};

impl SqliteStore {
    /// Applies only the fields present in `patch`. `created_at_ms` and ownership never change.
    ///
    /// Fails with [`StoreError::UnknownId`] unless a task matches both `task_id` and `owner_id`.
    pub fn update_task(
        &mut self,
        task_id: &TaskId,
        owner_id: &PrincipalId,
        patch: TaskPatch,
    ) -> Result<Task, StoreError> {
        let tx = self.conn.transaction()?;

        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id=?1 AND owner_id=?2");
        let current = {
            let mut stmt = tx.prepare(&sql)?;
            let mut rows = stmt.query(params![task_id.as_str(), owner_id.as_str()])?;
            let found = match rows.next()? {
                Some(row) => Some(task_from_row(row)?),
                None => None,
            };
            found
        };
        let Some(mut task) = current else {
            return Err(StoreError::UnknownId);
        };

        if patch.is_empty() {
            return Ok(task);
        }
        patch.apply_to(&mut task);

        tx.execute(
            r#"
            UPDATE tasks
            SET title=?3, description=?4, deadline=?5, tags=?6, status=?7
            WHERE id=?1 AND owner_id=?2
            "#,
            params![
                task.id.as_str(),
                task.owner_id.as_str(),
                task.title,
                task.description,
                task.deadline,
                encode_tags(&task.tags),
                task.status,
            ],
        )?;
        tx.commit()?;

        Ok(task)
    }
}
