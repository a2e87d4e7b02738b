#![forbid(unsafe_code)]

use super::super::*;
use rusqlite::params;
use vt_core::Task;

impl SqliteStore {
    /// Persists a task. Quota checks are the caller's job and must run first.
    pub fn create_task(&mut self, request: NewTask) -> Result<Task, StoreError> {
        let NewTask {
            id,
            owner_id,
            fields,
            created_at_ms,
        } = request;

        self.conn
            .execute(
                r#"
                INSERT INTO tasks(id, owner_id, title, description, deadline, tags, status, created_at_ms)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    id.as_str(),
                    owner_id.as_str(),
                    fields.title,
                    fields.description,
                    fields.deadline,
                    encode_tags(&fields.tags),
                    fields.status,
                    created_at_ms,
                ],
            )
            .map_err(|err| {
                if is_constraint_violation(&err) {
                    StoreError::InvalidInput("task id collision or unknown owner")
                } else {
                    StoreError::Sql(err)
                }
            })?;

        Ok(Task {
            id,
            owner_id,
            title: fields.title,
            description: fields.description,
            deadline: fields.deadline,
            tags: fields.tags,
            status: fields.status,
            created_at_ms,
        })
    }
}
