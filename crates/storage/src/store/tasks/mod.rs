#![forbid(unsafe_code)]

mod create;
mod delete;
mod get;
mod update;

use super::{StoreError, decode_tags};
use rusqlite::Row;
use vt_core::model::status;
use vt_core::{PrincipalId, Task, TaskId};

const TASK_COLUMNS: &str =
    "id, owner_id, title, description, deadline, tags, status, created_at_ms";

fn task_from_row(row: &Row<'_>) -> Result<Task, StoreError> {
    let id = TaskId::try_new(row.get::<_, String>(0)?)
        .map_err(|_| StoreError::CorruptRow("tasks.id"))?;
    let owner_id = row
        .get::<_, Option<String>>(1)?
        .ok_or(StoreError::CorruptRow("tasks.owner_id"))
        .and_then(|raw| {
            PrincipalId::try_new(raw).map_err(|_| StoreError::CorruptRow("tasks.owner_id"))
        })?;
    let tags = decode_tags(row.get::<_, Option<String>>(5)?.as_deref())?;

    Ok(Task {
        id,
        owner_id,
        title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        description: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        deadline: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        tags,
        status: row
            .get::<_, Option<String>>(6)?
            .unwrap_or_else(|| status::TODO.to_string()),
        created_at_ms: row.get::<_, Option<i64>>(7)?.unwrap_or(0),
    })
}
