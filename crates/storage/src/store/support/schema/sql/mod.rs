#![forbid(unsafe_code)]

mod core;
mod indexes;
mod tasks;
mod users;

pub(super) use tasks::COLUMNS as TASK_COLUMNS;
pub(super) use users::COLUMNS as USER_COLUMNS;

pub(super) fn full_schema_sql() -> String {
    let mut sql = String::new();
    sql.push_str(core::SQL);
    sql.push_str(users::SQL);
    sql.push_str(tasks::SQL);
    sql.push_str(indexes::SQL);
    sql
}
