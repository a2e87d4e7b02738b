#![forbid(unsafe_code)]

use super::super::StoreError;
use super::Migration;
use super::util::{add_column_if_missing, column_exists};
use rusqlite::Connection;

pub(super) fn migrations() -> Vec<Migration> {
    vec![
        Migration::new(1, "create tasks table", create_tasks),
        Migration::new(2, "create users table", create_users),
        Migration::new(3, "scope tasks by owner", scope_tasks_by_owner),
        Migration::new(4, "add user tier and moderation flags", add_user_flags),
        Migration::new(5, "add external identity picture", add_user_picture),
        Migration::new(6, "create meta and counters", create_meta_and_counters),
        Migration::new(7, "carry legacy task timestamps", carry_legacy_task_timestamps),
    ]
}

fn create_tasks(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
          id TEXT PRIMARY KEY,
          title TEXT NOT NULL DEFAULT '',
          description TEXT NOT NULL DEFAULT '',
          deadline TEXT NOT NULL DEFAULT '',
          tags TEXT,
          status TEXT NOT NULL DEFAULT 'todo',
          created_at_ms INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )?;
    Ok(())
}

fn create_users(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
          id TEXT PRIMARY KEY,
          email TEXT NOT NULL UNIQUE,
          name TEXT NOT NULL DEFAULT '',
          password_hash TEXT,
          created_at_ms INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )?;
    Ok(())
}

fn scope_tasks_by_owner(conn: &Connection) -> Result<(), StoreError> {
    add_column_if_missing(conn, "tasks", "owner_id", "TEXT REFERENCES users(id)")?;
    conn.execute_batch("CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner_id);")?;
    Ok(())
}

fn add_user_flags(conn: &Connection) -> Result<(), StoreError> {
    add_column_if_missing(conn, "users", "tier", "TEXT NOT NULL DEFAULT 'free'")?;
    add_column_if_missing(conn, "users", "is_blocked", "INTEGER NOT NULL DEFAULT 0")?;
    add_column_if_missing(conn, "users", "is_admin", "INTEGER NOT NULL DEFAULT 0")?;
    Ok(())
}

fn add_user_picture(conn: &Connection) -> Result<(), StoreError> {
    add_column_if_missing(conn, "users", "picture", "TEXT")?;
    Ok(())
}

/// Seeds `registered_users` from the rows already present so databases that predate the
/// counter keep the first-user bootstrap closed.
fn create_meta_and_counters(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS counters (
          name TEXT PRIMARY KEY,
          value INTEGER NOT NULL
        );

        INSERT OR IGNORE INTO counters(name, value)
          SELECT 'registered_users', COUNT(1) FROM users;
        "#,
    )?;
    Ok(())
}

/// Tables created before versioning keep `"createdAt"` as float seconds and lack the columns
/// v1 declares. Missing columns are added and seconds become milliseconds.
fn carry_legacy_task_timestamps(conn: &Connection) -> Result<(), StoreError> {
    add_column_if_missing(conn, "tasks", "title", "TEXT NOT NULL DEFAULT ''")?;
    add_column_if_missing(conn, "tasks", "description", "TEXT NOT NULL DEFAULT ''")?;
    add_column_if_missing(conn, "tasks", "deadline", "TEXT NOT NULL DEFAULT ''")?;
    add_column_if_missing(conn, "tasks", "tags", "TEXT")?;
    add_column_if_missing(conn, "tasks", "status", "TEXT NOT NULL DEFAULT 'todo'")?;
    add_column_if_missing(conn, "tasks", "created_at_ms", "INTEGER NOT NULL DEFAULT 0")?;

    if column_exists(conn, "tasks", "createdAt")? {
        conn.execute(
            r#"
            UPDATE tasks
               SET created_at_ms = CAST(ROUND("createdAt" * 1000) AS INTEGER)
             WHERE created_at_ms = 0 AND "createdAt" IS NOT NULL
            "#,
            [],
        )?;
    }
    Ok(())
}
