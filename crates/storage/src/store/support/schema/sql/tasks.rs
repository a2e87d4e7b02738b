#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS tasks (
          id TEXT PRIMARY KEY,
          owner_id TEXT REFERENCES users(id),
          title TEXT NOT NULL DEFAULT '',
          description TEXT NOT NULL DEFAULT '',
          deadline TEXT NOT NULL DEFAULT '',
          tags TEXT,
          status TEXT NOT NULL DEFAULT 'todo',
          created_at_ms INTEGER NOT NULL DEFAULT 0
        );
"#;

pub(in crate::store::support::schema) const COLUMNS: &[(&str, &str)] = &[
    ("owner_id", "TEXT REFERENCES users(id)"),
    ("title", "TEXT NOT NULL DEFAULT ''"),
    ("description", "TEXT NOT NULL DEFAULT ''"),
    ("deadline", "TEXT NOT NULL DEFAULT ''"),
    ("tags", "TEXT"),
    ("status", "TEXT NOT NULL DEFAULT 'todo'"),
    ("created_at_ms", "INTEGER NOT NULL DEFAULT 0"),
];
