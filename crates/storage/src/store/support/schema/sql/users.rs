#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS users (
          id TEXT PRIMARY KEY,
          email TEXT NOT NULL UNIQUE,
          name TEXT NOT NULL DEFAULT '',
          picture TEXT,
          password_hash TEXT,
          tier TEXT NOT NULL DEFAULT 'free',
          is_blocked INTEGER NOT NULL DEFAULT 0,
          is_admin INTEGER NOT NULL DEFAULT 0,
          created_at_ms INTEGER NOT NULL DEFAULT 0
        );
"#;

/// Columns added after the table was first introduced.
pub(in crate::store::support::schema) const COLUMNS: &[(&str, &str)] = &[
    ("picture", "TEXT"),
    ("tier", "TEXT NOT NULL DEFAULT 'free'"),
    ("is_blocked", "INTEGER NOT NULL DEFAULT 0"),
    ("is_admin", "INTEGER NOT NULL DEFAULT 0"),
];
