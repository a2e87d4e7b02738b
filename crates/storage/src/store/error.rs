#![forbid(unsafe_code)]

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("corrupt row: {0}")]
    CorruptRow(&'static str),
    #[error("unknown id")]
    UnknownId,
    #[error("email already registered")]
    DuplicateEmail,
    #[error("invalid migration registry: {0}")]
    InvalidRegistry(String),
    #[error("schema version {found} is newer than the latest known version {supported}")]
    SchemaTooNew { supported: u32, found: u32 },
    #[error("migration conflict at v{version} (expected={expected}, found={found})")]
    MigrationConflict { version: u32, expected: u32, found: u32 },
    #[error("migration v{version} ({description}) failed: {source}")]
    MigrationFailed {
        version: u32,
        description: &'static str,
        #[source]
        source: Box<StoreError>,
    },
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO",
            Self::Sql(_) => "SQLITE",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::CorruptRow(_) => "CORRUPT_ROW",
            Self::UnknownId => "UNKNOWN_ID",
            Self::DuplicateEmail => "DUPLICATE_EMAIL",
            Self::InvalidRegistry(_) => "INVALID_REGISTRY",
            Self::SchemaTooNew { .. } => "SCHEMA_TOO_NEW",
            Self::MigrationConflict { .. } => "MIGRATION_CONFLICT",
            Self::MigrationFailed { .. } => "MIGRATION_FAILED",
        }
    }

    /// True for errors raised while bringing the schema up to date.
    pub fn is_migration_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidRegistry(_)
                | Self::SchemaTooNew { .. }
                | Self::MigrationConflict { .. }
                | Self::MigrationFailed { .. }
        )
    }
}
