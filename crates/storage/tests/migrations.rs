use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use vt_storage::migrations::{
    Migration, MigrationRegistry, apply_pending, current_version, migration_history,
};
use vt_core::{PrincipalId, TaskFields, TaskId, Tier};
use vt_storage::{AdminGrant, NewTask, NewUser, SqliteStore, StoreError};

fn temp_storage_dir(label: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be monotonic enough for tests")
        .as_nanos();
    path.push(format!(
        "vt-storage-migrations-{label}-{}-{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&path).expect("temp storage dir must be creatable");
    path
}

fn open_raw(dir: &Path) -> Connection {
    let conn = Connection::open(dir.join("sample.db")).expect("sample db must open");
    conn.busy_timeout(Duration::from_secs(10))
        .expect("busy timeout must be settable");
    conn
}

fn sample_v1(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sample (n INTEGER NOT NULL); INSERT INTO sample(n) VALUES (1);",
    )?;
    Ok(())
}

fn sample_v2(conn: &Connection) -> Result<(), StoreError> {
    conn.execute("INSERT INTO sample(n) VALUES (2)", [])?;
    Ok(())
}

fn sample_v3(conn: &Connection) -> Result<(), StoreError> {
    conn.execute("INSERT INTO sample(n) VALUES (3)", [])?;
    Ok(())
}

fn sample_v2_fails_after_write(conn: &Connection) -> Result<(), StoreError> {
    conn.execute("INSERT INTO sample(n) VALUES (2)", [])?;
    Err(StoreError::InvalidInput("synthetic failure"))
}

fn noop(_conn: &Connection) -> Result<(), StoreError> {
    Ok(())
}

fn sample_registry() -> MigrationRegistry {
    MigrationRegistry::new(vec![
        Migration::new(3, "third", sample_v3),
        Migration::new(1, "first", sample_v1),
        Migration::new(2, "second", sample_v2),
    ])
    .expect("contiguous registry must be accepted")
}

fn sample_values(conn: &Connection) -> Vec<i64> {
    let mut stmt = conn
        .prepare("SELECT n FROM sample ORDER BY rowid ASC")
        .expect("sample select must prepare");
    stmt.query_map([], |row| row.get::<_, i64>(0))
        .expect("sample rows must load")
        .collect::<Result<Vec<_>, _>>()
        .expect("sample values must decode")
}

fn recorded_versions(conn: &Connection) -> Vec<u32> {
    migration_history(conn)
        .expect("history must load")
        .into_iter()
        .map(|row| row.version)
        .collect()
}

#[test]
fn registry_rejects_duplicates_and_gaps() {
    let duplicate = MigrationRegistry::new(vec![
        Migration::new(1, "a", noop),
        Migration::new(1, "b", noop),
    ])
    .expect_err("duplicate versions must be rejected");
    assert_eq!(duplicate.code(), "INVALID_REGISTRY");

    let gap = MigrationRegistry::new(vec![
        Migration::new(1, "a", noop),
        Migration::new(3, "c", noop),
    ])
    .expect_err("a missing intermediate version must be rejected");
    assert!(matches!(gap, StoreError::InvalidRegistry(message) if message.contains('2')));

    let zero = MigrationRegistry::new(vec![Migration::new(0, "zero", noop)])
        .expect_err("version zero is reserved for the empty schema");
    assert_eq!(zero.code(), "INVALID_REGISTRY");

    let registry = sample_registry();
    assert_eq!(registry.latest(), 3);
    let order: Vec<u32> = registry.iter().map(|migration| migration.version).collect();
    assert_eq!(order, vec![1, 2, 3]);
    let pending: Vec<u32> = registry.pending(1).map(|migration| migration.version).collect();
    assert_eq!(pending, vec![2, 3]);
}

#[test]
fn sweep_reaches_latest_and_rerun_is_noop() {
    let dir = temp_storage_dir("sweep");
    let mut conn = open_raw(&dir);
    let registry = sample_registry();

    assert_eq!(current_version(&conn).expect("empty db has a version"), 0);

    let report = apply_pending(&mut conn, &registry).expect("sweep must succeed");
    assert_eq!(report.from_version, 0);
    assert_eq!(report.to_version, 3);
    assert_eq!(report.applied, vec![1, 2, 3]);
    assert_eq!(sample_values(&conn), vec![1, 2, 3]);
    assert_eq!(recorded_versions(&conn), vec![1, 2, 3]);

    let rerun = apply_pending(&mut conn, &registry).expect("rerun must succeed");
    assert!(rerun.is_noop());
    assert_eq!(rerun.to_version, 3);
    assert_eq!(sample_values(&conn), vec![1, 2, 3], "actions must not re-run");
    assert_eq!(recorded_versions(&conn), vec![1, 2, 3], "no duplicate rows");
}

#[test]
fn sweep_resumes_from_recorded_version() {
    let dir = temp_storage_dir("resume");
    let mut conn = open_raw(&dir);

    let first_only = MigrationRegistry::new(vec![Migration::new(1, "first", sample_v1)])
        .expect("single migration registry");
    apply_pending(&mut conn, &first_only).expect("first sweep must succeed");
    assert_eq!(current_version(&conn).expect("version"), 1);

    let report = apply_pending(&mut conn, &sample_registry()).expect("second sweep");
    assert_eq!(report.from_version, 1);
    assert_eq!(report.applied, vec![2, 3]);
    assert_eq!(sample_values(&conn), vec![1, 2, 3]);
}

#[test]
fn failing_migration_keeps_prior_versions_and_records_nothing_for_itself() {
    let dir = temp_storage_dir("failure");
    let mut conn = open_raw(&dir);
    let registry = MigrationRegistry::new(vec![
        Migration::new(1, "first", sample_v1),
        Migration::new(2, "broken", sample_v2_fails_after_write),
        Migration::new(3, "third", sample_v3),
    ])
    .expect("registry");

    let err = apply_pending(&mut conn, &registry).expect_err("sweep must stop at v2");
    assert!(err.is_migration_failure());
    assert!(matches!(
        err,
        StoreError::MigrationFailed {
            version: 2,
            description: "broken",
            ..
        }
    ));

    assert_eq!(current_version(&conn).expect("version"), 1);
    assert_eq!(recorded_versions(&conn), vec![1]);
    assert_eq!(
        sample_values(&conn),
        vec![1],
        "the failed step's partial write must roll back"
    );

    let fixed = sample_registry();
    let report = apply_pending(&mut conn, &fixed).expect("fixed registry must resume");
    assert_eq!(report.applied, vec![2, 3]);
    assert_eq!(recorded_versions(&conn), vec![1, 2, 3]);
}

#[test]
fn database_newer_than_registry_is_rejected() {
    let dir = temp_storage_dir("too-new");
    let mut conn = open_raw(&dir);
    apply_pending(&mut conn, &sample_registry()).expect("full sweep");

    let older = MigrationRegistry::new(vec![Migration::new(1, "first", sample_v1)])
        .expect("registry");
    let err = apply_pending(&mut conn, &older).expect_err("older binary must refuse");
    assert!(matches!(
        err,
        StoreError::SchemaTooNew {
            supported: 1,
            found: 3
        }
    ));
    assert_eq!(sample_values(&conn), vec![1, 2, 3]);
}

#[test]
fn concurrent_sweeps_record_each_version_once() {
    let dir = temp_storage_dir("concurrent");
    // Create the file up front so every worker opens the same database.
    drop(open_raw(&dir));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let dir = dir.clone();
            std::thread::spawn(move || {
                let mut conn = open_raw(&dir);
                apply_pending(&mut conn, &sample_registry()).map(|report| report.applied)
            })
        })
        .collect();

    let mut applied = Vec::new();
    for worker in workers {
        let versions = worker
            .join()
            .expect("worker must not panic")
            .expect("every sweep must succeed");
        applied.extend(versions);
    }
    applied.sort_unstable();
    assert_eq!(applied, vec![1, 2, 3], "each version applied by exactly one worker");

    let conn = open_raw(&dir);
    assert_eq!(recorded_versions(&conn), vec![1, 2, 3]);
    assert_eq!(sample_values(&conn), vec![1, 2, 3]);
}

#[test]
fn store_open_applies_builtin_registry_once() {
    let dir = temp_storage_dir("builtin");
    let builtin = MigrationRegistry::builtin().expect("builtin registry must be valid");

    let store = SqliteStore::open(&dir).expect("fresh storage should open");
    assert_eq!(store.schema_version().expect("version"), builtin.latest());
    let expected: Vec<u32> = (1..=builtin.latest()).collect();
    assert_eq!(store.migration_report().applied, expected);
    assert!(store.created_at_ms().expect("meta").is_some());
    drop(store);

    let reopened = SqliteStore::open(&dir).expect("existing storage should reopen");
    assert!(reopened.migration_report().is_noop());
    let history: Vec<u32> = reopened
        .migration_history()
        .expect("history")
        .into_iter()
        .map(|row| row.version)
        .collect();
    assert_eq!(history, expected);
}

#[test]
fn legacy_unversioned_database_is_adopted() {
    let dir = temp_storage_dir("legacy");
    let conn = Connection::open(dir.join("voxtask.db")).expect("legacy db must open");
    conn.execute_batch(
        r#"
        CREATE TABLE tasks (
          id VARCHAR NOT NULL,
          title VARCHAR,
          description TEXT,
          deadline VARCHAR,
          tags TEXT,
          status VARCHAR,
          "createdAt" FLOAT,
          PRIMARY KEY (id)
        );
        CREATE INDEX ix_tasks_id ON tasks (id);
        CREATE INDEX ix_tasks_title ON tasks (title);
        INSERT INTO tasks(id, title, description, deadline, tags, status, "createdAt")
          VALUES ('legacy-1', 'old task', 'kept', '2024-05-01', '["home"]', 'done', 1700000000.25);
        INSERT INTO tasks(id, title, description, deadline, tags, status, "createdAt")
          VALUES ('legacy-2', 'sparse', NULL, NULL, NULL, NULL, NULL);
        "#,
    )
    .expect("legacy schema should be created");
    drop(conn);

    let mut store = SqliteStore::open(&dir).expect("legacy storage should migrate");
    let owner = store
        .insert_user(NewUser {
            id: PrincipalId::try_new("owner").expect("principal id"),
            email: "owner@example.com".to_string(),
            name: "Owner".to_string(),
            picture: None,
            password_hash: None,
            tier: Tier::Free,
            grant: AdminGrant::FirstUserOnly,
            created_at_ms: 0,
        })
        .expect("user on a legacy database")
        .id;
    drop(store);

    let conn = Connection::open(dir.join("voxtask.db")).expect("migrated db must open");
    conn.execute("UPDATE tasks SET owner_id=?1", params![owner.as_str()])
        .expect("claim legacy rows");
    drop(conn);

    let mut store = SqliteStore::open(&dir).expect("adopted storage should reopen");
    assert!(store.migration_report().is_noop());

    let tasks = store.list_tasks_by_owner(&owner).expect("legacy rows list");
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].title, "old task");
    assert_eq!(tasks[0].tags, vec!["home".to_string()]);
    assert_eq!(tasks[0].status, "done");
    assert_eq!(tasks[0].created_at_ms, 1_700_000_000_250);
    assert_eq!(tasks[1].description, "");
    assert_eq!(tasks[1].deadline, "");
    assert_eq!(tasks[1].status, "todo");
    assert_eq!(tasks[1].created_at_ms, 0);

    let created = store
        .create_task(NewTask {
            id: TaskId::try_new("fresh").expect("task id"),
            owner_id: owner.clone(),
            fields: TaskFields {
                title: "fresh".to_string(),
                description: String::new(),
                deadline: String::new(),
                tags: Vec::new(),
                status: "todo".to_string(),
            },
            created_at_ms: 1_800_000_000_000,
        })
        .expect("create on an adopted table");
    assert_eq!(created.created_at_ms, 1_800_000_000_000);
    assert_eq!(store.count_tasks_by_owner(&owner).expect("count"), 3);
}
