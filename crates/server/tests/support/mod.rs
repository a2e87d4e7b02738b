#![forbid(unsafe_code)]
#![allow(dead_code)]

use serde_json::Value;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use vt_server::collaborators::Sha256PasswordHasher;
use vt_server::{Clock, Collaborators, IdGenerator, TaskService};
use vt_storage::SqliteStore;

pub(crate) fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("vt_server_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub(crate) struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

pub(crate) struct SequentialIds {
    prefix: &'static str,
    next: AtomicU64,
}

impl SequentialIds {
    pub(crate) fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n}", self.prefix)
    }
}

pub(crate) const NOW_MS: i64 = 1_767_225_600_000;

/// A service over a fresh store with deterministic time and ids.
pub(crate) fn service(test_name: &str) -> TaskService {
    let store = SqliteStore::open(temp_dir(test_name)).expect("open store");
    TaskService::with_collaborators(
        store,
        Collaborators {
            clock: Box::new(FixedClock(NOW_MS)),
            ids: Box::new(SequentialIds::new("id")),
            hasher: Box::new(Sha256PasswordHasher),
        },
    )
}

pub(crate) struct Server {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    storage_dir: PathBuf,
    cleanup_storage: bool,
}

impl Server {
    pub(crate) fn start(test_name: &str) -> Self {
        Self::start_with_storage_dir(temp_dir(test_name))
    }

    pub(crate) fn start_with_storage_dir(storage_dir: PathBuf) -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_vt_server"))
            .arg("--storage-dir")
            .arg(&storage_dir)
            .env_remove("RUST_LOG")
            .env("VOXTASK_LOG", "warn")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn vt_server");

        let stdin = child.stdin.take().expect("stdin");
        let stdout = BufReader::new(child.stdout.take().expect("stdout"));

        Self {
            child,
            stdin,
            stdout,
            storage_dir,
            cleanup_storage: true,
        }
    }

    /// Leaves the storage directory in place when this server is dropped.
    pub(crate) fn keep_storage(&mut self) {
        self.cleanup_storage = false;
    }

    pub(crate) fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub(crate) fn send_raw(&mut self, line: &str) {
        writeln!(self.stdin, "{line}").expect("write request");
        self.stdin.flush().expect("flush request");
    }

    pub(crate) fn send(&mut self, req: Value) {
        self.send_raw(&req.to_string());
    }

    pub(crate) fn recv(&mut self) -> Value {
        let mut line = String::new();
        self.stdout.read_line(&mut line).expect("read response");
        assert!(!line.trim().is_empty(), "empty response line");
        serde_json::from_str(&line).expect("parse response json")
    }

    pub(crate) fn request(&mut self, req: Value) -> Value {
        self.send(req);
        self.recv()
    }

    /// Sends a method call and returns the operation envelope inside `result`.
    pub(crate) fn call(&mut self, id: u64, method: &str, params: Value) -> Value {
        let resp = self.request(serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        }));
        assert_eq!(resp.get("id").and_then(|v| v.as_u64()), Some(id));
        resp.get("result").cloned().expect("result envelope")
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        if self.cleanup_storage {
            let _ = std::fs::remove_dir_all(&self.storage_dir);
        }
    }
}

pub(crate) fn error_code(envelope: &Value) -> Option<&str> {
    envelope
        .get("error")
        .and_then(|v| v.get("code"))
        .and_then(|v| v.as_str())
}

pub(crate) fn is_success(envelope: &Value) -> bool {
    envelope.get("success").and_then(|v| v.as_bool()) == Some(true)
}
