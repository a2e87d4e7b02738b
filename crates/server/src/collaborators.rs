#![forbid(unsafe_code)]

//! External collaborators the service consumes: wall-clock time, fresh ids, password hashing.

use sha2::Digest as _;
use std::fmt::Write as _;
use time::OffsetDateTime;

pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> String;
    fn verify(&self, password: &str, stored: &str) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
        let ms = nanos / 1_000_000i128;
        if ms <= 0 {
            0
        } else if ms >= i64::MAX as i128 {
            i64::MAX
        } else {
            ms as i64
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Salted SHA-256, stored as `sha256$<salt>$<hex digest>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256PasswordHasher;

const SCHEME: &str = "sha256";

impl PasswordHasher for Sha256PasswordHasher {
    fn hash(&self, password: &str) -> String {
        let salt = uuid::Uuid::new_v4().simple().to_string();
        let digest = salted_digest_hex(&salt, password);
        format!("{SCHEME}${salt}${digest}")
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        let mut parts = stored.splitn(3, '$');
        let (Some(scheme), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        if scheme != SCHEME {
            return false;
        }
        let actual = salted_digest_hex(salt, password);
        constant_time_eq(actual.as_bytes(), expected.as_bytes())
    }
}

fn salted_digest_hex(salt: &str, password: &str) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();

    let mut out = String::with_capacity(64);
    for b in digest {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// The collaborator set a [`crate::TaskService`] is built with.
pub struct Collaborators {
    pub clock: Box<dyn Clock>,
    pub ids: Box<dyn IdGenerator>,
    pub hasher: Box<dyn PasswordHasher>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            clock: Box::new(SystemClock),
            ids: Box::new(UuidGenerator),
            hasher: Box::new(Sha256PasswordHasher),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
