#![forbid(unsafe_code)]

//! Boundary operations of the task tracker: account lifecycle, owner-scoped task CRUD, and
//! admin moderation, plus the process plumbing (config, logging, stdio JSON-RPC).

pub mod collaborators;
pub mod config;
mod error;
pub mod resolver;
pub mod rpc;
mod service;
pub mod telemetry;

pub use collaborators::{Clock, Collaborators, IdGenerator, PasswordHasher};
pub use config::{ConfigError, ServerConfig};
pub use error::ServiceError;
pub use service::{AdminAccount, ExternalIdentity, HealthReport, TaskService};
