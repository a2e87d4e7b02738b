#![forbid(unsafe_code)]

pub mod ids;
pub mod model;
pub mod policy;

pub use ids::{IdError, PrincipalId, TaskId};
pub use model::{Principal, Task, TaskFields, TaskPatch, Tier};
pub use policy::{Denial, FREE_TIER_TASK_LIMIT};
