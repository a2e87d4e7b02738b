#![forbid(unsafe_code)]

use crate::ids::{PrincipalId, TaskId};
use serde::{Deserialize, Serialize};

/// Status values the clients know about. The store accepts any string.
pub mod status {
    pub const TODO: &str = "todo";
    pub const IN_PROGRESS: &str = "in progress";
    pub const ON_HOLD: &str = "on hold";
    pub const DONE: &str = "done";
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "free" => Some(Tier::Free),
            "pro" => Some(Tier::Pro),
            _ => None,
        }
    }
}

/// An authenticated account. Stored as a row of `users`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: PrincipalId,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub tier: Tier,
    pub is_blocked: bool,
    pub is_admin: bool,
}

impl Principal {
    pub fn is_externally_authenticated(&self) -> bool {
        self.password_hash.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub owner_id: PrincipalId,
    pub title: String,
    pub description: String,
    pub deadline: String,
    pub tags: Vec<String>,
    pub status: String,
    pub created_at_ms: i64,
}

/// Validated body of a task creation request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TaskFields {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deadline: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    status::TODO.to_string()
}

/// Sparse update: `None` leaves the stored value untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.deadline.is_none()
            && self.tags.is_none()
            && self.status.is_none()
    }

    pub fn apply_to(self, task: &mut Task) {
        let TaskPatch {
            title,
            description,
            deadline,
            tags,
            status,
        } = self;

        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = description {
            task.description = description;
        }
        if let Some(deadline) = deadline {
            task.deadline = deadline;
        }
        if let Some(tags) = tags {
            task.tags = tags;
        }
        if let Some(status) = status {
            task.status = status;
        }
    }
}
