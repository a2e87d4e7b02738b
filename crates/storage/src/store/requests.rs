#![forbid(unsafe_code)]

use vt_core::{PrincipalId, TaskFields, TaskId, Tier};

/// How the `is_admin` bit of a new user is decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminGrant {
    /// Admin only when no user has ever been registered before.
    FirstUserOnly,
    /// Operator bootstrap (`create-admin`): always admin.
    Operator,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub id: PrincipalId,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub password_hash: Option<String>,
    pub tier: Tier,
    pub grant: AdminGrant,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTask {
    pub id: TaskId,
    pub owner_id: PrincipalId,
    pub fields: TaskFields,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaVersionRow {
    pub version: u32,
    pub applied_at_ms: i64,
}
