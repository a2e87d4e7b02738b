#![forbid(unsafe_code)]

//! Access decisions over principals and tasks.
//!
//! Every function here is pure: callers load whatever state a decision needs and pass it in.
//! A denial is returned as `Err(Denial)` so call sites can use `?` directly.

use crate::model::{Principal, Task, Tier};

/// Maximum number of tasks a free-tier owner may hold.
pub const FREE_TIER_TASK_LIMIT: u64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("free tier task quota exceeded (limit={limit})")]
    QuotaExceeded { limit: u64 },
    /// Also used for tasks owned by someone else, so their existence is not revealed.
    #[error("not found")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("an admin cannot block or unblock their own account")]
    SelfBlockDenied,
}

pub fn can_create_task(principal: &Principal, existing_task_count: u64) -> Result<(), Denial> {
    if principal.tier == Tier::Free && existing_task_count >= FREE_TIER_TASK_LIMIT {
        return Err(Denial::QuotaExceeded {
            limit: FREE_TIER_TASK_LIMIT,
        });
    }
    Ok(())
}

pub fn can_mutate_task(principal: &Principal, task: &Task) -> Result<(), Denial> {
    if task.owner_id != principal.id {
        return Err(Denial::NotFound);
    }
    Ok(())
}

pub fn can_administer(principal: &Principal) -> Result<(), Denial> {
    if !principal.is_admin {
        return Err(Denial::Forbidden);
    }
    Ok(())
}

/// The target's own admin bit does not matter: admins may block other admins.
pub fn can_toggle_block(admin: &Principal, target: &Principal) -> Result<(), Denial> {
    can_administer(admin)?;
    if target.id == admin.id {
        return Err(Denial::SelfBlockDenied);
    }
    Ok(())
}

/// Bootstrap rule evaluated once, at the moment a principal is first created.
///
/// `existing_user_count` is the number of principals ever registered, not the number that
/// currently exist.
pub fn first_user_is_admin(existing_user_count: u64) -> bool {
    existing_user_count == 0
}
