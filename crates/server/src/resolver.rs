#![forbid(unsafe_code)]

use crate::ServiceError;
use vt_core::{Principal, PrincipalId};
use vt_storage::SqliteStore;

/// Maps an already-authenticated opaque credential to its principal.
///
/// The blocked check runs on every resolution, not only at login. Read-only.
pub fn resolve(store: &SqliteStore, credential: Option<&str>) -> Result<Principal, ServiceError> {
    let Some(raw) = credential.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Err(ServiceError::Unauthenticated);
    };
    let Ok(id) = PrincipalId::try_new(raw) else {
        return Err(ServiceError::Unauthenticated);
    };
    let Some(principal) = store.get_user(&id)? else {
        return Err(ServiceError::Unauthenticated);
    };
    if principal.is_blocked {
        tracing::debug!(user_id = %principal.id, "blocked principal refused");
        return Err(ServiceError::Forbidden);
    }
    Ok(principal)
}
