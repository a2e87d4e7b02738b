#![forbid(unsafe_code)]

use super::TaskService;
use crate::ServiceError;
use vt_core::policy::{can_administer, can_toggle_block};
use vt_core::{Principal, PrincipalId};

impl TaskService {
    pub fn list_all_users(&self, admin: &Principal) -> Result<Vec<Principal>, ServiceError> {
        can_administer(admin)?;
        Ok(self.store().list_users()?)
    }

    /// Flips the target's blocked flag. Privilege is checked before the target lookup, so a
    /// non-admin learns nothing about which ids exist.
    pub fn toggle_block(
        &self,
        admin: &Principal,
        target_id: &PrincipalId,
    ) -> Result<Principal, ServiceError> {
        can_administer(admin)?;

        let mut store = self.store();
        let target = store.get_user(target_id)?.ok_or(ServiceError::NotFound)?;
        can_toggle_block(admin, &target)?;

        let updated = store.set_blocked(target_id, !target.is_blocked)?;
        tracing::info!(
            admin_id = %admin.id,
            target_id = %updated.id,
            blocked = updated.is_blocked,
            "block flag toggled"
        );
        Ok(updated)
    }
}
