#![forbid(unsafe_code)]

use super::TaskService;
use crate::ServiceError;
use vt_core::policy::{can_create_task, can_mutate_task};
use vt_core::{Principal, Task, TaskFields, TaskId, TaskPatch};
use vt_storage::NewTask;

impl TaskService {
    pub fn list_tasks(&self, principal: &Principal) -> Result<Vec<Task>, ServiceError> {
        Ok(self.store().list_tasks_by_owner(&principal.id)?)
    }

    pub fn create_task(
        &self,
        principal: &Principal,
        fields: TaskFields,
    ) -> Result<Task, ServiceError> {
        let id = TaskId::try_new(self.next_id())
            .map_err(|_| ServiceError::InvalidInput("id generator produced an invalid id"))?;
        let created_at_ms = self.now_ms();

        let mut store = self.store();
        let existing = store.count_tasks_by_owner(&principal.id)?;
        if let Err(denial) = can_create_task(principal, existing) {
            tracing::debug!(user_id = %principal.id, existing, "task quota reached");
            return Err(denial.into());
        }

        let task = store.create_task(NewTask {
            id,
            owner_id: principal.id.clone(),
            fields,
            created_at_ms,
        })?;
        Ok(task)
    }

    /// Tasks that exist but belong to someone else are reported as `NotFound`.
    pub fn update_task(
        &self,
        principal: &Principal,
        task_id: &TaskId,
        patch: TaskPatch,
    ) -> Result<Task, ServiceError> {
        let mut store = self.store();
        let task = store.find_task(task_id)?.ok_or(ServiceError::NotFound)?;
        can_mutate_task(principal, &task)?;
        Ok(store.update_task(task_id, &principal.id, patch)?)
    }

    pub fn delete_task(&self, principal: &Principal, task_id: &TaskId) -> Result<(), ServiceError> {
        let mut store = self.store();
        let task = store.find_task(task_id)?.ok_or(ServiceError::NotFound)?;
        can_mutate_task(principal, &task)?;
        store.delete_task(task_id, &principal.id)?;
        Ok(())
    }
}
