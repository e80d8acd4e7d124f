//! Permission gate for relation changes.
//!
//! Capabilities are owned by an external authorization subsystem and reached
//! through [`CapabilityResolver`]. The gate only decides which capability is
//! needed on which side:
//! - create: update on the base task, read on the other task
//! - delete: update on the base task
//! - list: read on the base task
//!
//! A missing task is an error. A missing capability is `Ok(false)`.

use tracing::debug;

use crate::error::{Error, Result, TaskSide};
use crate::relation::{Requester, TaskId};

/// Authorization lookups the gate delegates to.
pub trait CapabilityResolver {
    fn task_exists(&self, task_id: TaskId) -> Result<bool>;

    fn has_update_capability(&self, requester: &Requester, task_id: TaskId) -> Result<bool>;

    fn has_read_capability(&self, requester: &Requester, task_id: TaskId) -> Result<bool>;
}

impl<T: CapabilityResolver + ?Sized> CapabilityResolver for &T {
    fn task_exists(&self, task_id: TaskId) -> Result<bool> {
        (**self).task_exists(task_id)
    }

    fn has_update_capability(&self, requester: &Requester, task_id: TaskId) -> Result<bool> {
        (**self).has_update_capability(requester, task_id)
    }

    fn has_read_capability(&self, requester: &Requester, task_id: TaskId) -> Result<bool> {
        (**self).has_read_capability(requester, task_id)
    }
}

#[derive(Debug, Clone)]
pub struct PermissionGate<C> {
    resolver: C,
}

impl<C: CapabilityResolver> PermissionGate<C> {
    pub fn new(resolver: C) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &C {
        &self.resolver
    }

    pub fn can_create(
        &self,
        requester: &Requester,
        task_id: TaskId,
        other_task_id: TaskId,
    ) -> Result<bool> {
        self.require_task(task_id, TaskSide::Base)?;
        self.require_task(other_task_id, TaskSide::Other)?;

        let can_update_base = self.resolver.has_update_capability(requester, task_id)?;
        let can_read_other = self.resolver.has_read_capability(requester, other_task_id)?;
        debug!(
            requester = %requester,
            task_id,
            other_task_id,
            can_update_base,
            can_read_other,
            "evaluated create capability"
        );
        Ok(can_update_base && can_read_other)
    }

    pub fn can_delete(&self, requester: &Requester, task_id: TaskId) -> Result<bool> {
        self.require_task(task_id, TaskSide::Base)?;
        self.resolver.has_update_capability(requester, task_id)
    }

    pub fn can_read(&self, requester: &Requester, task_id: TaskId) -> Result<bool> {
        self.require_task(task_id, TaskSide::Base)?;
        self.resolver.has_read_capability(requester, task_id)
    }

    fn require_task(&self, task_id: TaskId, side: TaskSide) -> Result<()> {
        if self.resolver.task_exists(task_id)? {
            Ok(())
        } else {
            Err(Error::TaskDoesNotExist { task_id, side })
        }
    }
}
