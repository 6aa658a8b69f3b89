//! Provisioning of new replication groups.

use tracing::{info, warn};

use crate::client::ReplicationGroupApi;
use crate::desired::ReplicationGroupSpec;
use crate::error::{ControllerError, Operation};
use crate::mapper;
use crate::poller::{Convergence, WaitRequest};
use crate::resource::{LifecyclePhase, ManagedResource, ResourceHandle};
use crate::status::ReplicationGroupStatus;

use super::ReplicationGroupController;

impl<C> ReplicationGroupController<C>
where
    C: ReplicationGroupApi,
{
    /// Creates the group described by `spec` and waits for it to become
    /// available, then reads it back into `resource`.
    ///
    /// The handle is recorded before waiting. A timeout therefore leaves
    /// `resource` tracking the group in the creating phase.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::AlreadyManaged`] when `resource` already
    /// tracks a group, [`ControllerError::Schema`] when `spec` is invalid,
    /// [`ControllerError::Vanished`] when the group disappears while
    /// provisioning, [`ControllerError::UnexpectedStatus`] when the remote
    /// side reports the provisioning as failed, and the API and timeout
    /// variants for remote failures. A failed provisioning keeps the handle.
    pub async fn create(
        &self,
        resource: &mut ManagedResource,
        spec: &ReplicationGroupSpec,
    ) -> Result<(), ControllerError> {
        if let Some(existing) = resource.handle() {
            return Err(ControllerError::AlreadyManaged {
                handle: existing.clone(),
            });
        }
        let normalised = spec.validate()?;

        let request = mapper::to_create_request(&normalised);
        info!(
            replication_group_id = %request.replication_group_id,
            operation = %Operation::Create,
            "creating replication group"
        );
        let created = self
            .client
            .create_replication_group(&request)
            .await
            .map_err(|source| ControllerError::Api {
                operation: Operation::Create,
                handle: ResourceHandle::new(request.replication_group_id.as_str()),
                source,
            })?;

        let handle = if created.replication_group_id.is_empty() {
            ResourceHandle::new(request.replication_group_id.as_str())
        } else {
            ResourceHandle::new(created.replication_group_id)
        };
        resource.track(handle.clone(), LifecyclePhase::Creating);

        let wait = WaitRequest::until(
            ReplicationGroupStatus::Available,
            &[ReplicationGroupStatus::Creating],
            self.timeouts.create,
        );
        if self.converge(Operation::Create, &handle, &wait).await? == Convergence::Absent {
            warn!(replication_group_id = %handle, "replication group vanished while creating");
            resource.release();
            return Err(ControllerError::Vanished {
                operation: Operation::Create,
                handle,
            });
        }

        self.read(resource).await?;
        if resource.phase() == LifecyclePhase::Failed {
            warn!(replication_group_id = %handle, "replication group failed to provision");
            return Err(ControllerError::UnexpectedStatus {
                operation: Operation::Create,
                handle,
                status: ReplicationGroupStatus::CreateFailed.to_string(),
            });
        }
        Ok(())
    }
}
