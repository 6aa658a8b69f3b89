//! Teardown of replication groups.

use tracing::info;

use crate::client::ReplicationGroupApi;
use crate::error::{ControllerError, Operation};
use crate::poller::{Convergence, WaitRequest};
use crate::resource::{LifecyclePhase, ManagedResource};
use crate::status::ReplicationGroupStatus;

use super::ReplicationGroupController;

impl<C> ReplicationGroupController<C>
where
    C: ReplicationGroupApi,
{
    /// Deletes the tracked group and waits until the control plane no longer
    /// reports it.
    ///
    /// Deleting an untracked or already missing group succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::UnexpectedStatus`] when the group settles
    /// on a present status, and the API and timeout variants for remote
    /// failures.
    pub async fn delete(&self, resource: &mut ManagedResource) -> Result<(), ControllerError> {
        let Some(handle) = resource.handle().cloned() else {
            return Ok(());
        };

        info!(
            replication_group_id = %handle,
            operation = %Operation::Delete,
            "deleting replication group"
        );
        match self.client.delete_replication_group(handle.as_str()).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                info!(replication_group_id = %handle, "replication group already gone");
                resource.release();
                return Ok(());
            }
            Err(source) => {
                return Err(ControllerError::Api {
                    operation: Operation::Delete,
                    handle,
                    source,
                });
            }
        }
        resource.set_phase(LifecyclePhase::Deleting);

        let wait = WaitRequest::until_absent(
            &[
                ReplicationGroupStatus::Creating,
                ReplicationGroupStatus::Available,
                ReplicationGroupStatus::Deleting,
            ],
            self.timeouts.delete,
        );
        match self.converge(Operation::Delete, &handle, &wait).await? {
            Convergence::Absent => {
                info!(replication_group_id = %handle, "replication group deleted");
                resource.release();
                Ok(())
            }
            Convergence::Reached { status, .. } => Err(ControllerError::UnexpectedStatus {
                operation: Operation::Delete,
                handle,
                status: status.to_string(),
            }),
        }
    }
}
