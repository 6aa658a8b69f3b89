//! Refreshing observed state.

use tracing::{debug, warn};

use crate::client::ReplicationGroupApi;
use crate::error::{ControllerError, Operation};
use crate::mapper;
use crate::resource::{LifecyclePhase, ManagedResource};
use crate::status::ReplicationGroupStatus;

use super::{ReplicationGroupController, unexpected_status};

impl<C> ReplicationGroupController<C>
where
    C: ReplicationGroupApi,
{
    /// Describes the tracked group and records its phase. The observed state
    /// is replaced only when the group is available.
    ///
    /// A group the control plane no longer knows is released from `resource`
    /// and the read succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Api`] for describe failures other than
    /// not-found and [`ControllerError::UnexpectedStatus`] for unknown
    /// statuses.
    pub async fn read(&self, resource: &mut ManagedResource) -> Result<(), ControllerError> {
        let Some(handle) = resource.handle().cloned() else {
            debug!("read skipped: no replication group tracked");
            return Ok(());
        };

        let group = match self.client.describe_replication_group(handle.as_str()).await {
            Ok(group) => group,
            Err(err) if err.is_not_found() => {
                warn!(
                    replication_group_id = %handle,
                    "replication group no longer exists; releasing it"
                );
                resource.release();
                return Ok(());
            }
            Err(source) => {
                return Err(ControllerError::Api {
                    operation: Operation::Read,
                    handle,
                    source,
                });
            }
        };

        let status = group
            .status
            .parse::<ReplicationGroupStatus>()
            .map_err(|err| unexpected_status(Operation::Read, &handle, err))?;
        resource.set_phase(LifecyclePhase::from_status(status));
        let refreshed = mapper::refresh_observed(resource.observed_slot(), &group)
            .map_err(|err| unexpected_status(Operation::Read, &handle, err))?;

        debug!(
            replication_group_id = %handle,
            status = %status,
            refreshed,
            "read replication group"
        );
        Ok(())
    }
}
