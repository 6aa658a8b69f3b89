//! In-place modification of replication groups.

use tracing::{debug, info, warn};

use crate::client::ReplicationGroupApi;
use crate::desired::ReplicationGroupSpec;
use crate::error::{ControllerError, Operation};
use crate::mapper;
use crate::poller::{Convergence, WaitRequest};
use crate::resource::{LifecyclePhase, ManagedResource};
use crate::status::ReplicationGroupStatus;

use super::ReplicationGroupController;

impl<C> ReplicationGroupController<C>
where
    C: ReplicationGroupApi,
{
    /// Applies the mutable differences between `prior` and `desired` in a
    /// single modification, waits for it to settle, then reads the group.
    ///
    /// Changes to attributes that require replacement are logged and left
    /// out of the request. When nothing mutable changed, only the read runs.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::NotManaged`] when `resource` tracks no
    /// group, [`ControllerError::Schema`] when `desired` is invalid, and the
    /// API, timeout, and vanished variants for remote failures.
    pub async fn update(
        &self,
        resource: &mut ManagedResource,
        prior: &ReplicationGroupSpec,
        desired: &ReplicationGroupSpec,
    ) -> Result<(), ControllerError> {
        let Some(handle) = resource.handle().cloned() else {
            return Err(ControllerError::NotManaged {
                operation: Operation::Update,
            });
        };
        let target = desired.validate()?;
        let previous = prior.validate().unwrap_or_else(|_| prior.clone());

        let plan = mapper::to_modify_request(&handle, &previous, &target);
        if !plan.ignored_force_new.is_empty() {
            warn!(
                replication_group_id = %handle,
                fields = ?plan.ignored_force_new,
                "ignoring changes that require replacing the replication group"
            );
        }

        let Some(request) = plan.request else {
            debug!(replication_group_id = %handle, "no in-place changes to apply");
            return self.read(resource).await;
        };

        info!(
            replication_group_id = %handle,
            operation = %Operation::Update,
            "modifying replication group"
        );
        self.client
            .modify_replication_group(&request)
            .await
            .map_err(|source| ControllerError::Api {
                operation: Operation::Update,
                handle: handle.clone(),
                source,
            })?;
        resource.set_phase(LifecyclePhase::Modifying);

        let wait = WaitRequest::until(
            ReplicationGroupStatus::Available,
            &[ReplicationGroupStatus::Modifying],
            self.timeouts.update,
        );
        if self.converge(Operation::Update, &handle, &wait).await? == Convergence::Absent {
            warn!(replication_group_id = %handle, "replication group vanished while modifying");
            resource.release();
            return Err(ControllerError::Vanished {
                operation: Operation::Update,
                handle,
            });
        }

        self.read(resource).await
    }
}
