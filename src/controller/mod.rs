//! Lifecycle controller for replication groups.
//!
//! Each operation works on a [`ManagedResource`] the caller persists between
//! invocations. The handle is stored as soon as the control plane accepts a
//! create request, so a failed or timed-out wait still leaves the group
//! tracked and a later read can pick it up again.
//!
//! [`ManagedResource`]: crate::resource::ManagedResource

mod create;
mod delete;
mod read;
mod update;

use tracing::debug;

use crate::client::ReplicationGroupApi;
use crate::config::{ControllerConfig, ControllerTimeouts};
use crate::error::{ControllerError, Operation};
use crate::poller::{self, Convergence, PollError, WaitRequest};
use crate::resource::ResourceHandle;
use crate::status::UnrecognisedStatus;

/// Drives replication groups through create, read, update, and delete.
#[derive(Clone, Debug)]
pub struct ReplicationGroupController<C> {
    client: C,
    timeouts: ControllerTimeouts,
}

impl<C> ReplicationGroupController<C>
where
    C: ReplicationGroupApi,
{
    /// Builds a controller with the default timeouts.
    #[must_use]
    pub const fn new(client: C) -> Self {
        Self {
            client,
            timeouts: ControllerTimeouts::standard(),
        }
    }

    /// Builds a controller whose timeouts come from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Config`] when the configuration fails
    /// validation.
    pub fn from_config(client: C, config: &ControllerConfig) -> Result<Self, ControllerError> {
        Ok(Self {
            client,
            timeouts: ControllerTimeouts::from_config(config)?,
        })
    }

    /// Replaces the poll schedules.
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: ControllerTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Client used for every remote call.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Poll schedules in effect.
    #[must_use]
    pub const fn timeouts(&self) -> &ControllerTimeouts {
        &self.timeouts
    }

    async fn converge(
        &self,
        operation: Operation,
        handle: &ResourceHandle,
        request: &WaitRequest,
    ) -> Result<Convergence, ControllerError> {
        debug!(replication_group_id = %handle, operation = %operation, "awaiting convergence");
        poller::wait_for(handle, request, || {
            self.client.describe_replication_group(handle.as_str())
        })
        .await
        .map_err(|err| match err {
            PollError::Api(source) => ControllerError::Api {
                operation,
                handle: handle.clone(),
                source,
            },
            PollError::UnrecognisedStatus(status) => unexpected_status(operation, handle, status),
            PollError::Timeout { waited } => ControllerError::Timeout {
                operation,
                handle: handle.clone(),
                waited,
            },
        })
    }
}

fn unexpected_status(
    operation: Operation,
    handle: &ResourceHandle,
    status: UnrecognisedStatus,
) -> ControllerError {
    ControllerError::UnexpectedStatus {
        operation,
        handle: handle.clone(),
        status: status.0,
    }
}
