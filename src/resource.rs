//! Per-instance record the engine persists between controller invocations.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::observed::ObservedState;
use crate::status::ReplicationGroupStatus;

/// Opaque remote identifier of a replication group.
///
/// Assigned once when the group is created and used as the only key for
/// every later describe, modify, and delete call.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceHandle(String);

impl ResourceHandle {
    /// Wraps a remote identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the identifier.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ResourceHandle {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl AsRef<str> for ResourceHandle {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for ResourceHandle {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle phase of a managed replication group.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// No remote object is tracked.
    #[default]
    Unmanaged,
    /// Provisioning has been requested.
    Creating,
    /// The group is stable.
    Available,
    /// An in-place modification is being applied.
    Modifying,
    /// Teardown has been requested.
    Deleting,
    /// The remote side reported a failed provisioning.
    Failed,
}

impl LifecyclePhase {
    /// Maps a remote status onto the controller's phase.
    #[must_use]
    pub const fn from_status(status: ReplicationGroupStatus) -> Self {
        match status {
            ReplicationGroupStatus::Creating => Self::Creating,
            ReplicationGroupStatus::Available | ReplicationGroupStatus::Snapshotting => {
                Self::Available
            }
            ReplicationGroupStatus::Modifying => Self::Modifying,
            ReplicationGroupStatus::Deleting => Self::Deleting,
            ReplicationGroupStatus::CreateFailed => Self::Failed,
        }
    }
}

/// State the controller keeps for one replication group.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ManagedResource {
    handle: Option<ResourceHandle>,
    phase: LifecyclePhase,
    observed: Option<ObservedState>,
}

impl ManagedResource {
    /// Starts an unmanaged record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a record from a handle stored by the engine. The next read
    /// establishes the phase and observed state.
    #[must_use]
    pub const fn resume(handle: ResourceHandle) -> Self {
        Self {
            handle: Some(handle),
            phase: LifecyclePhase::Available,
            observed: None,
        }
    }

    /// Handle of the tracked group, if any.
    #[must_use]
    pub const fn handle(&self) -> Option<&ResourceHandle> {
        self.handle.as_ref()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    /// Last observation of an available group.
    #[must_use]
    pub const fn observed(&self) -> Option<&ObservedState> {
        self.observed.as_ref()
    }

    /// Returns `true` while a remote group is tracked.
    #[must_use]
    pub const fn is_managed(&self) -> bool {
        self.handle.is_some()
    }

    pub(crate) fn track(&mut self, handle: ResourceHandle, phase: LifecyclePhase) {
        self.handle = Some(handle);
        self.phase = phase;
    }

    pub(crate) const fn set_phase(&mut self, phase: LifecyclePhase) {
        self.phase = phase;
    }

    pub(crate) const fn observed_slot(&mut self) -> &mut Option<ObservedState> {
        &mut self.observed
    }

    pub(crate) fn release(&mut self) {
        self.handle = None;
        self.phase = LifecyclePhase::Unmanaged;
        self.observed = None;
    }
}
