//! Errors surfaced by the lifecycle controller.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::client::ApiError;
use crate::config::ConfigError;
use crate::resource::ResourceHandle;
use crate::schema::SchemaError;

/// Controller operation an error belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operation {
    /// Provision a new group.
    Create,
    /// Refresh the observed state.
    Read,
    /// Apply an in-place modification.
    Update,
    /// Tear the group down.
    Delete,
}

impl Operation {
    /// Lower-case operation name used in messages and log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by [`crate::ReplicationGroupController`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ControllerError {
    /// Raised when the controller configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when the desired attributes fail schema checks.
    #[error("invalid replication group attributes: {0}")]
    Schema(#[from] SchemaError),
    /// Raised when an operation needs a handle and none is tracked.
    #[error("{operation} requires a managed replication group")]
    NotManaged {
        /// Operation that was attempted.
        operation: Operation,
    },
    /// Raised when create is called while a group is already tracked.
    #[error("replication group {handle} is already managed")]
    AlreadyManaged {
        /// Handle of the tracked group.
        handle: ResourceHandle,
    },
    /// Wrapper for client failures other than not-found.
    #[error("{operation} of replication group {handle} failed: {source}")]
    Api {
        /// Operation that issued the call.
        operation: Operation,
        /// Handle the call targeted.
        handle: ResourceHandle,
        /// Client error, surfaced verbatim.
        #[source]
        source: ApiError,
    },
    /// Raised when a wait exceeds its budget.
    #[error("timed out after {waited:?} waiting for {operation} of replication group {handle}")]
    Timeout {
        /// Operation being waited on.
        operation: Operation,
        /// Handle of the group.
        handle: ResourceHandle,
        /// Time spent waiting.
        waited: Duration,
    },
    /// Raised when the group disappears while waiting for it to settle.
    #[error("replication group {handle} disappeared during {operation}")]
    Vanished {
        /// Operation being waited on.
        operation: Operation,
        /// Handle of the group.
        handle: ResourceHandle,
    },
    /// Raised for unrecognised statuses and for deletes that settle on a
    /// present status.
    #[error("replication group {handle} reported unexpected status '{status}' during {operation}")]
    UnexpectedStatus {
        /// Operation in progress.
        operation: Operation,
        /// Handle of the group.
        handle: ResourceHandle,
        /// Status string reported by the control plane.
        status: String,
    },
}

impl From<ConfigError> for ControllerError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}
