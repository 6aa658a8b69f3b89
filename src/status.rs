//! Closed set of replication group statuses reported by the control plane.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status of a replication group.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplicationGroupStatus {
    /// Provisioning is in progress.
    Creating,
    /// The group is serving traffic and its attributes are stable.
    Available,
    /// An in-place modification is being applied.
    Modifying,
    /// Teardown is in progress.
    Deleting,
    /// A snapshot is being taken; the group keeps serving traffic.
    Snapshotting,
    /// Provisioning failed on the remote side.
    CreateFailed,
}

/// Raised when the control plane reports a status outside the known set.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unrecognised replication group status '{0}'")]
pub struct UnrecognisedStatus(pub String);

impl ReplicationGroupStatus {
    /// Wire representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Creating => "creating",
            Self::Available => "available",
            Self::Modifying => "modifying",
            Self::Deleting => "deleting",
            Self::Snapshotting => "snapshotting",
            Self::CreateFailed => "create-failed",
        }
    }

    /// Returns `true` when moving from `self` to `next` is an expected
    /// transition. Staying in the same status is always expected.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Creating,
                Self::Creating | Self::Available | Self::CreateFailed
            ) | (
                Self::Available,
                Self::Available | Self::Modifying | Self::Deleting | Self::Snapshotting
            ) | (Self::Modifying, Self::Modifying | Self::Available)
                | (Self::Snapshotting, Self::Snapshotting | Self::Available)
                | (Self::Deleting, Self::Deleting)
                | (Self::CreateFailed, Self::CreateFailed | Self::Deleting)
        )
    }
}

impl fmt::Display for ReplicationGroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplicationGroupStatus {
    type Err = UnrecognisedStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        [
            Self::Creating,
            Self::Available,
            Self::Modifying,
            Self::Deleting,
            Self::Snapshotting,
            Self::CreateFailed,
        ]
        .into_iter()
        .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
        .ok_or_else(|| UnrecognisedStatus(trimmed.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("creating", ReplicationGroupStatus::Creating)]
    #[case("Available", ReplicationGroupStatus::Available)]
    #[case(" modifying ", ReplicationGroupStatus::Modifying)]
    #[case("create-failed", ReplicationGroupStatus::CreateFailed)]
    fn parses_wire_statuses(#[case] raw: &str, #[case] expected: ReplicationGroupStatus) {
        assert_eq!(raw.parse::<ReplicationGroupStatus>(), Ok(expected));
    }

    #[test]
    fn rejects_unknown_status() {
        let err = "rebooting cluster nodes"
            .parse::<ReplicationGroupStatus>()
            .expect_err("unknown status must not parse");
        assert_eq!(
            err.to_string(),
            "unrecognised replication group status 'rebooting cluster nodes'"
        );
    }

    #[rstest]
    #[case(ReplicationGroupStatus::Creating, ReplicationGroupStatus::Available, true)]
    #[case(ReplicationGroupStatus::Available, ReplicationGroupStatus::Modifying, true)]
    #[case(ReplicationGroupStatus::Modifying, ReplicationGroupStatus::Available, true)]
    #[case(ReplicationGroupStatus::Available, ReplicationGroupStatus::Deleting, true)]
    #[case(ReplicationGroupStatus::Available, ReplicationGroupStatus::Creating, false)]
    #[case(ReplicationGroupStatus::Deleting, ReplicationGroupStatus::Available, false)]
    #[case(ReplicationGroupStatus::Creating, ReplicationGroupStatus::Modifying, false)]
    fn transition_table(
        #[case] from: ReplicationGroupStatus,
        #[case] to: ReplicationGroupStatus,
        #[case] expected: bool,
    ) {
        assert_eq!(from.can_transition_to(to), expected);
    }
}
