//! Convergence poller for asynchronous replication group operations.
//!
//! The poller repeatedly describes a remote group until its status leaves a
//! pending set, the group disappears, or the overall timeout elapses. It never
//! issues mutating calls.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::client::{ApiError, ReplicationGroup};
use crate::resource::ResourceHandle;
use crate::status::{ReplicationGroupStatus, UnrecognisedStatus};

/// Default pause before the first status check.
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_secs(20);
/// Default spacing between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Lower bound on the spacing between status checks.
pub const DEFAULT_MIN_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Timing of a single wait.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollSchedule {
    /// Overall budget for the wait.
    pub timeout: Duration,
    /// Pause before the first check.
    pub delay: Duration,
    /// Requested spacing between checks.
    pub poll_interval: Duration,
    /// Floor applied to `poll_interval`.
    pub min_poll_interval: Duration,
}

impl PollSchedule {
    /// Builds a schedule with the default cadence and the given timeout.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            delay: DEFAULT_POLL_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            min_poll_interval: DEFAULT_MIN_POLL_INTERVAL,
        }
    }

    /// Overrides the initial delay.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Overrides the interval and its floor.
    #[must_use]
    pub const fn with_intervals(
        mut self,
        poll_interval: Duration,
        min_poll_interval: Duration,
    ) -> Self {
        self.poll_interval = poll_interval;
        self.min_poll_interval = min_poll_interval;
        self
    }

    /// Effective spacing between checks.
    #[must_use]
    pub fn spacing(&self) -> Duration {
        self.poll_interval.max(self.min_poll_interval)
    }
}

/// What the wait is trying to reach.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WaitTarget {
    /// A specific status.
    Status(ReplicationGroupStatus),
    /// Removal of the remote object.
    Absent,
}

/// Parameters of a single wait.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WaitRequest {
    /// Statuses that mean "keep polling".
    pub pending: Vec<ReplicationGroupStatus>,
    /// Status the wait resolves to.
    pub target: WaitTarget,
    /// Timing of the wait.
    pub schedule: PollSchedule,
}

impl WaitRequest {
    /// Waits for `target` while the status is one of `pending`.
    #[must_use]
    pub fn until(
        target: ReplicationGroupStatus,
        pending: &[ReplicationGroupStatus],
        schedule: PollSchedule,
    ) -> Self {
        Self {
            pending: pending.to_vec(),
            target: WaitTarget::Status(target),
            schedule,
        }
    }

    /// Waits for the group to disappear while the status is one of
    /// `pending`.
    #[must_use]
    pub fn until_absent(pending: &[ReplicationGroupStatus], schedule: PollSchedule) -> Self {
        Self {
            pending: pending.to_vec(),
            target: WaitTarget::Absent,
            schedule,
        }
    }
}

/// Terminal outcome of a wait.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Convergence {
    /// The status left the pending set.
    Reached {
        /// Resolved status: the explicit target, or the current status when
        /// waiting for absence.
        status: ReplicationGroupStatus,
        /// Group returned by the final check.
        group: Box<ReplicationGroup>,
    },
    /// The control plane no longer knows the group.
    Absent,
}

/// Result of a single status check.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Tick {
    /// The status is still pending.
    Pending(ReplicationGroupStatus),
    /// The wait is over.
    Resolved(Convergence),
}

/// Errors that abort a wait.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PollError {
    /// Describe failed with something other than not-found.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Describe returned a status outside the known set.
    #[error(transparent)]
    UnrecognisedStatus(#[from] UnrecognisedStatus),
    /// The schedule's timeout elapsed before the status left the pending set.
    #[error("timed out after {waited:?}")]
    Timeout {
        /// Time spent waiting.
        waited: Duration,
    },
}

/// Classifies one describe result against `request`.
///
/// # Errors
///
/// Returns [`PollError::Api`] for describe failures other than not-found and
/// [`PollError::UnrecognisedStatus`] for unknown statuses.
pub fn classify(
    result: Result<ReplicationGroup, ApiError>,
    request: &WaitRequest,
) -> Result<Tick, PollError> {
    let group = match result {
        Ok(group) => group,
        Err(err) if err.is_not_found() => return Ok(Tick::Resolved(Convergence::Absent)),
        Err(err) => return Err(err.into()),
    };

    let current = group.status.parse::<ReplicationGroupStatus>()?;
    if request.pending.contains(&current) {
        return Ok(Tick::Pending(current));
    }

    let status = match request.target {
        WaitTarget::Status(target) => {
            if target != current {
                warn!(
                    replication_group_id = %group.replication_group_id,
                    status = %current,
                    target = %target,
                    "status left the pending set without reaching the target"
                );
            }
            target
        }
        WaitTarget::Absent => current,
    };
    Ok(Tick::Resolved(Convergence::Reached {
        status,
        group: Box::new(group),
    }))
}

/// Polls `describe` until `request` resolves.
///
/// Sleeps for the schedule's delay, then checks on a fixed cadence that never
/// drops below the minimum interval. The final sleep is clipped to the
/// remaining budget so the last check lands on the deadline.
///
/// # Errors
///
/// Returns [`PollError::Timeout`] when the budget is exhausted, and the
/// errors of [`classify`] otherwise.
pub async fn wait_for<F, Fut>(
    handle: &ResourceHandle,
    request: &WaitRequest,
    mut describe: F,
) -> Result<Convergence, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<ReplicationGroup, ApiError>>,
{
    let started = Instant::now();
    let deadline = started + request.schedule.timeout;
    let spacing = request.schedule.spacing();
    let mut previous: Option<ReplicationGroupStatus> = None;

    debug!(
        replication_group_id = %handle,
        target = ?request.target,
        timeout_secs = request.schedule.timeout.as_secs(),
        "waiting for replication group"
    );
    sleep(request.schedule.delay).await;

    loop {
        match classify(describe().await, request)? {
            Tick::Resolved(convergence) => {
                info!(
                    replication_group_id = %handle,
                    elapsed_ms = elapsed_ms(started),
                    absent = matches!(convergence, Convergence::Absent),
                    "replication group converged"
                );
                return Ok(convergence);
            }
            Tick::Pending(status) => {
                if previous.is_some_and(|prior| !prior.can_transition_to(status)) {
                    warn!(
                        replication_group_id = %handle,
                        status = %status,
                        previous = ?previous,
                        "unexpected status transition"
                    );
                }
                debug!(replication_group_id = %handle, status = %status, "still pending");
                previous = Some(status);
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(PollError::Timeout {
                waited: now.duration_since(started),
            });
        }
        sleep(spacing.min(deadline.duration_since(now))).await;
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::ready;

    use super::*;
    use crate::test_support::group;
    use rstest::rstest;

    fn creation(timeout: Duration) -> WaitRequest {
        WaitRequest::until(
            ReplicationGroupStatus::Available,
            &[ReplicationGroupStatus::Creating],
            PollSchedule::new(timeout),
        )
    }

    fn deletion() -> WaitRequest {
        WaitRequest::until_absent(
            &[
                ReplicationGroupStatus::Creating,
                ReplicationGroupStatus::Available,
                ReplicationGroupStatus::Deleting,
            ],
            PollSchedule::new(Duration::from_secs(900)),
        )
    }

    #[rstest]
    #[case("creating", Tick::Pending(ReplicationGroupStatus::Creating))]
    #[case("available", Tick::Resolved(Convergence::Reached {
        status: ReplicationGroupStatus::Available,
        group: Box::new(group("cache1", "available")),
    }))]
    fn classify_against_status_target(#[case] status: &str, #[case] expected: Tick) {
        let tick = classify(Ok(group("cache1", status)), &creation(Duration::from_secs(60)))
            .expect("known status");
        assert_eq!(tick, expected);
    }

    #[test]
    fn classify_resolves_to_target_when_status_differs() {
        let tick = classify(
            Ok(group("cache1", "create-failed")),
            &creation(Duration::from_secs(60)),
        )
        .expect("known status");
        assert!(matches!(
            tick,
            Tick::Resolved(Convergence::Reached { status: ReplicationGroupStatus::Available, ref group })
                if group.status == "create-failed"
        ));
    }

    #[test]
    fn classify_resolves_absent_target_to_current_status() {
        let tick = classify(Ok(group("cache1", "modifying")), &deletion()).expect("known status");
        assert!(matches!(
            tick,
            Tick::Resolved(Convergence::Reached {
                status: ReplicationGroupStatus::Modifying,
                ..
            })
        ));
    }

    #[test]
    fn not_found_resolves_to_absent_for_any_target() {
        for request in [creation(Duration::from_secs(60)), deletion()] {
            let tick = classify(Err(ApiError::not_found("cache1")), &request).expect("not an error");
            assert_eq!(tick, Tick::Resolved(Convergence::Absent));
        }
    }

    #[test]
    fn other_failures_abort_the_wait() {
        let failure = ApiError::Transport {
            message: String::from("connection reset"),
        };
        assert_eq!(
            classify(Err(failure.clone()), &deletion()),
            Err(PollError::Api(failure))
        );
        assert!(matches!(
            classify(Ok(group("cache1", "rebooting")), &deletion()),
            Err(PollError::UnrecognisedStatus(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_returns_once_status_leaves_pending() {
        let mut script: VecDeque<_> = ["creating", "creating", "available"]
            .into_iter()
            .map(|status| Ok(group("cache1", status)))
            .collect();
        let started = Instant::now();

        let outcome = wait_for(
            &ResourceHandle::from("cache1"),
            &creation(Duration::from_secs(3600)),
            || ready(script.pop_front().unwrap_or_else(|| Err(ApiError::not_found("cache1")))),
        )
        .await
        .expect("wait succeeds");

        assert!(matches!(
            outcome,
            Convergence::Reached {
                status: ReplicationGroupStatus::Available,
                ..
            }
        ));
        assert!(script.is_empty());
        let elapsed = started.elapsed();
        assert!(
            elapsed >= Duration::from_secs(40) && elapsed < Duration::from_secs(41),
            "unexpected elapsed time {elapsed:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn wait_times_out_while_pending() {
        let mut calls = 0_u32;

        let err = wait_for(
            &ResourceHandle::from("cache1"),
            &creation(Duration::from_secs(60)),
            || {
                calls += 1;
                ready(Ok(group("cache1", "creating")))
            },
        )
        .await
        .expect_err("wait must time out");

        assert!(matches!(err, PollError::Timeout { waited } if waited >= Duration::from_secs(60)));
        assert_eq!(calls, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_never_drops_below_minimum() {
        let mut calls = 0_u32;
        let schedule = PollSchedule::new(Duration::from_secs(20))
            .with_delay(Duration::ZERO)
            .with_intervals(Duration::from_secs(1), Duration::from_secs(5));
        let request = WaitRequest::until(
            ReplicationGroupStatus::Available,
            &[ReplicationGroupStatus::Creating],
            schedule,
        );

        let err = wait_for(&ResourceHandle::from("cache1"), &request, || {
            calls += 1;
            ready(Ok(group("cache1", "creating")))
        })
        .await
        .expect_err("wait must time out");

        assert!(matches!(err, PollError::Timeout { .. }));
        assert_eq!(calls, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn disappearance_ends_the_wait() {
        let mut script: VecDeque<_> = VecDeque::from([
            Ok(group("cache1", "deleting")),
            Err(ApiError::not_found("cache1")),
        ]);

        let outcome = wait_for(&ResourceHandle::from("cache1"), &deletion(), || {
            ready(script.pop_front().unwrap_or_else(|| Err(ApiError::not_found("cache1"))))
        })
        .await
        .expect("wait succeeds");

        assert_eq!(outcome, Convergence::Absent);
    }
}
