//! Shared fixtures and helpers for lifecycle BDD scenarios.

use std::time::Duration;

use rgctl::test_support::{ScriptedApi, available_group, group};
use rgctl::{
    ControllerError, ControllerTimeouts, ManagedResource, PollSchedule, ReplicationGroupController,
    ReplicationGroupSpec,
};
use rstest::fixture;

#[derive(Clone, Debug)]
pub enum Outcome {
    Success,
    Failure(ControllerError),
}

#[derive(Clone, Debug)]
pub struct LifecycleContext {
    pub api: ScriptedApi,
    pub spec: Option<ReplicationGroupSpec>,
    pub resource: ManagedResource,
    pub timeouts: ControllerTimeouts,
    pub outcome: Option<Outcome>,
}

impl LifecycleContext {
    pub fn controller(&self) -> ReplicationGroupController<ScriptedApi> {
        ReplicationGroupController::new(self.api.clone()).with_timeouts(self.timeouts)
    }

    pub fn group_id(&self) -> String {
        self.resource.handle().map_or_else(
            || {
                self.spec
                    .as_ref()
                    .map(|spec| spec.replication_group_id.clone())
                    .unwrap_or_default()
            },
            ToString::to_string,
        )
    }

    pub fn record(mut self, result: Result<(), ControllerError>) -> Self {
        self.outcome = Some(match result {
            Ok(()) => Outcome::Success,
            Err(err) => Outcome::Failure(err),
        });
        self
    }
}

#[fixture]
pub fn lifecycle_context() -> LifecycleContext {
    LifecycleContext {
        api: ScriptedApi::new(),
        spec: None,
        resource: ManagedResource::new(),
        timeouts: fast_timeouts(Duration::from_secs(5)),
        outcome: None,
    }
}

pub fn fast_timeouts(timeout: Duration) -> ControllerTimeouts {
    let schedule = PollSchedule::new(timeout)
        .with_delay(Duration::ZERO)
        .with_intervals(Duration::from_millis(10), Duration::from_millis(5));
    ControllerTimeouts {
        create: schedule,
        update: schedule,
        delete: schedule,
    }
}

pub fn parse_statuses(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|status| !status.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn scripted_group(id: &str, status: &str) -> rgctl::ReplicationGroup {
    if status == "available" {
        let first = format!("{id}-001");
        let second = format!("{id}-002");
        available_group(id, &[first.as_str(), second.as_str()])
    } else {
        group(id, status)
    }
}

pub fn failure_kind(err: &ControllerError) -> &'static str {
    match err {
        ControllerError::Config(_) => "config",
        ControllerError::Schema(_) => "schema",
        ControllerError::NotManaged { .. } => "not managed",
        ControllerError::AlreadyManaged { .. } => "already managed",
        ControllerError::Api { .. } => "api",
        ControllerError::Timeout { .. } => "timeout",
        ControllerError::Vanished { .. } => "vanished",
        ControllerError::UnexpectedStatus { .. } => "unexpected status",
    }
}
