//! BDD step definitions for lifecycle behaviour.

use std::time::Duration;

use rgctl::test_support::ApiCall;
use rgctl::{ApiError, ManagedResource, ModifyReplicationGroupRequest, ReplicationGroupSpec, ResourceHandle};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::{
    LifecycleContext, Outcome, failure_kind, fast_timeouts, parse_statuses, scripted_group,
};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("runtime setup failed: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn valid_spec(id: &str) -> ReplicationGroupSpec {
    ReplicationGroupSpec::builder(id, "behaviour test group")
        .node_type("cache.m5.large")
        .num_cache_clusters(2)
        .build()
        .unwrap_or_else(|err| panic!("spec for {id} should be valid: {err}"))
}

#[given("a replication group spec \"{id}\"")]
fn replication_group_spec(mut lifecycle_context: LifecycleContext, id: String) -> LifecycleContext {
    let mut spec = valid_spec("cache1");
    spec.replication_group_id = id;
    lifecycle_context.spec = Some(spec);
    lifecycle_context
}

#[given("a managed replication group \"{id}\"")]
fn managed_group(mut lifecycle_context: LifecycleContext, id: String) -> LifecycleContext {
    lifecycle_context.spec = Some(valid_spec(&id));
    lifecycle_context.resource = ManagedResource::resume(ResourceHandle::new(id));
    lifecycle_context
}

#[given("describe reports \"{statuses}\" before settling on \"{settled}\"")]
fn describe_settles(
    lifecycle_context: LifecycleContext,
    statuses: String,
    settled: String,
) -> LifecycleContext {
    let id = lifecycle_context.group_id();
    for status in parse_statuses(&statuses) {
        lifecycle_context
            .api
            .push_describe(Ok(scripted_group(&id, &status)));
    }
    lifecycle_context
        .api
        .set_describe_fallback(Ok(scripted_group(&id, settled.trim())));
    lifecycle_context
}

#[given("describe reports \"{statuses}\" before the group disappears")]
fn describe_disappears(lifecycle_context: LifecycleContext, statuses: String) -> LifecycleContext {
    let id = lifecycle_context.group_id();
    for status in parse_statuses(&statuses) {
        lifecycle_context
            .api
            .push_describe(Ok(scripted_group(&id, &status)));
    }
    lifecycle_context
}

#[given("the create timeout is short")]
fn short_create_timeout(mut lifecycle_context: LifecycleContext) -> LifecycleContext {
    lifecycle_context.timeouts.create = fast_timeouts(Duration::from_millis(100)).create;
    lifecycle_context
}

#[given("delete reports not found")]
fn delete_not_found(lifecycle_context: LifecycleContext) -> LifecycleContext {
    let id = lifecycle_context.group_id();
    lifecycle_context
        .api
        .push_delete(Err(ApiError::not_found(&id)));
    lifecycle_context
}

fn required_spec(lifecycle_context: &LifecycleContext) -> Result<ReplicationGroupSpec, StepError> {
    lifecycle_context
        .spec
        .clone()
        .ok_or_else(|| StepError::Assertion(String::from("scenario did not define a spec")))
}

#[when("I create the replication group")]
fn create_group(mut lifecycle_context: LifecycleContext) -> Result<LifecycleContext, StepError> {
    let runtime = Runtime::new()?;
    let spec = required_spec(&lifecycle_context)?;
    let controller = lifecycle_context.controller();
    let result = runtime.block_on(controller.create(&mut lifecycle_context.resource, &spec));
    Ok(lifecycle_context.record(result))
}

#[when("I read the replication group")]
fn read_group(mut lifecycle_context: LifecycleContext) -> Result<LifecycleContext, StepError> {
    let runtime = Runtime::new()?;
    let controller = lifecycle_context.controller();
    let result = runtime.block_on(controller.read(&mut lifecycle_context.resource));
    Ok(lifecycle_context.record(result))
}

#[when("I delete the replication group")]
fn delete_group(mut lifecycle_context: LifecycleContext) -> Result<LifecycleContext, StepError> {
    let runtime = Runtime::new()?;
    let controller = lifecycle_context.controller();
    let result = runtime.block_on(controller.delete(&mut lifecycle_context.resource));
    Ok(lifecycle_context.record(result))
}

fn update_with(
    mut lifecycle_context: LifecycleContext,
    change: impl FnOnce(&mut ReplicationGroupSpec),
) -> Result<LifecycleContext, StepError> {
    let runtime = Runtime::new()?;
    let prior = required_spec(&lifecycle_context)?;
    let mut desired = prior.clone();
    change(&mut desired);
    let controller = lifecycle_context.controller();
    let result = runtime.block_on(controller.update(
        &mut lifecycle_context.resource,
        &prior,
        &desired,
    ));
    Ok(lifecycle_context.record(result))
}

#[when("I enable automatic failover")]
fn enable_failover(lifecycle_context: LifecycleContext) -> Result<LifecycleContext, StepError> {
    update_with(lifecycle_context, |spec| spec.automatic_failover = true)
}

#[when("I change the node type")]
fn change_node_type(lifecycle_context: LifecycleContext) -> Result<LifecycleContext, StepError> {
    update_with(lifecycle_context, |spec| {
        spec.node_type = Some(String::from("cache.r6g.large"));
    })
}

#[then("the operation succeeds")]
fn operation_succeeds(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    match lifecycle_context.outcome {
        Some(Outcome::Success) => Ok(()),
        Some(Outcome::Failure(ref err)) => Err(StepError::Assertion(format!(
            "expected success, got failure: {err}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("the operation fails with \"{kind}\"")]
fn operation_fails(lifecycle_context: &LifecycleContext, kind: String) -> Result<(), StepError> {
    let Some(Outcome::Failure(err)) = &lifecycle_context.outcome else {
        return Err(StepError::Assertion(String::from(
            "expected failure outcome",
        )));
    };
    let actual = failure_kind(err);
    if actual == kind.trim() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected failure kind {kind}, got {actual}: {err}"
        )))
    }
}

#[then("the resource tracks handle \"{id}\"")]
fn resource_tracks(lifecycle_context: &LifecycleContext, id: String) -> Result<(), StepError> {
    match lifecycle_context.resource.handle() {
        Some(handle) if handle.as_str() == id => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected handle {id}, got {other:?}"
        ))),
    }
}

#[then("the resource phase is \"{phase}\"")]
fn resource_phase(lifecycle_context: &LifecycleContext, phase: String) -> Result<(), StepError> {
    let actual = format!("{:?}", lifecycle_context.resource.phase()).to_lowercase();
    if actual == phase {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected phase {phase}, got {actual}"
        )))
    }
}

#[then("the observed member count is {count}")]
fn observed_member_count(
    lifecycle_context: &LifecycleContext,
    count: usize,
) -> Result<(), StepError> {
    let observed = lifecycle_context
        .resource
        .observed()
        .ok_or_else(|| StepError::Assertion(String::from("no observed state")))?;
    if observed.num_cache_clusters == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} member clusters, got {}",
            observed.num_cache_clusters
        )))
    }
}

#[then("the resource is unmanaged")]
fn resource_unmanaged(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    if lifecycle_context.resource == ManagedResource::new() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected unmanaged resource, got {:?}",
            lifecycle_context.resource
        )))
    }
}

#[then("describe was called {count} times")]
fn describe_called(lifecycle_context: &LifecycleContext, count: usize) -> Result<(), StepError> {
    let actual = lifecycle_context.api.describe_count();
    if actual == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} describe calls, got {actual}"
        )))
    }
}

#[then("no API call was made")]
fn no_api_calls(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    let calls = lifecycle_context.api.calls();
    if calls.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("unexpected calls: {calls:?}")))
    }
}

#[then("the modify request only enables automatic failover")]
fn modify_only_failover(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    let mut expected = ModifyReplicationGroupRequest::new(lifecycle_context.group_id());
    expected.automatic_failover_enabled = Some(true);
    let requests = lifecycle_context.api.modify_requests();
    if requests == vec![expected] {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "unexpected modify requests: {requests:?}"
        )))
    }
}

#[then("no modify request was sent")]
fn no_modify_request(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    let modified = lifecycle_context
        .api
        .calls()
        .into_iter()
        .any(|call| matches!(call, ApiCall::Modify(_)));
    if modified {
        Err(StepError::Assertion(String::from(
            "a modify request was sent",
        )))
    } else {
        Ok(())
    }
}
