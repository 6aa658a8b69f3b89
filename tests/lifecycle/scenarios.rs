//! BDD scenarios for the replication group lifecycle.

use rstest_bdd_macros::scenario;

use super::test_helpers::{LifecycleContext, lifecycle_context};

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Create waits until the group is available"
)]
fn scenario_create_available(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Create timeout keeps the handle"
)]
fn scenario_create_timeout(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Create rejects an invalid identifier"
)]
fn scenario_create_invalid(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Deleting a missing group succeeds"
)]
fn scenario_delete_missing(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Delete waits until the group is gone"
)]
fn scenario_delete_waits(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Update sends only the changed failover flag"
)]
fn scenario_update_failover(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Update never sends replacement-only changes"
)]
fn scenario_update_force_new(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Reading a missing group releases it"
)]
fn scenario_read_missing(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}
