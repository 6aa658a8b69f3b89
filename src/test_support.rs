//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeMap, VecDeque};
use std::env;
use std::ffi::OsString;
use std::sync::{Arc, PoisonError};

use tokio::sync::{Mutex, MutexGuard};

use crate::client::{
    ApiError, ApiFuture, CreateReplicationGroupRequest, Endpoint, ModifyReplicationGroupRequest,
    NodeGroup, ReplicationGroup, ReplicationGroupApi,
};

/// Records a single call made through [`ScriptedApi`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ApiCall {
    /// Create request as submitted.
    Create(CreateReplicationGroupRequest),
    /// Describe of the given identifier.
    Describe(String),
    /// Modify request as submitted.
    Modify(ModifyReplicationGroupRequest),
    /// Delete of the given identifier.
    Delete(String),
}

type GroupResult = Result<ReplicationGroup, ApiError>;

#[derive(Debug, Default)]
struct Script {
    create: VecDeque<GroupResult>,
    describe: VecDeque<GroupResult>,
    describe_fallback: Option<GroupResult>,
    modify: VecDeque<GroupResult>,
    delete: VecDeque<Result<(), ApiError>>,
    calls: Vec<ApiCall>,
}

/// In-memory control plane that replays scripted responses in FIFO order.
///
/// Unscripted creates echo a `creating` group and unscripted modifies echo a
/// `modifying` group. Describe falls back to a configurable response once its
/// queue is drained, and to not-found when none is set. Unscripted deletes
/// succeed.
#[derive(Clone, Debug, Default)]
pub struct ScriptedApi {
    script: Arc<std::sync::Mutex<Script>>,
}

impl ScriptedApi {
    /// Creates an API with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_script<T>(&self, apply: impl FnOnce(&mut Script) -> T) -> T {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut script)
    }

    /// Queues the next create response.
    pub fn push_create(&self, result: GroupResult) {
        self.with_script(|script| script.create.push_back(result));
    }

    /// Queues the next describe response.
    pub fn push_describe(&self, result: GroupResult) {
        self.with_script(|script| script.describe.push_back(result));
    }

    /// Queues one describe response per status for group `id`.
    pub fn push_statuses(&self, id: &str, statuses: &[&str]) {
        for status in statuses {
            self.push_describe(Ok(group(id, status)));
        }
    }

    /// Sets the describe response returned once the queue is empty.
    pub fn set_describe_fallback(&self, result: GroupResult) {
        self.with_script(|script| script.describe_fallback = Some(result));
    }

    /// Queues the next modify response.
    pub fn push_modify(&self, result: GroupResult) {
        self.with_script(|script| script.modify.push_back(result));
    }

    /// Queues the next delete response.
    pub fn push_delete(&self, result: Result<(), ApiError>) {
        self.with_script(|script| script.delete.push_back(result));
    }

    /// Returns a snapshot of every call recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.with_script(|script| script.calls.clone())
    }

    /// Number of describe calls recorded so far.
    #[must_use]
    pub fn describe_count(&self) -> usize {
        self.with_script(|script| {
            script
                .calls
                .iter()
                .filter(|call| matches!(call, ApiCall::Describe(_)))
                .count()
        })
    }

    /// Modify requests recorded so far.
    #[must_use]
    pub fn modify_requests(&self) -> Vec<ModifyReplicationGroupRequest> {
        self.with_script(|script| {
            script
                .calls
                .iter()
                .filter_map(|call| match call {
                    ApiCall::Modify(request) => Some(request.clone()),
                    _ => None,
                })
                .collect()
        })
    }
}

impl ReplicationGroupApi for ScriptedApi {
    fn create_replication_group<'a>(
        &'a self,
        request: &'a CreateReplicationGroupRequest,
    ) -> ApiFuture<'a, ReplicationGroup> {
        let result = self.with_script(|script| {
            script.calls.push(ApiCall::Create(request.clone()));
            script
                .create
                .pop_front()
                .unwrap_or_else(|| Ok(group(&request.replication_group_id, "creating")))
        });
        Box::pin(async move { result })
    }

    fn describe_replication_group<'a>(
        &'a self,
        replication_group_id: &'a str,
    ) -> ApiFuture<'a, ReplicationGroup> {
        let result = self.with_script(|script| {
            script
                .calls
                .push(ApiCall::Describe(replication_group_id.to_owned()));
            script
                .describe
                .pop_front()
                .or_else(|| script.describe_fallback.clone())
                .unwrap_or_else(|| Err(ApiError::not_found(replication_group_id)))
        });
        Box::pin(async move { result })
    }

    fn modify_replication_group<'a>(
        &'a self,
        request: &'a ModifyReplicationGroupRequest,
    ) -> ApiFuture<'a, ReplicationGroup> {
        let result = self.with_script(|script| {
            script.calls.push(ApiCall::Modify(request.clone()));
            script
                .modify
                .pop_front()
                .unwrap_or_else(|| Ok(group(&request.replication_group_id, "modifying")))
        });
        Box::pin(async move { result })
    }

    fn delete_replication_group<'a>(&'a self, replication_group_id: &'a str) -> ApiFuture<'a, ()> {
        let result = self.with_script(|script| {
            script
                .calls
                .push(ApiCall::Delete(replication_group_id.to_owned()));
            script.delete.pop_front().unwrap_or(Ok(()))
        });
        Box::pin(async move { result })
    }
}

/// Builds a bare group with the given status.
#[must_use]
pub fn group(id: &str, status: &str) -> ReplicationGroup {
    ReplicationGroup {
        replication_group_id: id.to_owned(),
        status: status.to_owned(),
        ..ReplicationGroup::default()
    }
}

/// Builds an available group with the given members and a primary endpoint.
#[must_use]
pub fn available_group(id: &str, members: &[&str]) -> ReplicationGroup {
    ReplicationGroup {
        description: Some(String::from("test group")),
        automatic_failover: Some(String::from("disabled")),
        member_clusters: members.iter().map(|member| (*member).to_owned()).collect(),
        node_groups: vec![NodeGroup {
            node_group_id: String::from("0001"),
            status: Some(String::from("available")),
            primary_endpoint: Some(Endpoint {
                address: format!("{id}.primary.cache.internal"),
                port: 6379,
            }),
            endpoint: None,
        }],
        ..group(id, "available")
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::const_new(());

const CONFIG_ENV_PREFIX: &str = "RGCTL_";

/// Holds [`ENV_LOCK`] with every `RGCTL_*` variable cleared except the ones
/// passed to [`EnvGuard::set_vars`]. The original environment is restored
/// on drop.
pub struct EnvGuard {
    previous: BTreeMap<OsString, Option<OsString>>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Isolates the controller's environment namespace and applies `pairs`.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        let guard = ENV_LOCK.lock().await;
        let mut previous: BTreeMap<OsString, Option<OsString>> = env::vars_os()
            .filter(|(key, _)| key.to_string_lossy().starts_with(CONFIG_ENV_PREFIX))
            .map(|(key, value)| (key, Some(value)))
            .collect();
        for key in previous.keys() {
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`.
            unsafe { env::remove_var(key) };
        }
        for (key, value) in pairs {
            previous
                .entry(OsString::from(*key))
                .or_insert_with(|| env::var_os(key));
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`.
            unsafe { env::set_var(key, value) };
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
