//! In-memory simulated target runtime.
//!
//! Records every call it receives and keeps a per-node picture of what was
//! loaded, registered and started. Failures can be injected per operation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use super::{RemoteCall, RemoteError, RemoteReply, Runtime};
use crate::types::{ModuleId, Target};

#[derive(Debug, Default)]
struct NodeState {
    code_paths: Vec<PathBuf>,
    config: serde_json::Map<String, serde_json::Value>,
    modules: Vec<ModuleId>,
    started: Vec<String>,
}

#[derive(Debug, Default)]
struct Failures {
    unreachable: HashSet<String>,
    modules: HashMap<String, String>,
    applications: HashMap<String, String>,
    code_paths: Option<String>,
    config: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    calls: Vec<(Target, RemoteCall)>,
    nodes: BTreeMap<String, NodeState>,
    failures: Failures,
}

/// A runtime that lives entirely in this process.
#[derive(Debug, Default)]
pub struct InMemoryRuntime {
    inner: Mutex<Inner>,
}

impl InMemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // State stays consistent even if a holder panicked mid-call.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every call to `node` fail as unreachable.
    pub fn set_unreachable(&self, node: &str) {
        self.lock().failures.unreachable.insert(node.to_string());
    }

    /// Reject loads of the module whose file name is `module`.
    pub fn fail_module(&self, module: &str, reason: &str) {
        self.lock()
            .failures
            .modules
            .insert(module.to_string(), reason.to_string());
    }

    /// Reject starting `application`.
    pub fn fail_application(&self, application: &str, reason: &str) {
        self.lock()
            .failures
            .applications
            .insert(application.to_string(), reason.to_string());
    }

    pub fn fail_code_paths(&self, reason: &str) {
        self.lock().failures.code_paths = Some(reason.to_string());
    }

    pub fn fail_config(&self, reason: &str) {
        self.lock().failures.config = Some(reason.to_string());
    }

    /// Drop every injected failure. Recorded calls and node state are kept.
    pub fn clear_failures(&self) {
        self.lock().failures = Failures::default();
    }

    /// Every call received, in order, including rejected ones.
    pub fn calls(&self) -> Vec<(Target, RemoteCall)> {
        self.lock().calls.clone()
    }

    /// Names of the applications that received a start call, in call order.
    pub fn start_calls(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|(_, call)| match call {
                RemoteCall::StartApplication { name } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn started(&self, node: &str) -> Vec<String> {
        self.lock()
            .nodes
            .get(node)
            .map(|state| state.started.clone())
            .unwrap_or_default()
    }

    pub fn code_paths(&self, node: &str) -> Vec<PathBuf> {
        self.lock()
            .nodes
            .get(node)
            .map(|state| state.code_paths.clone())
            .unwrap_or_default()
    }

    pub fn loaded_modules(&self, node: &str) -> Vec<ModuleId> {
        self.lock()
            .nodes
            .get(node)
            .map(|state| state.modules.clone())
            .unwrap_or_default()
    }

    /// Active configuration of `node`, keyed by application.
    pub fn config(&self, node: &str) -> serde_json::Value {
        self.lock()
            .nodes
            .get(node)
            .map(|state| serde_json::Value::Object(state.config.clone()))
            .unwrap_or(serde_json::Value::Null)
    }
}

impl Runtime for InMemoryRuntime {
    fn invoke(&self, target: &Target, call: RemoteCall) -> Result<RemoteReply, RemoteError> {
        let mut inner = self.lock();
        inner.calls.push((target.clone(), call.clone()));

        if inner.failures.unreachable.contains(target.node()) {
            return Err(RemoteError::Unreachable {
                node: target.node().to_string(),
            });
        }

        match call {
            RemoteCall::LoadModule { path } => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| RemoteError::rejected("badfile"))?;
                if let Some(reason) = inner.failures.modules.get(&name) {
                    return Err(RemoteError::rejected(reason.clone()));
                }
                let module = ModuleId::new(name);
                let state = inner.nodes.entry(target.node().to_string()).or_default();
                state.modules.retain(|m| m != &module);
                state.modules.push(module.clone());
                Ok(RemoteReply::Module(module))
            }
            RemoteCall::AddCodePaths { paths } => {
                if let Some(reason) = &inner.failures.code_paths {
                    return Err(RemoteError::rejected(reason.clone()));
                }
                let state = inner.nodes.entry(target.node().to_string()).or_default();
                for path in paths {
                    if !state.code_paths.contains(&path) {
                        state.code_paths.push(path);
                    }
                }
                Ok(RemoteReply::Ok)
            }
            RemoteCall::LoadConfig { config } => {
                if let Some(reason) = &inner.failures.config {
                    return Err(RemoteError::rejected(reason.clone()));
                }
                let serde_json::Value::Object(entries) = config else {
                    return Err(RemoteError::rejected("configuration must be an object"));
                };
                let state = inner.nodes.entry(target.node().to_string()).or_default();
                state.config.extend(entries);
                Ok(RemoteReply::Ok)
            }
            RemoteCall::StartApplication { name } => {
                if let Some(reason) = inner.failures.applications.get(&name) {
                    return Err(RemoteError::rejected(reason.clone()));
                }
                let state = inner.nodes.entry(target.node().to_string()).or_default();
                if !state.started.contains(&name) {
                    state.started.push(name);
                }
                Ok(RemoteReply::Ok)
            }
        }
    }
}
