//! Remote runtime primitive
//!
//! The deploy pipeline talks to a target only through [`Runtime::invoke`].
//! How a call travels to the target is the implementation's business; the
//! pipeline assumes the call blocks until the target replies or is known to
//! be unreachable.

pub mod memory;
pub mod timeout;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use crate::error::RemoteError;
use crate::types::{ModuleId, Target};

pub use memory::InMemoryRuntime;
pub use timeout::TimedRuntime;

/// Operation requested from a target runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RemoteCall {
    /// Load a module image into the active code table.
    LoadModule { path: PathBuf },
    /// Append directories to the code path. Existing entries are kept.
    AddCodePaths { paths: Vec<PathBuf> },
    /// Apply runtime configuration, keyed by application name.
    LoadConfig { config: serde_json::Value },
    /// Start an application and its dependencies.
    StartApplication { name: String },
}

impl RemoteCall {
    pub fn operation(&self) -> &'static str {
        match self {
            RemoteCall::LoadModule { .. } => "load_module",
            RemoteCall::AddCodePaths { .. } => "add_code_paths",
            RemoteCall::LoadConfig { .. } => "load_config",
            RemoteCall::StartApplication { .. } => "start_application",
        }
    }
}

/// Successful reply to a [`RemoteCall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reply", content = "value", rename_all = "snake_case")]
pub enum RemoteReply {
    Ok,
    Module(ModuleId),
}

/// Synchronous call into a target runtime.
pub trait Runtime: Send + Sync {
    fn invoke(&self, target: &Target, call: RemoteCall) -> Result<RemoteReply, RemoteError>;
}

impl<R: Runtime + ?Sized> Runtime for std::sync::Arc<R> {
    fn invoke(&self, target: &Target, call: RemoteCall) -> Result<RemoteReply, RemoteError> {
        (**self).invoke(target, call)
    }
}

impl<R: Runtime + ?Sized> Runtime for &R {
    fn invoke(&self, target: &Target, call: RemoteCall) -> Result<RemoteReply, RemoteError> {
        (**self).invoke(target, call)
    }
}

/// Issue a call and log it. Every stage goes through here.
pub(crate) fn call(
    runtime: &dyn Runtime,
    target: &Target,
    call: RemoteCall,
) -> Result<RemoteReply, RemoteError> {
    let operation = call.operation();
    tracing::debug!(node = %target, operation, "invoking remote call");
    let result = runtime.invoke(target, call);
    if let Err(ref error) = result {
        tracing::debug!(node = %target, operation, error = %error, "remote call failed");
    }
    result
}
