//! Registering a package's code and starting its applications.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::DeployError;
use crate::release::{LoadPlan, ReleaseManifest};
use crate::runtime::{self, RemoteCall, Runtime};
use crate::types::Target;

/// Find every directory named `dir_name` below `root`, sorted by path.
pub fn discover_code_dirs(root: &Path, dir_name: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    walk(root, dir_name, &mut found)?;
    found.sort();
    Ok(found)
}

fn walk(dir: &Path, dir_name: &str, found: &mut Vec<PathBuf>) -> std::io::Result<()> {
    let mut entries = std::fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        // Symlinks are not followed.
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let path = entry.path();
        if entry.file_name() == dir_name {
            found.push(path.clone());
        }
        walk(&path, dir_name, found)?;
    }
    Ok(())
}

/// Makes an expanded package live: code paths, configuration, then
/// applications in plan order.
///
/// Each step waits for the previous one. There is no rollback: when an
/// application fails to start, the ones before it stay running and the error
/// lists them.
pub struct ApplicationActivator {
    runtime: Arc<dyn Runtime>,
    code_dir_name: String,
}

impl ApplicationActivator {
    pub fn new(runtime: Arc<dyn Runtime>, code_dir_name: impl Into<String>) -> Self {
        Self {
            runtime,
            code_dir_name: code_dir_name.into(),
        }
    }

    /// Register code paths under `root`. Returns the paths registered.
    pub fn register_code_paths(
        &self,
        target: &Target,
        root: &Path,
    ) -> Result<Vec<PathBuf>, DeployError> {
        let paths = discover_code_dirs(root, &self.code_dir_name).map_err(|source| {
            DeployError::CodePathDiscovery {
                target: target.clone(),
                root: root.to_path_buf(),
                source,
            }
        })?;

        if paths.is_empty() {
            tracing::debug!(node = %target, path = %root.display(), "no code directories found");
            return Ok(paths);
        }

        runtime::call(
            self.runtime.as_ref(),
            target,
            RemoteCall::AddCodePaths {
                paths: paths.clone(),
            },
        )
        .map_err(|source| DeployError::PathRegistration {
            target: target.clone(),
            source,
        })?;

        Ok(paths)
    }

    pub fn load_config(
        &self,
        target: &Target,
        manifest: &ReleaseManifest,
    ) -> Result<(), DeployError> {
        runtime::call(
            self.runtime.as_ref(),
            target,
            RemoteCall::LoadConfig {
                config: manifest.runtime_config(),
            },
        )
        .map_err(|source| DeployError::ConfigLoad {
            target: target.clone(),
            source,
        })?;
        Ok(())
    }

    /// Start each planned application in order, stopping at the first failure.
    pub fn start_applications(
        &self,
        target: &Target,
        plan: &LoadPlan,
    ) -> Result<Vec<String>, DeployError> {
        let mut started = Vec::with_capacity(plan.len());
        for application in plan.iter() {
            let call = RemoteCall::StartApplication {
                name: application.to_string(),
            };
            if let Err(source) = runtime::call(self.runtime.as_ref(), target, call) {
                tracing::warn!(
                    node = %target,
                    application,
                    started = started.len(),
                    error = %source,
                    "application failed to start; earlier applications stay running"
                );
                return Err(DeployError::ApplicationStart {
                    target: target.clone(),
                    application: application.to_string(),
                    started,
                    source,
                });
            }
            tracing::debug!(node = %target, application, "application started");
            started.push(application.to_string());
        }
        Ok(started)
    }

    /// Run all three steps. Returns the registered code paths and the
    /// started applications.
    pub fn activate(
        &self,
        target: &Target,
        root: &Path,
        manifest: &ReleaseManifest,
        plan: &LoadPlan,
    ) -> Result<(Vec<PathBuf>, Vec<String>), DeployError> {
        let code_paths = self.register_code_paths(target, root)?;
        self.load_config(target, manifest)?;
        let started = self.start_applications(target, plan)?;
        Ok((code_paths, started))
    }
}

impl std::fmt::Debug for ApplicationActivator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationActivator")
            .field("code_dir_name", &self.code_dir_name)
            .finish_non_exhaustive()
    }
}
