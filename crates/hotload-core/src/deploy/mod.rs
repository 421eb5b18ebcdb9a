//! Deployment orchestration.
//!
//! A [`Deployer`] runs one linear pipeline per call:
//!
//! - module: transfer, then load into the code table
//! - package: transfer, expand, read manifest, plan, then register code
//!   paths, load configuration and start applications
//!
//! The first failing stage ends the pipeline and its error is returned as-is.

pub mod report;

use std::path::Path;
use std::sync::Arc;

use crate::activate::{ApplicationActivator, ModuleActivator};
use crate::archive::{ArchiveExpander, LocalExpander};
use crate::config::DeployConfig;
use crate::error::DeployError;
use crate::release::{ReleaseManifest, plan_release};
use crate::runtime::{Runtime, TimedRuntime};
use crate::transfer::{ArtifactTransfer, StagingTransfer};
use crate::types::{ModuleId, Target};

pub use report::DeployReport;

pub struct Deployer {
    local: Target,
    transfer: Box<dyn ArtifactTransfer>,
    expander: Box<dyn ArchiveExpander>,
    modules: ModuleActivator,
    applications: ApplicationActivator,
}

impl Deployer {
    /// Build a deployer from configuration, staging through the shared
    /// filesystem and expanding packages in place.
    ///
    /// The configuration is validated first. When `call_timeout_ms` is set
    /// every remote call is bounded by it.
    pub fn from_config(
        config: &DeployConfig,
        runtime: Arc<dyn Runtime>,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        let runtime: Arc<dyn Runtime> = match config.call_timeout() {
            Some(timeout) => Arc::new(TimedRuntime::new(runtime, timeout)),
            None => runtime,
        };

        Ok(Self {
            local: config.local_target(),
            transfer: Box::new(StagingTransfer::from_config(config)),
            expander: Box::new(LocalExpander::new()),
            modules: ModuleActivator::new(runtime.clone(), config.strip_module_extension),
            applications: ApplicationActivator::new(runtime, config.code_dir_name.clone()),
        })
    }

    pub fn with_transfer(mut self, transfer: impl ArtifactTransfer + 'static) -> Self {
        self.transfer = Box::new(transfer);
        self
    }

    pub fn with_expander(mut self, expander: impl ArchiveExpander + 'static) -> Self {
        self.expander = Box::new(expander);
        self
    }

    /// Target used by the forms that take no explicit target.
    pub fn local_target(&self) -> &Target {
        &self.local
    }

    pub fn deploy_module(&self, path: &Path) -> Result<ModuleId, DeployError> {
        self.deploy_module_to(&self.local, path)
    }

    /// Transfer a single module image and load it on `target`.
    pub fn deploy_module_to(&self, target: &Target, path: &Path) -> Result<ModuleId, DeployError> {
        let span = tracing::info_span!("deploy_module", node = %target, path = %path.display());
        let _enter = span.enter();

        let staged = self.transfer.transfer(target, path)?;
        let module = self.modules.activate(target, &staged.destination)?;

        tracing::info!(module = %module, digest = %staged.digest, "module deployed");
        Ok(module)
    }

    pub fn deploy_apps(
        &self,
        path: &Path,
        applications: &[String],
    ) -> Result<DeployReport, DeployError> {
        self.deploy_apps_to(&self.local, path, applications)
    }

    /// Deploy a package and start only `applications`, in the given order.
    pub fn deploy_apps_to(
        &self,
        target: &Target,
        path: &Path,
        applications: &[String],
    ) -> Result<DeployReport, DeployError> {
        let span = tracing::info_span!("deploy_apps", node = %target, path = %path.display());
        let _enter = span.enter();
        self.deploy_package(target, path, Some(applications))
    }

    pub fn deploy_release(&self, path: &Path) -> Result<DeployReport, DeployError> {
        self.deploy_release_to(&self.local, path)
    }

    /// Deploy a package and start every application it declares.
    pub fn deploy_release_to(
        &self,
        target: &Target,
        path: &Path,
    ) -> Result<DeployReport, DeployError> {
        let span = tracing::info_span!("deploy_release", node = %target, path = %path.display());
        let _enter = span.enter();
        self.deploy_package(target, path, None)
    }

    fn deploy_package(
        &self,
        target: &Target,
        path: &Path,
        requested: Option<&[String]>,
    ) -> Result<DeployReport, DeployError> {
        tracing::info!("deployment started");

        let staged = self.transfer.transfer(target, path)?;
        let package_root = self.expander.expand(target, &staged.destination)?;
        let manifest = ReleaseManifest::load(&package_root)?;
        let plan = plan_release(&manifest, requested)?;

        let (code_paths, started) = self
            .applications
            .activate(target, &package_root, &manifest, &plan)?;

        let report = DeployReport::new(
            target.clone(),
            &manifest,
            package_root,
            code_paths,
            started,
            staged.digest,
        );
        tracing::info!(
            release = %report.release,
            version = %report.version,
            started = report.started.len(),
            "deployment finished"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for Deployer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deployer")
            .field("local", &self.local)
            .field("modules", &self.modules)
            .field("applications", &self.applications)
            .finish_non_exhaustive()
    }
}
