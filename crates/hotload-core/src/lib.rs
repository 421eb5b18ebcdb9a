//! Hotload Core Library
//!
//! Deploys compiled modules and packaged releases onto a running runtime
//! and activates them without restarting it.

pub mod activate;
pub mod archive;
pub mod artifact;
pub mod config;
pub mod deploy;
pub mod error;
pub mod release;
pub mod runtime;
pub mod transfer;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigStore, DeployConfig, TargetConfigEntry};

    // Pipeline
    pub use crate::deploy::{DeployReport, Deployer};
    pub use crate::error::{
        DeployError, ExpansionError, PlanningError, RemoteError, Stage, TransferError,
    };

    // Collaborators
    pub use crate::archive::{ArchiveExpander, ArchiveFormat, LocalExpander};
    pub use crate::runtime::{InMemoryRuntime, RemoteCall, RemoteReply, Runtime, TimedRuntime};
    pub use crate::transfer::{ArtifactTransfer, StagingTransfer, Transferred};

    // Release
    pub use crate::release::{LoadPlan, ReleaseManifest, plan_release};

    // Types
    pub use crate::artifact::is_valid_artifact;
    pub use crate::types::{Artifact, ArtifactKind, ModuleId, Target};
}
