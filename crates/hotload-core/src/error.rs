//! Error taxonomy for the deploy pipeline.
//!
//! Every stage returns its own error type; [`DeployError`] wraps them without
//! translation so callers can see which stage stopped the pipeline.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::types::Target;

/// Failure of a single remote runtime call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("node {node} is unreachable")]
    Unreachable { node: String },

    #[error("call rejected: {reason}")]
    Rejected { reason: String },

    #[error("no reply within {after:?}")]
    Timeout { after: Duration },
}

impl RemoteError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("cannot read artifact {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {} on {node}: {source}", path.display())]
    Unwritable {
        node: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("target {node} is unreachable: no staging location configured")]
    Unreachable { node: String },
}

#[derive(Debug, Error)]
pub enum ExpansionError {
    #[error("unsupported archive format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("corrupt archive {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("archive entry escapes package root: {entry}")]
    UnsafeEntry { entry: String },

    #[error("failed to unpack into {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid release manifest {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanningError {
    #[error("application '{application}' is not declared by release '{release}'")]
    UnknownApplication { application: String, release: String },
}

/// Pipeline stage that produced a [`DeployError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Transfer,
    Expansion,
    Planning,
    PathRegistration,
    ConfigLoad,
    ApplicationStart,
    Activation,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Transfer => "transfer",
            Stage::Expansion => "expansion",
            Stage::Planning => "planning",
            Stage::PathRegistration => "path-registration",
            Stage::ConfigLoad => "config-load",
            Stage::ApplicationStart => "application-start",
            Stage::Activation => "activation",
        }
    }
}

/// Outcome of a failed deployment, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Expansion(#[from] ExpansionError),

    #[error(transparent)]
    Planning(#[from] PlanningError),

    #[error("failed to register code paths on {target}: {source}")]
    PathRegistration {
        target: Target,
        #[source]
        source: RemoteError,
    },

    #[error("failed to discover code directories under {} on {target}: {source}", root.display())]
    CodePathDiscovery {
        target: Target,
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load configuration on {target}: {source}")]
    ConfigLoad {
        target: Target,
        #[source]
        source: RemoteError,
    },

    #[error("failed to start application '{application}' on {target}: {source}")]
    ApplicationStart {
        target: Target,
        application: String,
        /// Applications from the same plan that were already running.
        started: Vec<String>,
        #[source]
        source: RemoteError,
    },

    #[error("{message} on {target}: {source}")]
    Activation {
        target: Target,
        message: String,
        #[source]
        source: RemoteError,
    },
}

impl DeployError {
    pub fn stage(&self) -> Stage {
        match self {
            DeployError::Transfer(_) => Stage::Transfer,
            DeployError::Expansion(_) => Stage::Expansion,
            DeployError::Planning(_) => Stage::Planning,
            DeployError::PathRegistration { .. } | DeployError::CodePathDiscovery { .. } => {
                Stage::PathRegistration
            }
            DeployError::ConfigLoad { .. } => Stage::ConfigLoad,
            DeployError::ApplicationStart { .. } => Stage::ApplicationStart,
            DeployError::Activation { .. } => Stage::Activation,
        }
    }

    /// Target identity carried by remote-call failures.
    pub fn target(&self) -> Option<&Target> {
        match self {
            DeployError::PathRegistration { target, .. }
            | DeployError::CodePathDiscovery { target, .. }
            | DeployError::ConfigLoad { target, .. }
            | DeployError::ApplicationStart { target, .. }
            | DeployError::Activation { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Underlying remote failure, if the stage failed inside a runtime call.
    pub fn remote_cause(&self) -> Option<&RemoteError> {
        match self {
            DeployError::PathRegistration { source, .. }
            | DeployError::ConfigLoad { source, .. }
            | DeployError::ApplicationStart { source, .. }
            | DeployError::Activation { source, .. } => Some(source),
            _ => None,
        }
    }
}
