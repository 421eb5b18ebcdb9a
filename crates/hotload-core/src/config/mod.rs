//! Deployment configuration
//!
//! A single `hotload.toml` describes the local node identity, where each
//! target's staging area lives and how remote calls are issued.

pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use parser::{parse_hotload_toml, parse_hotload_toml_str, to_toml};
pub use paths::{default_config_path, default_staging_dir};
pub use schema::{DeployConfig, TargetConfigEntry};
pub use store::ConfigStore;
