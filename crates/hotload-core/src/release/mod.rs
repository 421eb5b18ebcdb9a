//! Release manifests and load planning.

pub mod manifest;
pub mod planner;

pub use manifest::{MANIFEST_FILE_NAME, ReleaseManifest};
pub use planner::{LoadPlan, plan_release};
