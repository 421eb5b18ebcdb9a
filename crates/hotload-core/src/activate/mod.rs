//! Activation: making transferred code live on a target.

pub mod application;
pub mod module;

pub use application::{ApplicationActivator, discover_code_dirs};
pub use module::ModuleActivator;
