//! install-tools library
//!
//! Prepares cloud prerequisites for an OpenShift install and drives the
//! installer: registry login, manifest rendering, per-cloud preparation
//! steps and a single-flight job tracker for background runs.

pub mod cli;
pub mod command_executor;
pub mod config_file;
pub mod config_store;
pub mod error;
pub mod installer;
pub mod job;
pub mod pipeline;
pub mod probe;
pub mod process_guard;
pub mod registry;
pub mod template;
pub mod tool_args;
pub mod tools;
pub mod types;

// Re-export main types for convenience
pub use command_executor::{
    CommandInvocation, CommandResult, CommandRunner, SystemRunner, run_command,
};
pub use config_file::InstallConfig;
pub use config_store::ConfigStore;
pub use error::{InstallError, Result};
pub use installer::{Installer, Preparation, destroy_cluster, run_cluster};
pub use job::{JobHandle, JobSnapshot, JobStatus, JobTracker, JobTransitionError};
pub use pipeline::{CloudPipeline, PrepStep};
pub use process_guard::{ChildRegistry, CommandProcessGroup};
pub use registry::{ensure_registry_login, registry_domain};
pub use template::{EmbeddedTemplates, MANIFEST_FILENAME, TemplateRenderer, TemplateSource};
pub use tool_args::ToolArgs;
pub use types::{Action, CloudVariant, RegistryEngine};
