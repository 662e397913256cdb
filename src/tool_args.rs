//! Type-safe tool argument contracts.
//!
//! Instead of raw string vectors, each external tool invocation is a Rust
//! struct implementing [`ToolArgs`]. The struct definition is the contract:
//! a flag typo is a compile error in one place rather than a runtime failure
//! in every call site.

use crate::command_executor::CommandInvocation;
use std::path::Path;

/// Trait for typed tool arguments.
///
/// # Contract
///
/// - `program()`: executable to run. Relative paths such as `./oc` refer to
///   binaries extracted into the working directory.
/// - `to_cli_args()`: arguments exactly as the tool's parser expects them.
///
/// # Example
///
/// ```
/// use install_tools::tool_args::ToolArgs;
/// use install_tools::tools::openshift_install::ClusterArgs;
///
/// let args = ClusterArgs::create(true);
/// assert_eq!(args.to_cli_args(), ["create", "cluster", "--log-level", "debug"]);
/// ```
pub trait ToolArgs {
    fn program(&self) -> &str;

    fn to_cli_args(&self) -> Vec<String>;

    /// Build the invocation, optionally inside `work_dir`.
    fn invocation(&self, work_dir: Option<&Path>) -> CommandInvocation {
        let inv = CommandInvocation::new(self.program()).args(self.to_cli_args());
        match work_dir {
            Some(dir) => inv.work_dir(dir),
            None => inv,
        }
    }
}
