//! Type-safe arguments for `./openshift-install`.

use crate::tool_args::ToolArgs;
use crate::types::Action;

/// The installer binary extracted into the output dir
pub const OPENSHIFT_INSTALL: &str = "./openshift-install";

/// `./openshift-install create manifests --log-level debug`
#[derive(Debug, Clone, Default)]
pub struct CreateManifestsArgs;

impl ToolArgs for CreateManifestsArgs {
    fn program(&self) -> &str {
        OPENSHIFT_INSTALL
    }

    fn to_cli_args(&self) -> Vec<String> {
        ["create", "manifests", "--log-level", "debug"]
            .map(String::from)
            .to_vec()
    }
}

/// `./openshift-install {create|destroy} cluster [--log-level debug]`
#[derive(Debug, Clone)]
pub struct ClusterArgs {
    pub action: Action,
    pub verbose: bool,
}

impl ClusterArgs {
    pub fn create(verbose: bool) -> Self {
        Self {
            action: Action::Create,
            verbose,
        }
    }

    pub fn destroy(verbose: bool) -> Self {
        Self {
            action: Action::Destroy,
            verbose,
        }
    }
}

impl ToolArgs for ClusterArgs {
    fn program(&self) -> &str {
        OPENSHIFT_INSTALL
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec![self.action.to_string(), "cluster".to_string()];
        if self.verbose {
            args.push("--log-level".to_string());
            args.push("debug".to_string());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_args() {
        assert_eq!(ClusterArgs::create(false).to_cli_args(), ["create", "cluster"]);
        assert_eq!(
            ClusterArgs::destroy(true).to_cli_args(),
            ["destroy", "cluster", "--log-level", "debug"]
        );
    }
}
