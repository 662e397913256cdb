use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config_file::InstallConfig;
use crate::error::Result;
use crate::types::{Action, CloudVariant, RegistryEngine};

/// install-tool - prepare and drive OpenShift cluster installs
///
/// Every flag can also be set through its INST_* environment variable.
/// Flags override values from --config-path, which override built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "install-tool")]
#[command(about = "Prepare cloud prerequisites and create or destroy OpenShift clusters")]
#[command(version)]
pub struct Cli {
    /// Action to perform (create, destroy)
    #[arg(short = 'a', long, env = "INST_ACTION", global = true)]
    pub action: Option<Action>,

    /// Cloud variant (aws, aws-sts, aws-odf, gcp, gcp-wif, vsphere, azure, azure-wi, alibaba)
    #[arg(short = 'c', long, env = "INST_CLOUD", global = true, value_parser = parse_cloud)]
    pub cloud: Option<CloudVariant>,

    /// Release image to install from
    #[arg(short = 'i', long, env = "INST_IMAGE", global = true)]
    pub image: Option<String>,

    #[arg(short = 'n', long, env = "INST_CLUSTER_NAME", global = true)]
    pub cluster_name: Option<String>,

    /// Used to name cloud resources owned by this run
    #[arg(short = 'u', long, env = "INST_USER_NAME", global = true)]
    pub user_name: Option<String>,

    /// Working directory for the installer and its state
    #[arg(short = 'o', long, env = "INST_OUTPUT_DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    #[arg(short = 'r', long, env = "INST_CLOUD_REGION", global = true)]
    pub cloud_region: Option<String>,

    /// Pull secret JSON file
    #[arg(short = 'p', long, env = "INST_PULL_SECRET", global = true)]
    pub pull_secret: Option<PathBuf>,

    /// SSH public key file embedded in the manifest
    #[arg(short = 'k', long, env = "INST_SSH_PUBLIC_KEY", global = true)]
    pub ssh_public_key: Option<PathBuf>,

    /// Container engine used for registry login (docker, podman)
    #[arg(short = 'e', long, env = "INST_ENGINE", global = true)]
    pub engine: Option<RegistryEngine>,

    /// Prepare everything but skip ccoctl and the cluster itself
    #[arg(short = 'd', long, env = "INST_DRY_RUN", global = true)]
    pub dry_run: bool,

    /// Configuration file to start from
    #[arg(short = 'f', long, env = "INST_CONFIG_PATH", global = true)]
    pub config_path: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(short = 'D', long, env = "INST_DUMP_CONFIG", global = true)]
    pub dump_config: bool,

    /// Run the installer with --log-level debug
    #[arg(short = 'v', long, env = "INST_VERBOSE", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the configured action in the foreground (default)
    Run,
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        config: PathBuf,
    },
    /// Save the effective configuration and make it the active one
    Save,
    /// Run the active saved configuration as a tracked job
    Apply,
    /// Print the installer log of the active configuration
    Log,
}

fn parse_cloud(value: &str) -> std::result::Result<CloudVariant, String> {
    CloudVariant::parse(value).map_err(|e| e.to_string())
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Build the effective configuration: defaults, then `--config-path`, then flags.
    pub fn to_config(&self) -> Result<InstallConfig> {
        let base = match &self.config_path {
            Some(path) => InstallConfig::load_from_file(path)?,
            None => InstallConfig::default(),
        };
        Ok(self.apply_overrides(base))
    }

    /// Overlay every flag that was given onto `config`.
    pub fn apply_overrides(&self, mut config: InstallConfig) -> InstallConfig {
        if let Some(action) = self.action {
            config.action = action;
        }
        if let Some(cloud) = self.cloud {
            config.cloud = cloud;
        }
        if let Some(image) = &self.image {
            config.image = image.clone();
        }
        if let Some(name) = &self.cluster_name {
            config.cluster_name = name.clone();
        }
        if let Some(user) = &self.user_name {
            config.user_name = user.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(region) = &self.cloud_region {
            config.cloud_region = region.clone();
        }
        if let Some(path) = &self.pull_secret {
            config.pull_secret_file = path.clone();
        }
        if let Some(path) = &self.ssh_public_key {
            config.ssh_public_key_file = path.clone();
        }
        if let Some(engine) = self.engine {
            config.engine = engine;
        }
        if self.dry_run {
            config.dry_run = true;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_no_command() {
        let cli = Cli::try_parse_from(["install-tool"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::try_parse_from([
            "install-tool",
            "-a",
            "destroy",
            "-c",
            "azure-wi",
            "-i",
            "quay.io/ocp/release:4.16",
            "-e",
            "podman",
            "-d",
        ])
        .unwrap();
        assert_eq!(cli.action, Some(Action::Destroy));
        assert_eq!(cli.cloud, Some(CloudVariant::AzureWi));
        assert_eq!(cli.engine, Some(RegistryEngine::Podman));
        assert!(cli.dry_run);
    }

    #[test]
    fn test_cli_rejects_unknown_cloud() {
        let err = Cli::try_parse_from(["install-tool", "--cloud", "openstack"]).unwrap_err();
        assert!(err.to_string().contains("aws-sts"));
    }

    #[test]
    fn test_cli_apply_with_action_after_subcommand() {
        let cli = Cli::try_parse_from(["install-tool", "apply", "--action", "destroy"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Apply));
        assert_eq!(cli.action, Some(Action::Destroy));
    }

    #[test]
    fn test_cli_validate_command() {
        let cli = Cli::try_parse_from(["install-tool", "validate", "/path/to/conf.json"]).unwrap();
        match cli.command {
            Some(Commands::Validate { config }) => {
                assert_eq!(config.to_str().unwrap(), "/path/to/conf.json");
            }
            other => panic!("Expected Validate command, got {other:?}"),
        }
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf.json");
        let from_file = InstallConfig {
            cloud: CloudVariant::Gcp,
            image: "from-file".to_string(),
            cloud_region: "us-central1".to_string(),
            ..InstallConfig::default()
        };
        from_file.save_to_file(&path).unwrap();

        let cli = Cli::try_parse_from([
            "install-tool",
            "-f",
            path.to_str().unwrap(),
            "-i",
            "from-flag",
        ])
        .unwrap();
        let config = cli.to_config().unwrap();
        assert_eq!(config.image, "from-flag");
        assert_eq!(config.cloud, CloudVariant::Gcp);
        assert_eq!(config.cloud_region, "us-central1");
        assert_eq!(config.cluster_name, "mytestcluster-1");
    }
}
