//! Installer module
//!
//! Drives one run end to end: registry authentication, manifest rendering,
//! cloud preparation and finally `openshift-install create|destroy cluster`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::command_executor::CommandRunner;
use crate::config_file::InstallConfig;
use crate::error::Result;
use crate::pipeline::{CloudPipeline, GCP_CREDENTIALS_ENV, GCP_KEY_FILENAME, VcenterProbe};
use crate::probe;
use crate::registry::ensure_registry_login;
use crate::template::{TemplateRenderer, TemplateSource};
use crate::tool_args::ToolArgs;
use crate::tools::openshift_install::ClusterArgs;
use crate::types::{Action, CloudVariant};

/// What a successful preparation leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preparation {
    pub manifest_path: PathBuf,
    /// Environment the cluster command must run with
    pub env: Vec<(String, String)>,
}

/// Installer instance
#[derive(Clone)]
pub struct Installer {
    runner: Arc<dyn CommandRunner>,
    templates: Arc<dyn TemplateSource>,
    vcenter_probe: VcenterProbe,
    verbose: bool,
}

impl Installer {
    /// Create a new installer instance
    pub fn new(runner: Arc<dyn CommandRunner>, templates: Arc<dyn TemplateSource>) -> Self {
        Self {
            runner,
            templates,
            vcenter_probe: probe::check_vcenter_reachable,
            verbose: false,
        }
    }

    /// Pass `--log-level debug` to `create|destroy cluster`
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_vcenter_probe(mut self, probe: VcenterProbe) -> Self {
        self.vcenter_probe = probe;
        self
    }

    /// Authenticate, render the manifest and run the variant's preparation steps.
    pub fn prepare(&self, config: &InstallConfig) -> Result<Preparation> {
        let pull_secret = config.pull_secret_path()?;
        ensure_registry_login(
            self.runner.as_ref(),
            &pull_secret,
            &config.image,
            config.engine,
        )?;

        let manifest_path = TemplateRenderer::new(self.templates.as_ref()).render(config)?;

        let env = CloudPipeline::new(self.runner.as_ref(), config)?
            .with_vcenter_probe(self.vcenter_probe)
            .run()?;

        Ok(Preparation { manifest_path, env })
    }

    /// Execute the configured action.
    ///
    /// Destroy only authenticates before tearing down: re-rendering or
    /// re-running preparation would overwrite the installer's state files.
    pub fn run(&self, config: &InstallConfig) -> Result<()> {
        config.validate()?;
        info!(
            "Starting {} of {} cluster {} in {}",
            config.action,
            config.cloud,
            config.cluster_name,
            config.output_dir.display()
        );

        match config.action {
            Action::Create => {
                let preparation = self.prepare(config)?;
                if config.dry_run {
                    info!(
                        "Dry run complete. Manifest at {}; run `{}` in {} to install",
                        preparation.manifest_path.display(),
                        ClusterArgs::create(self.verbose).invocation(None).display_line(),
                        config.output_dir.display()
                    );
                    return Ok(());
                }
                run_cluster(
                    self.runner.as_ref(),
                    &config.output_dir,
                    self.verbose,
                    &preparation.env,
                )
            }
            Action::Destroy => {
                ensure_registry_login(
                    self.runner.as_ref(),
                    &config.pull_secret_path()?,
                    &config.image,
                    config.engine,
                )?;
                destroy_cluster(
                    self.runner.as_ref(),
                    &config.output_dir,
                    self.verbose,
                    &destroy_env(config)?,
                )
            }
        }
    }
}

/// `./openshift-install create cluster` in the output dir.
pub fn run_cluster(
    runner: &dyn CommandRunner,
    output_dir: &Path,
    verbose: bool,
    env: &[(String, String)],
) -> Result<()> {
    cluster_command(runner, ClusterArgs::create(verbose), output_dir, env)
}

/// `./openshift-install destroy cluster` in the output dir.
pub fn destroy_cluster(
    runner: &dyn CommandRunner,
    output_dir: &Path,
    verbose: bool,
    env: &[(String, String)],
) -> Result<()> {
    cluster_command(runner, ClusterArgs::destroy(verbose), output_dir, env)
}

fn cluster_command(
    runner: &dyn CommandRunner,
    args: ClusterArgs,
    output_dir: &Path,
    env: &[(String, String)],
) -> Result<()> {
    let invocation = args.invocation(Some(output_dir)).envs(env);
    info!("Running {} in {}", invocation.display_line(), output_dir.display());
    runner.run_checked(&invocation)?;
    info!("{} cluster finished", args.action);
    Ok(())
}

/// GCP teardown reuses the key written during preparation when present.
fn destroy_env(config: &InstallConfig) -> Result<Vec<(String, String)>> {
    if !matches!(config.cloud, CloudVariant::Gcp | CloudVariant::GcpWif) {
        return Ok(Vec::new());
    }
    let key = std::path::absolute(config.output_dir.join(GCP_KEY_FILENAME))?;
    if !key.exists() {
        return Ok(Vec::new());
    }
    Ok(vec![(GCP_CREDENTIALS_ENV.to_string(), key.display().to_string())])
}
