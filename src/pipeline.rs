//! Cloud preparation pipeline.
//!
//! Each variant runs a fixed list of [`PrepStep`]s strictly in order. The first
//! failing step aborts the run; nothing already done is rolled back.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use strum::Display;
use tracing::{info, warn};

use crate::command_executor::{CommandInvocation, CommandResult, CommandRunner};
use crate::config_file::InstallConfig;
use crate::error::{InstallError, Result};
use crate::probe;
use crate::tool_args::ToolArgs;
use crate::tools::CRED_REQUEST_DIR;
use crate::tools::az::{AccountShowArgs, AzureAccount};
use crate::tools::ccoctl::{
    ALIBABA_OUTPUT_DIR, CCOCTL, CreateAllArgs, CreateAllExtras, CreateRamUsersArgs,
};
use crate::tools::gcloud::{self, GcloudArgs, INSTALLER_ROLES, ServiceAccount};
use crate::tools::oc::{
    CCO_COMPONENT, CCOCTL_IMAGE_PATH, ExtractTarget, ImageExtractArgs, OcBinary,
    ReleaseExtractArgs, ReleaseInfoArgs,
};
use crate::tools::openshift_install::CreateManifestsArgs;
use crate::types::CloudVariant;

/// Service account key written for GCP installs, relative to the output dir
pub const GCP_KEY_FILENAME: &str = "gcp-service-account.json";

/// Environment variable pointing GCP tools at the service account key
pub const GCP_CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// One unit of cloud preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PrepStep {
    /// Extract `openshift-install` and `oc` from the release image
    ExtractTools,
    /// Generate manifests and pull the variant's CredentialsRequests
    CreateManifests,
    /// Pull `ccoctl` out of the cloud-credential-operator image
    ExtractCcoctl,
    /// `ccoctl <cloud> create-all`
    ExecuteCcoctl,
    /// Ephemeral GCP service account with installer roles
    GcpServiceAccount,
    /// TCP reachability check against vCenter
    ProbeVcenter,
    /// `ccoctl alibabacloud create-ram-users`
    AlibabaRamUsers,
}

/// Checks that vCenter answers before anything else runs.
pub type VcenterProbe = fn(&str) -> Result<()>;

/// Runs a variant's preparation steps against one configuration.
pub struct CloudPipeline<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a InstallConfig,
    pull_secret: PathBuf,
    env: Vec<(String, String)>,
    vcenter_probe: VcenterProbe,
}

impl<'a> CloudPipeline<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a InstallConfig) -> Result<Self> {
        Ok(Self {
            runner,
            config,
            pull_secret: config.pull_secret_path()?,
            env: Vec::new(),
            vcenter_probe: probe::check_vcenter_reachable,
        })
    }

    /// Replace the vCenter probe, e.g. in tests without network access.
    pub fn with_vcenter_probe(mut self, probe: VcenterProbe) -> Self {
        self.vcenter_probe = probe;
        self
    }

    /// Run every step for the configured variant.
    ///
    /// Returns the environment later tool invocations must carry (currently
    /// only GCP credentials).
    pub fn run(mut self) -> Result<Vec<(String, String)>> {
        let steps = self.config.cloud.preparation_steps();
        info!(
            "Preparing {} with {} step(s): {:?}",
            self.config.cloud,
            steps.len(),
            steps
        );
        for (index, step) in steps.iter().enumerate() {
            info!("[{}/{}] {}", index + 1, steps.len(), step);
            self.run_step(*step).inspect_err(|e| {
                warn!("Step {} failed for {}: {}", step, self.config.cloud, e);
            })?;
        }
        Ok(self.env)
    }

    fn run_step(&mut self, step: PrepStep) -> Result<()> {
        match step {
            PrepStep::ExtractTools => self.extract_tools(),
            PrepStep::CreateManifests => self.create_manifests(),
            PrepStep::ExtractCcoctl => self.extract_ccoctl(),
            PrepStep::ExecuteCcoctl => self.execute_ccoctl(),
            PrepStep::GcpServiceAccount => self.gcp_service_account(),
            PrepStep::ProbeVcenter => (self.vcenter_probe)(&self.config.vsphere.vcenter),
            PrepStep::AlibabaRamUsers => self.alibaba_ram_users(),
        }
    }

    fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Invocation inside the output dir carrying the pipeline environment
    fn in_output_dir(&self, args: &impl ToolArgs) -> CommandInvocation {
        args.invocation(Some(self.output_dir())).envs(&self.env)
    }

    fn exec(&self, args: &impl ToolArgs) -> Result<CommandResult> {
        self.runner.run_checked(&self.in_output_dir(args))
    }

    fn extract_tools(&mut self) -> Result<()> {
        for command in ["openshift-install", "oc"] {
            info!("Extracting {} from {}", command, self.config.image);
            self.exec(&ReleaseExtractArgs {
                oc: OcBinary::Host,
                pull_secret: self.pull_secret.clone(),
                image: self.config.image.clone(),
                target: ExtractTarget::Command(command.to_string()),
            })?;
        }
        Ok(())
    }

    fn create_manifests(&mut self) -> Result<()> {
        self.exec(&CreateManifestsArgs)?;

        fs::create_dir_all(self.output_dir().join(CRED_REQUEST_DIR))?;
        self.exec(&ReleaseExtractArgs {
            oc: OcBinary::Extracted,
            pull_secret: self.pull_secret.clone(),
            image: self.config.image.clone(),
            target: ExtractTarget::CredentialsRequests {
                cloud: self.config.cloud.credentials_cloud().to_string(),
                to: CRED_REQUEST_DIR.to_string(),
            },
        })?;
        Ok(())
    }

    fn extract_ccoctl(&mut self) -> Result<()> {
        let info = self.exec(&ReleaseInfoArgs {
            pull_secret: self.pull_secret.clone(),
            image: self.config.image.clone(),
            component: CCO_COMPONENT.to_string(),
        })?;
        let digest = info.stdout.trim();
        if digest.is_empty() {
            return Err(InstallError::config(format!(
                "Release {} has no image for {}",
                self.config.image, CCO_COMPONENT
            )));
        }
        info!("Extracting ccoctl from {}", digest);

        self.exec(&ImageExtractArgs {
            pull_secret: self.pull_secret.clone(),
            file: CCOCTL_IMAGE_PATH.to_string(),
            image: digest.to_string(),
        })?;

        let chmod = CommandInvocation::new("chmod")
            .args(["+x", CCOCTL])
            .work_dir(self.output_dir());
        self.runner.run_checked(&chmod)?;
        Ok(())
    }

    fn ccoctl_extras(&self) -> Result<CreateAllExtras> {
        match self.config.cloud {
            CloudVariant::AwsSts => Ok(CreateAllExtras::Aws),
            CloudVariant::GcpWif => Ok(CreateAllExtras::Gcp {
                project: self.config.gcp_project.clone(),
            }),
            CloudVariant::AzureWi => {
                let shown = self
                    .runner
                    .run_checked(&AccountShowArgs.invocation(None).envs(&self.env))?;
                let account = AzureAccount::from_json(&shown.stdout).map_err(|e| {
                    InstallError::config(format!("Could not parse `az account show`: {}", e))
                })?;
                Ok(CreateAllExtras::Azure {
                    subscription_id: account.id,
                    tenant_id: account.tenant_id,
                    dnszone_resource_group: self.config.azure_dns_resource_group.clone(),
                })
            }
            other => Err(InstallError::config(format!(
                "ccoctl create-all is not supported for {}",
                other
            ))),
        }
    }

    fn execute_ccoctl(&mut self) -> Result<()> {
        let args = CreateAllArgs {
            name: self.config.cloud.infra_name(&self.config.cluster_name),
            region: self.config.cloud_region.clone(),
            credentials_requests_dir: CRED_REQUEST_DIR.to_string(),
            extras: self.ccoctl_extras()?,
        };
        if self.config.dry_run {
            info!(
                "Dry run: skipping ccoctl. Run it manually in {}: {}",
                self.output_dir().display(),
                args.invocation(None).display_line()
            );
            return Ok(());
        }
        self.exec(&args)?;
        Ok(())
    }

    fn alibaba_ram_users(&mut self) -> Result<()> {
        let args = CreateRamUsersArgs {
            name: self.config.cloud.infra_name(&self.config.cluster_name),
            region: self.config.cloud_region.clone(),
            credentials_requests_dir: CRED_REQUEST_DIR.to_string(),
            output_dir: ALIBABA_OUTPUT_DIR.to_string(),
        };
        if self.config.dry_run {
            info!(
                "Dry run: skipping RAM users. Run it manually in {}: {}",
                self.output_dir().display(),
                args.invocation(None).display_line()
            );
            return Ok(());
        }
        self.exec(&args)?;

        let generated = self.output_dir().join(ALIBABA_OUTPUT_DIR).join("manifests");
        let manifests = self.output_dir().join("manifests");
        let copied = copy_dir_files(&generated, &manifests)?;
        info!("Copied {} RAM user manifest(s) into {}", copied, manifests.display());
        Ok(())
    }

    fn gcp_service_account(&mut self) -> Result<()> {
        let auth = self.runner.run_checked(&GcloudArgs::AuthList.invocation(None))?;
        let active = gcloud::has_active_account(&auth.stdout).map_err(|e| {
            InstallError::config(format!("Could not parse `gcloud auth list`: {}", e))
        })?;
        if !active {
            return Err(InstallError::authentication(
                "No active gcloud account. Run `gcloud auth login` and try again.",
            ));
        }

        let name = format!("{}-development", self.config.user_name);
        if let Some(existing) = self.find_service_account(&name)? {
            return Err(InstallError::config(format!(
                "Service account {} already exists. Delete it with \
                 `gcloud iam service-accounts delete {}` and try again.",
                name, existing.email
            )));
        }

        info!("Creating service account {}", name);
        self.gcloud(GcloudArgs::ServiceAccountCreate { name: name.clone() })?;
        let ServiceAccount {
            email, project_id, ..
        } = self.find_service_account(&name)?.ok_or_else(|| {
            InstallError::config(format!(
                "Service account {} was created but could not be read back",
                name
            ))
        })?;
        if project_id.is_empty() {
            return Err(InstallError::config(format!(
                "Service account {} has no project",
                name
            )));
        }

        let pause = Duration::from_secs(self.config.iam_binding_pause_secs);
        for (index, role) in INSTALLER_ROLES.iter().enumerate() {
            if index > 0 && !pause.is_zero() {
                thread::sleep(pause);
            }
            info!("Binding {} to {}", role, email);
            self.gcloud(GcloudArgs::AddPolicyBinding {
                project: project_id.clone(),
                email: email.clone(),
                role: role.to_string(),
            })?;
        }

        let key = std::path::absolute(self.output_dir().join(GCP_KEY_FILENAME))?;
        self.gcloud(GcloudArgs::KeyCreate {
            output: key.clone(),
            email,
        })?;
        self.env
            .push((GCP_CREDENTIALS_ENV.to_string(), key.display().to_string()));
        Ok(())
    }

    fn gcloud(&self, args: GcloudArgs) -> Result<CommandResult> {
        self.runner.run_checked(&args.invocation(None).envs(&self.env))
    }

    /// The account whose display name is exactly `name`, if any.
    fn find_service_account(&self, name: &str) -> Result<Option<ServiceAccount>> {
        let listed = self.gcloud(GcloudArgs::ServiceAccountList {
            display_name: name.to_string(),
        })?;
        let mut matches = ServiceAccount::exact(ServiceAccount::parse_list(&listed.stdout), name);
        if matches.len() > 1 {
            let emails: Vec<&str> = matches.iter().map(|a| a.email.as_str()).collect();
            return Err(InstallError::config(format!(
                "{} service accounts are named {}: {}",
                matches.len(),
                name,
                emails.join(", ")
            )));
        }
        Ok(matches.pop())
    }
}

/// Copy the regular files of `from` into `to`, creating `to` if needed.
fn copy_dir_files(from: &Path, to: &Path) -> Result<usize> {
    fs::create_dir_all(to)?;
    let mut copied = 0;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            fs::copy(entry.path(), to.join(entry.file_name()))?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_dir_files_skips_subdirs() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("src");
        fs::create_dir_all(from.join("nested")).unwrap();
        fs::write(from.join("a.yaml"), "a").unwrap();
        fs::write(from.join("b.yaml"), "b").unwrap();

        let to = dir.path().join("dst");
        assert_eq!(copy_dir_files(&from, &to).unwrap(), 2);
        assert_eq!(fs::read_to_string(to.join("b.yaml")).unwrap(), "b");
        assert!(!to.join("nested").exists());
    }

    #[test]
    fn test_copy_dir_files_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        assert!(copy_dir_files(&dir.path().join("none"), &dir.path().join("dst")).is_err());
    }
}
