//! Configuration record for an install or destroy run.
//!
//! The record is saved and loaded as JSON. Enum-typed fields (action, cloud,
//! engine) reject unknown values at load time instead of deep in the pipeline.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{InstallError, Result};
use crate::types::{Action, CloudVariant, RegistryEngine};

/// GCP project used by ccoctl when none is configured
pub const DEFAULT_GCP_PROJECT: &str = "openshift-gce-devel";

/// Pre-provisioned Azure resource group holding the base-domain DNS zone
pub const DEFAULT_AZURE_DNS_RESOURCE_GROUP: &str = "os4-common";

/// vCenter probed before vSphere installs
pub const DEFAULT_VCENTER: &str = "vcenter.devqe.ibmc.devcluster.openshift.com";

/// vSphere-only settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VsphereConfig {
    pub vcenter: String,
    pub password: String,
    pub base_domain: String,
    pub vcenter_subdomain: String,
    pub api_vip: String,
    pub ingress_vip: String,
}

impl Default for VsphereConfig {
    fn default() -> Self {
        Self {
            vcenter: DEFAULT_VCENTER.to_string(),
            password: String::new(),
            base_domain: String::new(),
            vcenter_subdomain: String::new(),
            api_vip: String::new(),
            ingress_vip: String::new(),
        }
    }
}

/// Installation configuration that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstallConfig {
    pub action: Action,
    pub cloud: CloudVariant,
    pub cluster_name: String,
    pub user_name: String,
    pub output_dir: PathBuf,
    pub cloud_region: String,
    /// Release image reference, e.g. `quay.io/openshift-release-dev/ocp-release:4.16.0-x86_64`
    pub image: String,
    pub engine: RegistryEngine,
    pub dry_run: bool,

    pub ssh_public_key_file: PathBuf,
    pub pull_secret_file: PathBuf,

    /// Contents of `ssh_public_key_file`, filled by [`InstallConfig::materialize_secrets`]
    #[serde(skip)]
    pub ssh_public_key: String,
    /// Compacted contents of `pull_secret_file`, filled by [`InstallConfig::materialize_secrets`]
    #[serde(skip)]
    pub pull_secret: String,

    pub gcp_project: String,
    pub azure_dns_resource_group: String,
    /// Pause between consecutive IAM policy bindings
    pub iam_binding_pause_secs: u64,
    pub vsphere: VsphereConfig,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            action: Action::Create,
            cloud: CloudVariant::Aws,
            cluster_name: "mytestcluster-1".to_string(),
            user_name: "mytestuser-1".to_string(),
            output_dir: PathBuf::from("./_output"),
            cloud_region: "us-east-1".to_string(),
            image: String::new(),
            engine: RegistryEngine::Docker,
            dry_run: false,
            ssh_public_key_file: PathBuf::new(),
            pull_secret_file: PathBuf::new(),
            ssh_public_key: String::new(),
            pull_secret: String::new(),
            gcp_project: DEFAULT_GCP_PROJECT.to_string(),
            azure_dns_resource_group: DEFAULT_AZURE_DNS_RESOURCE_GROUP.to_string(),
            iam_binding_pause_secs: 3,
            vsphere: VsphereConfig::default(),
        }
    }
}

impl InstallConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            InstallError::config(format!("Failed to read configuration from {:?}: {}", path, e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            InstallError::config(format!("Failed to parse configuration {:?}: {}", path, e))
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.image.trim().is_empty() {
            return Err(InstallError::config("Image must be specified"));
        }
        if self.cluster_name.trim().is_empty() {
            return Err(InstallError::config("Cluster name must be specified"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(InstallError::config("Output directory must be specified"));
        }
        if self.dry_run && self.action != Action::Create {
            return Err(InstallError::config(
                "Dry run can only be used with create action",
            ));
        }
        Ok(())
    }

    /// Pull secret path made absolute, for tools that run in the output dir
    pub fn pull_secret_path(&self) -> Result<PathBuf> {
        if self.pull_secret_file.as_os_str().is_empty() {
            return Err(InstallError::config("Pull secret file must be specified"));
        }
        std::path::absolute(&self.pull_secret_file).map_err(|e| {
            InstallError::config(format!(
                "Could not resolve path to pull secret {:?}: {}",
                self.pull_secret_file, e
            ))
        })
    }

    /// Return a copy with the SSH key and compacted pull secret read into memory.
    ///
    /// The caller's record is left untouched.
    pub fn materialize_secrets(&self) -> Result<Self> {
        let mut resolved = self.clone();
        resolved.ssh_public_key = read_secret_file(&self.ssh_public_key_file, "SSH public key")?;
        let raw_pull_secret = read_secret_file(&self.pull_secret_file, "pull secret")?;
        resolved.pull_secret = compact_json(&raw_pull_secret).map_err(|e| {
            InstallError::config(format!(
                "Pull secret {:?} is not valid JSON: {}",
                self.pull_secret_file, e
            ))
        })?;
        Ok(resolved)
    }
}

fn read_secret_file(path: &Path, what: &str) -> Result<String> {
    tracing::debug!("Reading {} from {:?}", what, path);
    if path.as_os_str().is_empty() {
        return Err(InstallError::config(format!("{} file must be specified", what)));
    }
    fs::read_to_string(path)
        .map_err(|e| InstallError::config(format!("Could not read {} {:?}: {}", what, path, e)))
}

/// Strip insignificant whitespace from a JSON document, keeping key order.
pub fn compact_json(content: &str) -> serde_json::Result<String> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    serde_json::to_string(&value)
}
