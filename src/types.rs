//! Type-safe configuration types for install-tools
//!
//! Cloud variants, actions and registry engines are closed enums so that a
//! missing template or step mapping is a compile error, not a runtime surprise.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::{InstallError, Result};
use crate::pipeline::PrepStep;

/// What to do with the cluster once preparation is finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    #[default]
    Create,
    Destroy,
}

/// Container client used for `login` against the release registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RegistryEngine {
    #[default]
    Docker,
    Podman,
}

impl RegistryEngine {
    /// Executable name of the engine
    pub const fn program(self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Podman => "podman",
        }
    }
}

/// Cloud provider plus authentication mode.
///
/// Selects both the manifest template and the preparation step sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(try_from = "String", into = "String")]
#[strum(serialize_all = "kebab-case")]
pub enum CloudVariant {
    #[default]
    Aws,
    /// AWS with short-lived STS credentials minted by ccoctl
    AwsSts,
    /// Same flow as `Aws`, separate template sized for ODF
    AwsOdf,
    Gcp,
    /// GCP workload identity federation
    GcpWif,
    Vsphere,
    Azure,
    /// Azure workload identity
    AzureWi,
    Alibaba,
}

impl CloudVariant {
    /// Parse a variant name, failing with the supported set on unknown input
    pub fn parse(name: &str) -> Result<Self> {
        name.trim()
            .parse::<Self>()
            .map_err(|_| InstallError::UnsupportedCloud {
                requested: name.to_string(),
                supported: Self::supported(),
            })
    }

    /// All variant names, in declaration order
    pub fn supported() -> Vec<String> {
        Self::iter().map(|v| v.to_string()).collect()
    }

    /// Name of the manifest template for this variant
    pub const fn template_name(self) -> &'static str {
        match self {
            Self::Aws => "aws_basic.tmpl",
            Self::AwsSts => "aws_sts.tmpl",
            Self::AwsOdf => "aws_odf.tmpl",
            Self::Gcp => "gcp_basic.tmpl",
            Self::GcpWif => "gcp_wif.tmpl",
            Self::Vsphere => "vsphere_basic.tmpl",
            Self::Azure => "azure_basic.tmpl",
            Self::AzureWi => "azure_wi.tmpl",
            Self::Alibaba => "alibaba_basic.tmpl",
        }
    }

    /// Ordered preparation steps run before create/destroy
    pub const fn preparation_steps(self) -> &'static [PrepStep] {
        use PrepStep::*;
        match self {
            Self::Aws | Self::AwsOdf | Self::Azure => &[ExtractTools],
            Self::AwsSts | Self::AzureWi => {
                &[ExtractTools, CreateManifests, ExtractCcoctl, ExecuteCcoctl]
            }
            Self::Gcp => &[ExtractTools, GcpServiceAccount],
            Self::GcpWif => &[
                GcpServiceAccount,
                ExtractTools,
                CreateManifests,
                ExtractCcoctl,
                ExecuteCcoctl,
            ],
            Self::Vsphere => &[ProbeVcenter, ExtractTools],
            Self::Alibaba => &[ExtractTools, CreateManifests, ExtractCcoctl, AlibabaRamUsers],
        }
    }

    /// Cloud name understood by ccoctl and `oc adm release extract --cloud`
    pub const fn credentials_cloud(self) -> &'static str {
        match self {
            Self::Aws | Self::AwsSts | Self::AwsOdf => "aws",
            Self::Gcp | Self::GcpWif => "gcp",
            Self::Vsphere => "vsphere",
            Self::Azure | Self::AzureWi => "azure",
            Self::Alibaba => "alibabacloud",
        }
    }

    /// Whether the `--name` handed to ccoctl must satisfy storage-account rules
    pub const fn requires_sanitized_name(self) -> bool {
        matches!(self, Self::AzureWi)
    }

    /// Infrastructure name shared by the manifest and ccoctl.
    ///
    /// Both the renderer and the pipeline call this so the two always agree.
    pub fn infra_name(self, cluster_name: &str) -> String {
        if self.requires_sanitized_name() {
            crate::tools::ccoctl::sanitize_name(cluster_name)
        } else {
            cluster_name.to_string()
        }
    }
}

impl TryFrom<String> for CloudVariant {
    type Error = InstallError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<CloudVariant> for String {
    fn from(value: CloudVariant) -> Self {
        value.to_string()
    }
}
