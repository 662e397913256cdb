//! Type-safe arguments for `oc` release and image commands.

use crate::tool_args::ToolArgs;
use std::path::PathBuf;

/// Release component whose image carries the ccoctl binary
pub const CCO_COMPONENT: &str = "cloud-credential-operator";

/// Path of ccoctl inside the cloud-credential-operator image
pub const CCOCTL_IMAGE_PATH: &str = "/usr/bin/ccoctl";

/// Which `oc` binary to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcBinary {
    /// `oc` from `$PATH`, used before the release's own copy is extracted
    Host,
    /// `./oc` extracted from the release image into the output dir
    Extracted,
}

impl OcBinary {
    pub const fn program(self) -> &'static str {
        match self {
            Self::Host => "oc",
            Self::Extracted => "./oc",
        }
    }
}

/// What `oc adm release extract` should pull out of the release image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractTarget {
    /// A single client binary (`--command=<name>`)
    Command(String),
    /// CredentialsRequest manifests for one cloud into a directory
    CredentialsRequests { cloud: String, to: String },
}

/// Arguments for `oc adm -a <secret> release extract`.
#[derive(Debug, Clone)]
pub struct ReleaseExtractArgs {
    pub oc: OcBinary,
    pub pull_secret: PathBuf,
    pub image: String,
    pub target: ExtractTarget,
}

impl ToolArgs for ReleaseExtractArgs {
    fn program(&self) -> &str {
        self.oc.program()
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec![
            "adm".to_string(),
            "-a".to_string(),
            self.pull_secret.display().to_string(),
            "release".to_string(),
            "extract".to_string(),
        ];
        match &self.target {
            ExtractTarget::Command(name) => args.push(format!("--command={}", name)),
            ExtractTarget::CredentialsRequests { cloud, to } => {
                args.push("--credentials-requests".to_string());
                args.push("--cloud".to_string());
                args.push(cloud.clone());
                args.push("--to".to_string());
                args.push(to.clone());
            }
        }
        args.push(self.image.clone());
        args
    }
}

/// Arguments for `./oc adm -a <secret> release info --image-for <component>`.
#[derive(Debug, Clone)]
pub struct ReleaseInfoArgs {
    pub pull_secret: PathBuf,
    pub image: String,
    pub component: String,
}

impl ToolArgs for ReleaseInfoArgs {
    fn program(&self) -> &str {
        OcBinary::Extracted.program()
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "adm".to_string(),
            "-a".to_string(),
            self.pull_secret.display().to_string(),
            "release".to_string(),
            "info".to_string(),
            "--image-for".to_string(),
            self.component.clone(),
            self.image.clone(),
        ]
    }
}

/// Arguments for `./oc image -a <secret> extract --file <path> --confirm <image>`.
#[derive(Debug, Clone)]
pub struct ImageExtractArgs {
    pub pull_secret: PathBuf,
    pub file: String,
    pub image: String,
}

impl ToolArgs for ImageExtractArgs {
    fn program(&self) -> &str {
        OcBinary::Extracted.program()
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "image".to_string(),
            "-a".to_string(),
            self.pull_secret.display().to_string(),
            "extract".to_string(),
            "--file".to_string(),
            self.file.clone(),
            "--confirm".to_string(),
            self.image.clone(),
        ]
    }
}
