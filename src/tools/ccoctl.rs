//! Type-safe arguments for `./ccoctl`, the cloud credential issuer helper.

use crate::tool_args::ToolArgs;

/// The ccoctl binary extracted into the output dir
pub const CCOCTL: &str = "./ccoctl";

/// Longest name ccoctl accepts where it becomes a storage account name
pub const MAX_NAME_LEN: usize = 24;

/// Shortest such name
pub const MIN_NAME_LEN: usize = 3;

/// Directory ccoctl writes alibaba RAM-user manifests into
pub const ALIBABA_OUTPUT_DIR: &str = "./cco-manifests";

/// Reduce `name` to ccoctl's storage-account naming rules.
///
/// Lower-cases, drops everything but `[a-z0-9]`, truncates to 24 characters
/// and pads with `0` up to 3 characters.
///
/// ```
/// use install_tools::tools::ccoctl::sanitize_name;
///
/// assert_eq!(sanitize_name("My-Cluster_42!!"), "mycluster42");
/// assert_eq!(sanitize_name("a"), "a00");
/// ```
pub fn sanitize_name(name: &str) -> String {
    let mut sanitized: String = name
        .trim_end_matches('\n')
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .take(MAX_NAME_LEN)
        .collect();
    while sanitized.len() < MIN_NAME_LEN {
        sanitized.push('0');
    }
    sanitized
}

/// Provider-specific flags appended to `create-all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateAllExtras {
    Aws,
    Gcp {
        project: String,
    },
    Azure {
        subscription_id: String,
        tenant_id: String,
        dnszone_resource_group: String,
    },
}

impl CreateAllExtras {
    fn cloud(&self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Gcp { .. } => "gcp",
            Self::Azure { .. } => "azure",
        }
    }
}

/// `./ccoctl <cloud> create-all --name .. --region .. --credentials-requests-dir ..`
///
/// `--output-dir` is omitted so ccoctl writes into `./manifests`, where the
/// installer picks the files up without copying.
#[derive(Debug, Clone)]
pub struct CreateAllArgs {
    pub name: String,
    pub region: String,
    pub credentials_requests_dir: String,
    pub extras: CreateAllExtras,
}

impl ToolArgs for CreateAllArgs {
    fn program(&self) -> &str {
        CCOCTL
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec![
            self.extras.cloud().to_string(),
            "create-all".to_string(),
            "--name".to_string(),
            self.name.clone(),
            "--region".to_string(),
            self.region.clone(),
            "--credentials-requests-dir".to_string(),
            self.credentials_requests_dir.clone(),
        ];
        match &self.extras {
            CreateAllExtras::Aws => args.push("--create-private-s3-bucket".to_string()),
            CreateAllExtras::Gcp { project } => {
                args.push("--project".to_string());
                args.push(project.clone());
            }
            CreateAllExtras::Azure {
                subscription_id,
                tenant_id,
                dnszone_resource_group,
            } => {
                args.push("--subscription-id".to_string());
                args.push(subscription_id.clone());
                args.push("--dnszone-resource-group-name".to_string());
                args.push(dnszone_resource_group.clone());
                args.push("--tenant-id".to_string());
                args.push(tenant_id.clone());
            }
        }
        args
    }
}

/// `./ccoctl alibabacloud create-ram-users ...`
#[derive(Debug, Clone)]
pub struct CreateRamUsersArgs {
    pub name: String,
    pub region: String,
    pub credentials_requests_dir: String,
    pub output_dir: String,
}

impl ToolArgs for CreateRamUsersArgs {
    fn program(&self) -> &str {
        CCOCTL
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "alibabacloud".to_string(),
            "create-ram-users".to_string(),
            "--region".to_string(),
            self.region.clone(),
            "--name".to_string(),
            self.name.clone(),
            "--credentials-requests-dir".to_string(),
            self.credentials_requests_dir.clone(),
            "--output-dir".to_string(),
            self.output_dir.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("My-Cluster_42!!"), "mycluster42");
        assert_eq!(sanitize_name("!!"), "000");
        assert_eq!(sanitize_name("ab\n"), "ab0");
        assert_eq!(
            sanitize_name("averyveryverylongclusternamethatkeepsgoing"),
            "averyveryverylongcluster"
        );
    }

    #[test]
    fn test_sanitize_drops_non_ascii_letters() {
        // uppercase non-ASCII lowercases to a letter outside [a-z]
        assert_eq!(sanitize_name("ÄBC-def"), "bcdef");
    }

    #[test]
    fn test_create_all_azure_args() {
        let args = CreateAllArgs {
            name: "mycluster".to_string(),
            region: "eastus".to_string(),
            credentials_requests_dir: "./credRequests".to_string(),
            extras: CreateAllExtras::Azure {
                subscription_id: "sub".to_string(),
                tenant_id: "tenant".to_string(),
                dnszone_resource_group: "os4-common".to_string(),
            },
        };
        let cli = args.to_cli_args();
        assert_eq!(&cli[..2], ["azure", "create-all"]);
        assert!(cli.windows(2).any(|w| w == ["--name", "mycluster"]));
        assert!(cli.windows(2).any(|w| w == ["--subscription-id", "sub"]));
        assert!(cli.windows(2).any(|w| w == ["--tenant-id", "tenant"]));
        assert!(cli.windows(2).any(|w| w == ["--dnszone-resource-group-name", "os4-common"]));
    }

    #[test]
    fn test_create_all_aws_requests_private_bucket() {
        let args = CreateAllArgs {
            name: "c".to_string(),
            region: "us-east-1".to_string(),
            credentials_requests_dir: "./credRequests".to_string(),
            extras: CreateAllExtras::Aws,
        };
        let cli = args.to_cli_args();
        assert_eq!(cli[0], "aws");
        assert_eq!(cli.last().map(String::as_str), Some("--create-private-s3-bucket"));
    }
}
