//! Type-safe arguments for the `gcloud` calls made before GCP installs.

use crate::tool_args::ToolArgs;
use std::path::PathBuf;

/// Roles bound to the ephemeral installer service account
pub const INSTALLER_ROLES: &[&str] = &[
    "roles/compute.admin",
    "roles/iam.securityAdmin",
    "roles/iam.serviceAccountAdmin",
    "roles/iam.serviceAccountKeyAdmin",
    "roles/iam.serviceAccountUser",
    "roles/storage.admin",
    "roles/dns.admin",
    "roles/compute.loadBalancerAdmin",
    "roles/iam.roleViewer",
    "roles/iam.workloadIdentityPoolAdmin",
];

/// Columns requested from `gcloud iam service-accounts list`
pub const SERVICE_ACCOUNT_FORMAT: &str = "value(displayName,email,projectId)";

/// One `gcloud` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GcloudArgs {
    /// `gcloud auth list --format json`
    AuthList,
    /// `gcloud iam service-accounts list --filter displayName:<name>`, one
    /// tab-separated `displayName email projectId` row per account.
    ///
    /// The filter is a substring match; see [`ServiceAccount::exact`].
    ServiceAccountList { display_name: String },
    /// `gcloud iam service-accounts create <name> --display-name <name>`
    ServiceAccountCreate { name: String },
    /// `gcloud projects add-iam-policy-binding <project> ...`
    AddPolicyBinding {
        project: String,
        email: String,
        role: String,
    },
    /// `gcloud iam service-accounts keys create <file> --iam-account <email>`
    KeyCreate { output: PathBuf, email: String },
}

impl ToolArgs for GcloudArgs {
    fn program(&self) -> &str {
        "gcloud"
    }

    fn to_cli_args(&self) -> Vec<String> {
        match self {
            Self::AuthList => ["auth", "list", "--format", "json"]
                .map(String::from)
                .to_vec(),
            Self::ServiceAccountList { display_name } => vec![
                "iam".into(),
                "service-accounts".into(),
                "list".into(),
                "--filter".into(),
                format!("displayName:{}", display_name),
                "--format".into(),
                SERVICE_ACCOUNT_FORMAT.into(),
            ],
            Self::ServiceAccountCreate { name } => vec![
                "iam".into(),
                "service-accounts".into(),
                "create".into(),
                name.clone(),
                "--display-name".into(),
                name.clone(),
            ],
            Self::AddPolicyBinding {
                project,
                email,
                role,
            } => vec![
                "projects".into(),
                "add-iam-policy-binding".into(),
                project.clone(),
                "--member".into(),
                format!("serviceAccount:{}", email),
                "--role".into(),
                role.clone(),
                "--condition".into(),
                "None".into(),
            ],
            Self::KeyCreate { output, email } => vec![
                "iam".into(),
                "service-accounts".into(),
                "keys".into(),
                "create".into(),
                output.display().to_string(),
                "--iam-account".into(),
                email.clone(),
            ],
        }
    }
}

/// Returns true if `gcloud auth list --format json` shows an ACTIVE account.
pub fn has_active_account(auth_list_json: &str) -> serde_json::Result<bool> {
    let entries: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_str(auth_list_json)?;
    Ok(entries
        .iter()
        .any(|entry| entry.get("status").and_then(|s| s.as_str()) == Some("ACTIVE")))
}

/// A row of `gcloud iam service-accounts list` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAccount {
    pub display_name: String,
    pub email: String,
    pub project_id: String,
}

impl ServiceAccount {
    /// Parse [`SERVICE_ACCOUNT_FORMAT`] output. Rows without all three
    /// columns are skipped.
    pub fn parse_list(output: &str) -> Vec<ServiceAccount> {
        output
            .lines()
            .filter_map(|line| {
                let mut cols = line.split('\t').map(str::trim);
                match (cols.next(), cols.next(), cols.next()) {
                    (Some(display_name), Some(email), Some(project_id))
                        if !display_name.is_empty() && !email.is_empty() =>
                    {
                        Some(ServiceAccount {
                            display_name: display_name.to_string(),
                            email: email.to_string(),
                            project_id: project_id.to_string(),
                        })
                    }
                    _ => None,
                }
            })
            .collect()
    }

    /// Accounts whose display name is exactly `name`.
    pub fn exact(accounts: Vec<ServiceAccount>, name: &str) -> Vec<ServiceAccount> {
        accounts
            .into_iter()
            .filter(|account| account.display_name == name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_account_detection() {
        let json = r#"[{"account":"a@x","status":""},{"account":"b@x","status":"ACTIVE"}]"#;
        assert!(has_active_account(json).unwrap());
        assert!(!has_active_account(r#"[{"account":"a@x","status":""}]"#).unwrap());
        assert!(!has_active_account("[]").unwrap());
        assert!(has_active_account("not json").is_err());
    }

    #[test]
    fn test_service_account_list_filter() {
        let args = GcloudArgs::ServiceAccountList {
            display_name: "bob-development".to_string(),
        };
        let cli = args.to_cli_args();
        assert!(cli.contains(&"displayName:bob-development".to_string()));
        assert_eq!(cli.last().map(String::as_str), Some(SERVICE_ACCOUNT_FORMAT));
    }

    #[test]
    fn test_exact_ignores_similar_names() {
        let output = "bob-development-old\tbob-development-old@p.iam.gserviceaccount.com\tp\n\
                      bob-development\tbob-development@p.iam.gserviceaccount.com\tp\n\
                      \n\
                      truncated-row\n";
        let accounts = ServiceAccount::parse_list(output);
        assert_eq!(accounts.len(), 2);

        let exact = ServiceAccount::exact(accounts, "bob-development");
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].email, "bob-development@p.iam.gserviceaccount.com");
        assert_eq!(exact[0].project_id, "p");
    }
}
