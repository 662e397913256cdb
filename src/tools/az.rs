//! `az account show`, used to fill in ccoctl's Azure subscription flags.

use crate::tool_args::ToolArgs;
use serde::Deserialize;

/// `az account show -o json`
#[derive(Debug, Clone, Default)]
pub struct AccountShowArgs;

impl ToolArgs for AccountShowArgs {
    fn program(&self) -> &str {
        "az"
    }

    fn to_cli_args(&self) -> Vec<String> {
        ["account", "show", "-o", "json"].map(String::from).to_vec()
    }
}

/// The parts of `az account show` output the pipeline needs.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AzureAccount {
    /// Subscription ID
    pub id: String,
    pub tenant_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
}

impl AzureAccount {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
