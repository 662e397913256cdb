//! Type-safe arguments for container-engine registry login.

use crate::tool_args::ToolArgs;
use crate::types::RegistryEngine;
use std::path::{Path, PathBuf};

/// `docker --config <dir> login <host>` or `podman login --authfile <file> <host>`.
///
/// The pull secret is the credential source: docker reads `config.json`
/// style auths from a directory, podman takes the file directly.
#[derive(Debug, Clone)]
pub struct RegistryLoginArgs {
    pub engine: RegistryEngine,
    pub pull_secret: PathBuf,
    pub registry: String,
}

impl ToolArgs for RegistryLoginArgs {
    fn program(&self) -> &str {
        self.engine.program()
    }

    fn to_cli_args(&self) -> Vec<String> {
        match self.engine {
            RegistryEngine::Docker => {
                let config_dir = self
                    .pull_secret
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or(Path::new("."));
                vec![
                    "--config".to_string(),
                    config_dir.display().to_string(),
                    "login".to_string(),
                    self.registry.clone(),
                ]
            }
            RegistryEngine::Podman => vec![
                "login".to_string(),
                "--authfile".to_string(),
                self.pull_secret.display().to_string(),
                self.registry.clone(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docker_login_uses_secret_dir() {
        let args = RegistryLoginArgs {
            engine: RegistryEngine::Docker,
            pull_secret: PathBuf::from("/home/me/secrets/pull.json"),
            registry: "example.com".to_string(),
        };
        assert_eq!(
            args.to_cli_args(),
            ["--config", "/home/me/secrets", "login", "example.com"]
        );
    }

    #[test]
    fn test_docker_login_bare_filename() {
        let args = RegistryLoginArgs {
            engine: RegistryEngine::Docker,
            pull_secret: PathBuf::from("pull.json"),
            registry: "quay.io".to_string(),
        };
        assert_eq!(args.to_cli_args()[1], ".");
    }

    #[test]
    fn test_podman_login_uses_authfile() {
        let args = RegistryLoginArgs {
            engine: RegistryEngine::Podman,
            pull_secret: PathBuf::from("/s/pull.json"),
            registry: "quay.io".to_string(),
        };
        assert_eq!(args.program(), "podman");
        assert_eq!(
            args.to_cli_args(),
            ["login", "--authfile", "/s/pull.json", "quay.io"]
        );
    }
}
