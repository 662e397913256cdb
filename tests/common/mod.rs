//! Shared fixtures for integration tests
//!
//! `RecordingRunner` stands in for real tools: it records every invocation
//! and answers with canned output, so tests can assert the exact sequence a
//! pipeline produces without touching a cloud.

#![allow(dead_code)]

use install_tools::command_executor::{CommandInvocation, CommandResult, CommandRunner};
use install_tools::config_file::InstallConfig;
use install_tools::installer::Installer;
use install_tools::template::EmbeddedTemplates;
use install_tools::types::{Action, CloudVariant};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const RELEASE_IMAGE: &str = "quay.io/openshift-release-dev/ocp-release:4.16.0-x86_64";
pub const CCO_DIGEST: &str = "quay.io/openshift-release-dev/ocp-v4.0-art-dev@sha256:0123abcd";
pub const SA_EMAIL: &str = "tester-development@proj-1.iam.gserviceaccount.com";
pub const SIMILAR_SA_EMAIL: &str = "tester-development-old@proj-1.iam.gserviceaccount.com";

pub const PULL_SECRET: &str = r#"{
  "auths": {
    "quay.io": { "auth": "dXNlcjpwYXNz", "email": "tester@example.com" },
    "registry.ci.openshift.org": { "auth": "Y2k6dG9rZW4=" }
  }
}
"#;

pub const SSH_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIExample tester@example.com\n";

/// Records invocations and returns canned results.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandInvocation>>,
    fail_on: Option<String>,
    existing_service_account: bool,
    similar_service_account: bool,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail (exit 1) the first invocation whose command line contains `needle`
    pub fn failing_on(needle: &str) -> Self {
        Self {
            fail_on: Some(needle.to_string()),
            ..Self::default()
        }
    }

    /// Pretend the GCP service account already exists
    pub fn with_existing_service_account() -> Self {
        Self {
            existing_service_account: true,
            ..Self::default()
        }
    }

    /// Pretend an unrelated `tester-development-old` account exists
    pub fn with_similar_service_account() -> Self {
        Self {
            similar_service_account: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<CommandInvocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls().iter().map(CommandInvocation::display_line).collect()
    }

    fn respond(&self, line: &str, history: &[CommandInvocation]) -> String {
        if line.contains("release info --image-for") {
            return CCO_DIGEST.to_string();
        }
        if line.starts_with("gcloud auth list") {
            return r#"[{"account":"tester@example.com","status":"ACTIVE"}]"#.to_string();
        }
        if line.starts_with("gcloud iam service-accounts list") {
            let created = history
                .iter()
                .any(|c| c.display_line().starts_with("gcloud iam service-accounts create"));
            let mut rows = Vec::new();
            if self.similar_service_account {
                rows.push(format!("tester-development-old\t{}\tproj-1", SIMILAR_SA_EMAIL));
            }
            if created || self.existing_service_account {
                rows.push(format!("tester-development\t{}\tproj-1", SA_EMAIL));
            }
            return rows.join("\n");
        }
        if line.starts_with("az account show") {
            return r#"{"id":"sub-0001","tenantId":"tenant-0002","name":"QE","isDefault":true}"#
                .to_string();
        }
        String::new()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &CommandInvocation) -> CommandResult {
        let line = invocation.display_line();
        let mut calls = self.calls.lock().unwrap();
        let stdout = self.respond(&line, &calls);
        calls.push(invocation.clone());

        if let Some(needle) = &self.fail_on {
            if line.contains(needle.as_str()) {
                return CommandResult {
                    stdout: String::new(),
                    stderr: format!("simulated failure: {}", needle),
                    exit_code: 1,
                    launched: true,
                };
            }
        }
        CommandResult {
            stdout,
            stderr: String::new(),
            exit_code: 0,
            launched: true,
        }
    }
}

/// Temp workspace holding secrets and an output dir
pub struct Workspace {
    pub dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pull-secret.json"), PULL_SECRET).unwrap();
        std::fs::write(dir.path().join("id_ed25519.pub"), SSH_KEY).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path().join("out")
    }

    pub fn pull_secret(&self) -> PathBuf {
        self.path().join("pull-secret.json")
    }

    pub fn config(&self, cloud: CloudVariant) -> InstallConfig {
        InstallConfig {
            action: Action::Create,
            cloud,
            cluster_name: "Tester-Cluster_01".to_string(),
            user_name: "tester".to_string(),
            output_dir: self.output_dir(),
            image: RELEASE_IMAGE.to_string(),
            ssh_public_key_file: self.path().join("id_ed25519.pub"),
            pull_secret_file: self.pull_secret(),
            iam_binding_pause_secs: 0,
            ..InstallConfig::default()
        }
    }
}

pub fn vcenter_up(_vcenter: &str) -> install_tools::Result<()> {
    Ok(())
}

pub fn vcenter_down(vcenter: &str) -> install_tools::Result<()> {
    Err(install_tools::InstallError::config(format!(
        "VCenter {} is not reachable. Please check your VPN connection and try again.",
        vcenter
    )))
}

pub fn installer(runner: &Arc<RecordingRunner>) -> Installer {
    let runner: Arc<dyn CommandRunner> = runner.clone();
    Installer::new(runner, Arc::new(EmbeddedTemplates)).with_vcenter_probe(vcenter_up)
}

/// Programs invoked, in order
pub fn programs(runner: &RecordingRunner) -> Vec<String> {
    runner.calls().into_iter().map(|c| c.program).collect()
}
