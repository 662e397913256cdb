//! command_executor.rs - Runs external provisioning tools and captures their output.
//!
//! Every tool invocation in the crate funnels through [`CommandRunner`]. The
//! production [`SystemRunner`] blocks until the child exits, captures stdout and
//! stderr into separate buffers, and resolves a single numeric exit code so that
//! callers never see platform-specific wait statuses.

use crate::error::{InstallError, Result};
use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, info, warn};

/// Exit code reported when a program could not be launched at all.
pub const DEFAULT_FAILED_CODE: i32 = 1;

/// A single external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub program: String,
    pub work_dir: Option<PathBuf>,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl CommandInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            work_dir: None,
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn envs(mut self, env: &[(String, String)]) -> Self {
        self.env.extend(env.iter().cloned());
        self
    }

    /// Command line as a human would type it, for logs and dry-run hints
    pub fn display_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Captured outcome of a finished (or unlaunchable) program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Trimmed standard output.
    pub stdout: String,
    /// Trimmed standard error, or the launch error when the program never started.
    pub stderr: String,
    /// Exit code; `128 + signal` when killed by a signal.
    pub exit_code: i32,
    /// False when the program could not be started.
    pub launched: bool,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turn a non-zero exit into the matching error.
    pub fn ensure_success(self, program: &str) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        if !self.launched {
            return Err(InstallError::Launch {
                program: program.to_string(),
                reason: self.stderr,
            });
        }
        Err(InstallError::ToolFailed {
            program: program.to_string(),
            code: self.exit_code,
            stderr: self.stderr,
        })
    }
}

/// Seam between orchestration logic and real processes.
pub trait CommandRunner: Send + Sync {
    /// Run the invocation to completion. Never fails: launch problems are
    /// reported through the result.
    fn run(&self, invocation: &CommandInvocation) -> CommandResult;

    /// Run and treat any non-zero exit as fatal to the calling step.
    fn run_checked(&self, invocation: &CommandInvocation) -> Result<CommandResult> {
        self.run(invocation).ensure_success(&invocation.program)
    }
}

/// Runs programs on the local host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &CommandInvocation) -> CommandResult {
        run_command(invocation)
    }
}

/// Execute a program synchronously, capturing stdout and stderr separately.
pub fn run_command(invocation: &CommandInvocation) -> CommandResult {
    info!(
        program = %invocation.program,
        dir = ?invocation.work_dir,
        "run command: {}",
        invocation.display_line()
    );

    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .own_process_group();
    if let Some(dir) = &invocation.work_dir {
        cmd.current_dir(dir);
    }

    let result = match cmd.spawn() {
        Ok(child) => {
            let pid = child.id();
            ChildRegistry::with_global(|registry| registry.register(pid));
            let waited = child.wait_with_output();
            ChildRegistry::with_global(|registry| registry.unregister(pid));

            match waited {
                Ok(output) => CommandResult {
                    stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                    exit_code: exit_code_of(output.status),
                    launched: true,
                },
                Err(e) => {
                    warn!("Failed waiting for {}: {}", invocation.program, e);
                    CommandResult {
                        stdout: String::new(),
                        stderr: e.to_string(),
                        exit_code: DEFAULT_FAILED_CODE,
                        launched: true,
                    }
                }
            }
        }
        Err(e) => {
            warn!("Could not launch {}: {}", invocation.program, e);
            CommandResult {
                stdout: String::new(),
                stderr: e.to_string(),
                exit_code: DEFAULT_FAILED_CODE,
                launched: false,
            }
        }
    };

    debug!(
        "command result, stdout: {:?}, stderr: {:?}, exit_code: {}",
        result.stdout, result.stderr, result.exit_code
    );
    result
}

/// Collapse an exit status into one code.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    use std::os::unix::process::ExitStatusExt;
    status
        .signal()
        .map(|sig| 128 + sig)
        .unwrap_or(DEFAULT_FAILED_CODE)
}
