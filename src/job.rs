//! Job Status Tracker
//!
//! Runs at most one install/destroy job at a time on a background thread and
//! exposes its progress to pollers.
//!
//! # State Flow
//!
//! ```text
//! Idle ──submit──▶ Running ──Ok──▶ Completed
//!                     │
//!                     └──Err / panic──▶ Error
//!
//! Completed | Error ──accept_new_configuration──▶ Idle
//! ```
//!
//! A new submission is also accepted from `Completed` or `Error`; only
//! `Running` refuses it.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config_file::InstallConfig;
use crate::error::{InstallError, Result};
use crate::installer::Installer;

/// Lifecycle of the tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
}

impl JobStatus {
    /// Returns true if this is a terminal state (Completed or Error)
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Whether the tracker may move from `self` to `to`
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Idle | Self::Completed | Self::Error, Self::Running)
                | (Self::Running, Self::Completed | Self::Error)
                | (Self::Completed | Self::Error, Self::Idle)
        )
    }
}

/// Refused state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobTransitionError {
    #[error("a job is already running")]
    AlreadyRunning,

    #[error("cannot move job from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
}

impl From<JobTransitionError> for InstallError {
    fn from(err: JobTransitionError) -> Self {
        InstallError::job(err.to_string())
    }
}

/// Point-in-time copy of the job record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub message: String,
    pub error: Option<String>,
}

/// The shared record. Plain data, so a poisoned lock is safe to reuse.
#[derive(Debug, Default)]
struct JobRecord {
    status: JobStatus,
    message: String,
    error: Option<String>,
}

impl JobRecord {
    fn transition(&mut self, to: JobStatus) -> std::result::Result<(), JobTransitionError> {
        if self.status == JobStatus::Running && to == JobStatus::Running {
            return Err(JobTransitionError::AlreadyRunning);
        }
        if !self.status.can_transition_to(to) {
            return Err(JobTransitionError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    fn start(&mut self) -> std::result::Result<(), JobTransitionError> {
        self.transition(JobStatus::Running)?;
        self.message = "Job started".to_string();
        self.error = None;
        Ok(())
    }

    fn finish(&mut self, outcome: Result<()>) {
        let to = if outcome.is_ok() {
            JobStatus::Completed
        } else {
            JobStatus::Error
        };
        if let Err(e) = self.transition(to) {
            warn!("Ignoring job outcome: {}", e);
            return;
        }
        match outcome {
            Ok(()) => {
                self.message = "Job completed".to_string();
                self.error = None;
            }
            Err(e) => {
                self.message = "Job failed".to_string();
                self.error = Some(e.to_string());
            }
        }
    }

    fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            status: self.status,
            message: self.message.clone(),
            error: self.error.clone(),
        }
    }
}

/// Single-flight job runner. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct JobTracker {
    record: Arc<Mutex<JobRecord>>,
}

/// Join handle for a submitted job.
#[derive(Debug)]
pub struct JobHandle {
    thread: Option<JoinHandle<()>>,
}

impl JobHandle {
    /// Block until the job thread has recorded its outcome.
    pub fn wait(self) {
        // the body's panics are caught inside the thread
        let Some(thread) = self.thread else {
            return;
        };
        if thread.join().is_err() {
            error!("Job thread terminated abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, JobRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start `body` on a background thread unless a job is already running.
    ///
    /// The record is `running` before this returns. Errors and panics from
    /// `body` end in the `error` state with their message.
    pub fn submit<F>(&self, body: F) -> std::result::Result<JobHandle, JobTransitionError>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.lock().start()?;
        info!("Job started");

        let record = Arc::clone(&self.record);
        let spawned = thread::Builder::new()
            .name("install-job".to_string())
            .spawn(move || {
                let outcome = match panic::catch_unwind(AssertUnwindSafe(body)) {
                    Ok(outcome) => outcome,
                    Err(payload) => Err(InstallError::unexpected(panic_message(payload.as_ref()))),
                };
                match &outcome {
                    Ok(()) => info!("Job completed"),
                    Err(e) => error!("Job failed: {}", e),
                }
                record
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .finish(outcome);
            });

        match spawned {
            Ok(thread) => Ok(JobHandle {
                thread: Some(thread),
            }),
            Err(e) => {
                // the job never ran; record that as its outcome
                self.lock().finish(Err(InstallError::unexpected(format!(
                    "could not spawn job thread: {}",
                    e
                ))));
                Ok(JobHandle { thread: None })
            }
        }
    }

    /// Submit `installer.run(config)` as the tracked job.
    pub fn submit_job(
        &self,
        installer: Installer,
        config: InstallConfig,
    ) -> std::result::Result<JobHandle, JobTransitionError> {
        self.submit(move || installer.run(&config))
    }

    /// Current status, message and error. Never blocks on the job itself.
    pub fn query_status(&self) -> JobSnapshot {
        self.lock().snapshot()
    }

    /// Clear a finished job so a new configuration can be accepted.
    pub fn accept_new_configuration(&self) -> std::result::Result<(), JobTransitionError> {
        let mut record = self.lock();
        if record.status == JobStatus::Idle {
            return Ok(());
        }
        if record.status == JobStatus::Running {
            return Err(JobTransitionError::AlreadyRunning);
        }
        record.transition(JobStatus::Idle)?;
        record.message.clear();
        record.error = None;
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "job panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(JobStatus::Idle.can_transition_to(JobStatus::Running));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Error));
        assert!(JobStatus::Completed.can_transition_to(JobStatus::Idle));
        assert!(!JobStatus::Idle.can_transition_to(JobStatus::Completed));
        assert!(!JobStatus::Running.can_transition_to(JobStatus::Idle));
        assert!(!JobStatus::Running.can_transition_to(JobStatus::Running));
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Idle.is_terminal());
    }

    #[test]
    fn test_record_refuses_double_start() {
        let mut record = JobRecord::default();
        record.start().unwrap();
        assert_eq!(record.start(), Err(JobTransitionError::AlreadyRunning));
    }

    #[test]
    fn test_record_finish_sets_error() {
        let mut record = JobRecord::default();
        record.start().unwrap();
        record.finish(Err(InstallError::config("bad")));
        let snap = record.snapshot();
        assert_eq!(snap.status, JobStatus::Error);
        assert_eq!(snap.error.as_deref(), Some("Configuration error: bad"));
    }

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "job panicked");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&JobStatus::Running).unwrap(), "\"running\"");
        assert_eq!(JobStatus::Completed.to_string(), "completed");
    }
}
