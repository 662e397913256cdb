//! Stopping external tools together with the control process.
//!
//! Jobs cannot be cancelled, so the only stop button is killing `install-tool`
//! itself. Every tool runs as the leader of its own process group and is
//! recorded in [`ChildRegistry`]; the signal thread drains the registry and
//! takes each group down, so an `openshift-install` half way through a create
//! does not keep talking to the cloud on its own.

use nix::libc;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::BTreeSet;
use std::io;
use std::os::unix::process::CommandExt;
use std::process::Command;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

/// How long a tool gets to exit after SIGTERM before it is killed
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

static RUNNING: OnceLock<Mutex<ChildRegistry>> = OnceLock::new();

/// Process group ids of the tools currently running.
#[derive(Debug, Default)]
pub struct ChildRegistry {
    groups: BTreeSet<u32>,
}

impl ChildRegistry {
    /// Lock the process-wide registry and run `f` on it.
    pub fn with_global<R>(f: impl FnOnce(&mut ChildRegistry) -> R) -> R {
        let lock = RUNNING.get_or_init(Mutex::default);
        let mut registry = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut registry)
    }

    pub fn register(&mut self, pgid: u32) {
        debug!("tool group {} started", pgid);
        self.groups.insert(pgid);
    }

    pub fn unregister(&mut self, pgid: u32) {
        debug!("tool group {} finished", pgid);
        self.groups.remove(&pgid);
    }

    pub fn count(&self) -> usize {
        self.groups.len()
    }

    fn drain(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.groups).into_iter().collect()
    }
}

/// Stop every registered tool: SIGTERM each group, then SIGKILL whatever is
/// still there after `grace`. Returns the number of groups signalled.
///
/// The registry is emptied first, so a second call finds nothing to do.
pub fn stop_running_tools(grace: Duration) -> usize {
    let groups = ChildRegistry::with_global(ChildRegistry::drain);
    stop_groups(&groups, grace);
    groups.len()
}

fn stop_groups(groups: &[u32], grace: Duration) {
    if groups.is_empty() {
        return;
    }
    info!("Stopping {} running tool(s)", groups.len());
    for &pgid in groups {
        if let Err(e) = signal_group(pgid, Some(Signal::SIGTERM)) {
            debug!("SIGTERM to group {}: {}", pgid, e);
        }
    }

    let deadline = Instant::now() + grace;
    while Instant::now() < deadline {
        if !groups.iter().any(|&pgid| group_exists(pgid)) {
            return;
        }
        thread::sleep(Duration::from_millis(100));
    }

    for &pgid in groups.iter().filter(|&&pgid| group_exists(pgid)) {
        warn!("Tool group {} ignored SIGTERM, killing it", pgid);
        if let Err(e) = signal_group(pgid, Some(Signal::SIGKILL)) {
            warn!("SIGKILL to group {}: {}", pgid, e);
        }
    }
}

fn signal_group(pgid: u32, sig: Option<Signal>) -> nix::Result<()> {
    let pgid = i32::try_from(pgid).map_err(|_| nix::errno::Errno::ESRCH)?;
    signal::kill(Pid::from_raw(-pgid), sig)
}

/// A null signal to the group succeeds while any member is left.
fn group_exists(pgid: u32) -> bool {
    signal_group(pgid, None).is_ok()
}

/// Spawn a thread that stops running tools and exits on SIGINT, SIGTERM or
/// SIGHUP. Call once, early in `main`.
pub fn init_signal_handlers() -> io::Result<()> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;
    thread::Builder::new()
        .name("signal-handler".to_string())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                info!("Received signal {}", sig);
                stop_running_tools(SHUTDOWN_GRACE);
                std::process::exit(128 + sig);
            }
        })?;
    Ok(())
}

/// Start a [`Command`] as its own process group leader.
pub trait CommandProcessGroup {
    /// The child also gets SIGTERM if this process dies first.
    fn own_process_group(&mut self) -> &mut Self;
}

impl CommandProcessGroup for Command {
    fn own_process_group(&mut self) -> &mut Self {
        // SAFETY: setpgid and prctl are async-signal-safe
        unsafe {
            self.pre_exec(|| {
                nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0))
                    .map_err(io::Error::other)?;
                if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM) == -1 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }
        self
    }
}
