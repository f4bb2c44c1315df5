//! Worker process spawner.
//!
//! Starts one executable with an exact argument list: no shell, no
//! expansion, the platform's usual `execvp` lookup. The spawner does not
//! track the process afterwards; the supervisor registers it and hands
//! the [`Child`] to an exit monitor.
//!
//! Exec failures are detected inside the child. The runtime reports the
//! `execvp` errno back over a close-on-exec pipe and the child exits
//! immediately, so a failed child never runs supervisor code.

use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::errors::SpawnError;

/// A freshly started worker.
#[derive(Debug)]
pub struct SpawnedProcess {
    /// OS process identifier.
    pub pid: u32,
    /// Handle used to await the exit. Dropping it does not kill the process.
    pub child: Child,
}

/// Spawn `program` with exactly `args` (argv\[0\] is `program` itself).
///
/// Does not block on the child. Standard streams are inherited so the
/// workers and their terminal hosts behave as if launched by hand.
///
/// # Errors
///
/// - [`SpawnError::ForkFailed`] when no new process could be created.
/// - [`SpawnError::ExecFailed`] when the executable could not be loaded.
pub fn spawn(program: &str, args: &[String]) -> Result<SpawnedProcess, SpawnError> {
    debug!(program, ?args, "spawning process");

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(false);

    let child = cmd
        .spawn()
        .map_err(|err| SpawnError::from_io(program, &err))?;

    let pid = child.id().ok_or_else(|| SpawnError::ExecFailed {
        program: program.to_owned(),
        reason: "spawned child reported no pid".into(),
    })?;

    info!(program, pid, "process spawned");
    Ok(SpawnedProcess { pid, child })
}
