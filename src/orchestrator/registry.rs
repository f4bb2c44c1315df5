//! In-memory registry of the session's worker processes.

use tracing::debug;

use crate::models::{ProcessHandle, ProcessState, Role};
use crate::{AppError, Result};

/// Role to handle mapping, kept in spawn order.
///
/// Owned by the supervisor's single control flow for one session.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    handles: Vec<ProcessHandle>,
}

impl ProcessRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a handle.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the role is already registered.
    pub fn register(&mut self, handle: ProcessHandle) -> Result<()> {
        if self.get(handle.role).is_some() {
            return Err(AppError::Session(format!(
                "role {} already registered",
                handle.role
            )));
        }
        debug!(role = %handle.role, pid = ?handle.pid, "process registered");
        self.handles.push(handle);
        Ok(())
    }

    /// Handle for `role`, if registered.
    #[must_use]
    pub fn get(&self, role: Role) -> Option<&ProcessHandle> {
        self.handles.iter().find(|handle| handle.role == role)
    }

    /// All handles in insertion (spawn) order.
    #[must_use]
    pub fn all(&self) -> &[ProcessHandle] {
        &self.handles
    }

    /// Handles that were started and have not been seen to exit.
    pub fn live(&self) -> impl Iterator<Item = &ProcessHandle> {
        self.handles.iter().filter(|handle| handle.is_live())
    }

    /// Whether any tracked process is still live.
    #[must_use]
    pub fn has_live(&self) -> bool {
        self.live().next().is_some()
    }

    /// Pid of `role`, if it was spawned.
    #[must_use]
    pub fn pid(&self, role: Role) -> Option<u32> {
        self.get(role).and_then(|handle| handle.pid)
    }

    /// Pid of `role` as a decimal argument, or `absent_marker` if the
    /// role never obtained a pid.
    #[must_use]
    pub fn pid_arg(&self, role: Role, absent_marker: &str) -> String {
        self.pid(role)
            .map_or_else(|| absent_marker.to_owned(), |pid| pid.to_string())
    }

    /// Mark the process with `pid` as exited and return its role.
    ///
    /// Unknown pids and already-exited handles are ignored.
    pub fn mark_exited(&mut self, pid: u32, exit_code: Option<i32>) -> Option<Role> {
        let handle = self
            .handles
            .iter_mut()
            .find(|handle| handle.pid == Some(pid))?;

        if !handle.can_transition_to(ProcessState::Exited) {
            return None;
        }
        handle.state = ProcessState::Exited;
        handle.exit_code = exit_code;
        debug!(role = %handle.role, pid, ?exit_code, "process marked exited");
        Some(handle.role)
    }

    /// Record that a termination request was issued to `role`.
    ///
    /// Returns `false` if the handle is unknown or its state forbids it.
    pub fn mark_kill_attempted(&mut self, role: Role) -> bool {
        match self.handles.iter_mut().find(|handle| handle.role == role) {
            Some(handle) if handle.can_transition_to(ProcessState::KillAttempted) => {
                handle.state = ProcessState::KillAttempted;
                true
            }
            _ => false,
        }
    }
}
