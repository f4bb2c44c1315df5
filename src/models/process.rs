//! Per-process handle tracked by the registry.

use serde::{Deserialize, Serialize};

use super::role::Role;

/// Lifecycle state of a tracked worker process.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Not started, or the spawn failed.
    Pending,
    /// Spawned and not yet observed to exit.
    Running,
    /// Observed to exit; the handle is frozen from here on.
    Exited,
    /// A termination request was issued.
    KillAttempted,
}

/// One worker process of the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ProcessHandle {
    /// Role, unique within the session.
    pub role: Role,
    /// Executable that was launched (the terminal host for consoles).
    pub program: String,
    /// Resolved argument list, excluding argv\[0\].
    pub args: Vec<String>,
    /// Process identifier; `None` if the spawn failed.
    pub pid: Option<u32>,
    /// Current lifecycle state.
    pub state: ProcessState,
    /// Exit code once exited, if the process was not killed by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessHandle {
    /// Build a pending handle for a resolved command line.
    #[must_use]
    pub fn new(role: Role, program: String, args: Vec<String>) -> Self {
        Self {
            role,
            program,
            args,
            pid: None,
            state: ProcessState::Pending,
            exit_code: None,
        }
    }

    /// Full argv as handed to the OS, program first.
    #[must_use]
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    /// Whether the process was started and has not been seen to exit.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.pid.is_some()
            && matches!(self.state, ProcessState::Running | ProcessState::KillAttempted)
    }

    /// Determine whether a lifecycle transition is permitted.
    #[must_use]
    pub fn can_transition_to(&self, next: ProcessState) -> bool {
        matches!(
            (self.state, next),
            (ProcessState::Pending, ProcessState::Running)
                | (
                    ProcessState::Running,
                    ProcessState::Exited | ProcessState::KillAttempted
                )
                | (ProcessState::KillAttempted, ProcessState::Exited)
        )
    }
}
