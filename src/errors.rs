//! Error types shared across the supervisor.

use std::fmt::{Display, Formatter};
use std::io;

use nix::errno::Errno;

/// Shared supervisor result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Supervisor error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Channel (FIFO) creation or removal failure.
    Channel(String),
    /// Worker process could not be started.
    Spawn(SpawnError),
    /// Termination request could not be delivered.
    Signal(String),
    /// Session lifecycle rule violated.
    Session(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Channel(msg) => write!(f, "channel: {msg}"),
            Self::Spawn(err) => write!(f, "spawn: {err}"),
            Self::Signal(msg) => write!(f, "signal: {msg}"),
            Self::Session(msg) => write!(f, "session: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<SpawnError> for AppError {
    fn from(err: SpawnError) -> Self {
        Self::Spawn(err)
    }
}

/// Why a worker process could not be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnError {
    /// No new execution context could be created (resource exhaustion).
    ForkFailed {
        /// Executable that was being launched.
        program: String,
        /// OS-reported reason.
        reason: String,
    },
    /// The child context was created but the executable could not be loaded.
    ExecFailed {
        /// Executable that was being launched.
        program: String,
        /// OS-reported reason.
        reason: String,
    },
}

impl SpawnError {
    /// Classify an I/O error returned by `Command::spawn`.
    ///
    /// `EAGAIN` and `ENOMEM` come from `fork`/`clone` itself; everything
    /// else is reported back by the child after `execvp` failed.
    #[must_use]
    pub fn from_io(program: &str, err: &io::Error) -> Self {
        let program = program.to_owned();
        let reason = err.to_string();
        match err.raw_os_error().map(Errno::from_raw) {
            Some(Errno::EAGAIN | Errno::ENOMEM) => Self::ForkFailed { program, reason },
            _ => Self::ExecFailed { program, reason },
        }
    }

    /// Executable the failed spawn referred to.
    #[must_use]
    pub fn program(&self) -> &str {
        match self {
            Self::ForkFailed { program, .. } | Self::ExecFailed { program, .. } => program,
        }
    }
}

impl Display for SpawnError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ForkFailed { program, reason } => {
                write!(f, "fork failed for {program}: {reason}")
            }
            Self::ExecFailed { program, reason } => {
                write!(f, "exec failed for {program}: {reason}")
            }
        }
    }
}

impl std::error::Error for SpawnError {}
