//! Session aggregate and lifecycle helpers.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::channel::ChannelSet;
use crate::config::SupervisorConfig;
use crate::orchestrator::registry::ProcessRegistry;
use crate::{AppError, Result};

/// Lifecycle status for a supervisor session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Channels and log are being prepared.
    Provisioning,
    /// Workers are being spawned or are running.
    Running,
    /// Shutdown sequence in progress.
    ShuttingDown,
    /// Channels torn down; the session cannot be resumed.
    Closed,
}

/// One complete run of the supervisor, from provisioning to cleanup.
#[derive(Debug)]
pub struct Session {
    /// Unique session identifier, for log correlation.
    pub id: String,
    /// Start timestamp.
    pub started_at: DateTime<Utc>,
    /// Pid of the supervisor itself, handed to the watchdog.
    pub supervisor_pid: u32,
    /// Session log artifact.
    pub log_file: PathBuf,
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// Named channels owned by the session.
    pub channels: ChannelSet,
    /// Worker processes in spawn order.
    pub registry: ProcessRegistry,
}

impl Session {
    /// Construct a new session from configuration; nothing touches disk yet.
    #[must_use]
    pub fn new(config: &SupervisorConfig) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            supervisor_pid: std::process::id(),
            log_file: config.log_file.clone(),
            status: SessionStatus::Provisioning,
            channels: ChannelSet::new(&config.channels, config.channel_mode),
            registry: ProcessRegistry::new(),
        }
    }

    /// Determine whether a lifecycle transition is permitted.
    #[must_use]
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(
            (self.status, next),
            (SessionStatus::Provisioning, SessionStatus::Running)
                | (
                    SessionStatus::Provisioning | SessionStatus::Running,
                    SessionStatus::ShuttingDown
                )
                | (SessionStatus::ShuttingDown, SessionStatus::Closed)
        )
    }

    /// Move to `next`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the transition is not permitted.
    pub fn transition_to(&mut self, next: SessionStatus) -> Result<()> {
        if !self.can_transition_to(next) {
            return Err(AppError::Session(format!(
                "invalid session transition {:?} -> {next:?}",
                self.status
            )));
        }
        self.status = next;
        Ok(())
    }
}
