//! Child exit monitoring.
//!
//! Each spawned worker gets a task that awaits its exit and reports a
//! single [`ChildExit`] on a shared channel. The supervisor consumes the
//! first event as the shutdown trigger and drains the rest to keep the
//! registry current.

use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::models::Role;

/// A worker process terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildExit {
    /// Role of the exited process.
    pub role: Role,
    /// Pid of the exited process.
    pub pid: u32,
    /// Exit code, if the process was not terminated by a signal.
    pub exit_code: Option<i32>,
    /// Human-readable reason.
    pub reason: String,
}

/// Receiving side of the exit channel plus the token stopping all monitors.
#[derive(Debug)]
pub struct ExitWatch {
    tx: Option<mpsc::UnboundedSender<ChildExit>>,
    rx: mpsc::UnboundedReceiver<ChildExit>,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Default for ExitWatch {
    fn default() -> Self {
        Self::new()
    }
}

impl ExitWatch {
    /// Create a watch with no monitored children.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx: Some(tx),
            rx,
            cancel: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    /// Sender for injecting exit events; `None` once [`seal`](Self::seal) ran.
    #[must_use]
    pub fn sender(&self) -> Option<mpsc::UnboundedSender<ChildExit>> {
        self.tx.clone()
    }

    /// Start monitoring `child`.
    pub fn watch(&mut self, role: Role, pid: u32, child: Child) {
        if let Some(tx) = &self.tx {
            let handle = monitor_exit(role, pid, child, tx.clone(), self.cancel.clone());
            self.handles.push(handle);
        } else {
            warn!(%role, pid, "exit watch sealed; child not monitored");
        }
    }

    /// Drop the watch's own sender so the channel closes once every
    /// monitor has finished.
    pub fn seal(&mut self) {
        self.tx = None;
    }

    /// Number of monitors started.
    #[must_use]
    pub fn monitored(&self) -> usize {
        self.handles.len()
    }

    /// Wait for the next exit. `None` when no monitor can report anymore.
    pub async fn next_exit(&mut self) -> Option<ChildExit> {
        self.rx.recv().await
    }

    /// Collect exits that were already reported, without waiting.
    pub fn drain(&mut self) -> Vec<ChildExit> {
        let mut exits = Vec::new();
        while let Ok(exit) = self.rx.try_recv() {
            exits.push(exit);
        }
        exits
    }

    /// Stop every monitor. The children keep running.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        self.tx = None;
    }
}

/// Spawn a background task that awaits child-process exit and reports it.
///
/// When `cancel` fires the task returns without reporting; the child is
/// left running.
#[must_use]
pub fn monitor_exit(
    role: Role,
    pid: u32,
    mut child: Child,
    exit_tx: mpsc::UnboundedSender<ChildExit>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = child.wait() => {
                let (exit_code, reason) = match result {
                    Ok(status) => {
                        let code = status.code();
                        let reason = code.map_or_else(
                            || "process terminated by signal".to_owned(),
                            |c| format!("process exited with code {c}"),
                        );
                        (code, reason)
                    }
                    Err(err) => {
                        warn!(%role, pid, %err, "error waiting for child process");
                        (None, format!("wait error: {err}"))
                    }
                };

                info!(%role, pid, reason = %reason, "child process exited");

                let exit = ChildExit { role, pid, exit_code, reason };
                if exit_tx.send(exit).is_err() {
                    warn!(%role, pid, "exit channel closed before exit could be reported");
                }
            }
            () = cancel.cancelled() => {
                info!(%role, pid, "exit monitor cancelled");
            }
        }
    })
}
