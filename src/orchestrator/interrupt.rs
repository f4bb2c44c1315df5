//! Operator interrupt handling.
//!
//! The signal listener only raises a flag. All teardown work runs on the
//! supervisor's main control flow, which checks the flag before each
//! spawn, while waiting for the first exit, and between shutdown steps.

use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{AppError, Result};

/// Records that an operator asked the supervisor to stop.
///
/// Clones share the same flag. Raising it more than once is harmless.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    token: CancellationToken,
}

impl InterruptFlag {
    /// Create a lowered flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an interrupt.
    pub fn raise(&self) {
        self.token.cancel();
    }

    /// Whether an interrupt was recorded.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once an interrupt is recorded (immediately if it already was).
    pub async fn raised(&self) {
        self.token.cancelled().await;
    }
}

/// Register SIGINT and SIGTERM handlers and spawn a task that raises
/// `flag` on the first of them.
///
/// Registration happens before this returns, so a signal arriving while
/// the supervisor is still spawning is already routed to the flag. After
/// the first signal the handlers stay registered and later signals are
/// absorbed.
///
/// # Errors
///
/// Returns `AppError::Io` if the SIGINT handler cannot be registered.
pub fn listen_for_interrupt(flag: InterruptFlag) -> Result<JoinHandle<()>> {
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|err| AppError::Io(format!("failed to register SIGINT handler: {err}")))?;
    let sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => Some(sigterm),
        Err(err) => {
            warn!(%err, "failed to register SIGTERM handler, using SIGINT only");
            None
        }
    };

    Ok(tokio::spawn(async move {
        match sigterm {
            Some(mut sigterm) => {
                tokio::select! {
                    _ = sigint.recv() => {}
                    _ = sigterm.recv() => {}
                }
            }
            None => {
                sigint.recv().await;
            }
        }
        info!("received interrupt, unlinking channels and exiting");
        flag.raise();
    }))
}
