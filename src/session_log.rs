//! Session log artifact shared with the workers.
//!
//! The supervisor never writes to it; it only makes sure each session
//! starts from an empty file.

use std::fs::OpenOptions;
use std::path::Path;

use tracing::{error, info};

use crate::{AppError, Result};

/// Truncate the session log, creating it if absent.
///
/// # Errors
///
/// Returns `AppError::Io` if the file cannot be created or cleared. The
/// supervisor logs this and carries on.
pub fn reset(path: &Path) -> Result<()> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|err| {
            AppError::Io(format!(
                "log file {} not cleared: {err}",
                path.display()
            ))
        })?;

    info!(path = %path.display(), "session log reset");
    Ok(())
}

/// [`reset`] the log, logging any failure. Returns whether it succeeded.
pub fn reset_or_warn(path: &Path) -> bool {
    match reset(path) {
        Ok(()) => true,
        Err(err) => {
            error!(%err, "session log reset failed; continuing");
            false
        }
    }
}
