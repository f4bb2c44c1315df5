//! Named FIFO set shared between the workers.
//!
//! The supervisor never opens these channels; it only owns their
//! lifecycle. Creation and removal failures are logged and never fatal:
//! a worker that depends on a missing channel fails on its own when it
//! tries to open it.

use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use tracing::{error, info, warn};

use crate::config::ChannelConfig;
use crate::AppError;

/// Existence state of one channel on disk, as far as the supervisor knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Not created (yet, or creation failed).
    Absent,
    /// Present on disk, created now or left over from an earlier session.
    Created,
    /// Removed during teardown, or found already gone.
    Removed,
}

/// One FIFO of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Producer/consumer pair, for logs.
    pub role: String,
    /// Filesystem path.
    pub path: PathBuf,
    /// Current state.
    pub state: ChannelState,
}

/// Outcome of [`ChannelSet::provision`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Channels freshly created.
    pub created: Vec<PathBuf>,
    /// Channels that already existed on disk.
    pub stale: Vec<PathBuf>,
    /// Channels that could not be created.
    pub failed: Vec<PathBuf>,
}

/// Outcome of [`ChannelSet::teardown`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    /// Channels removed by this call.
    pub removed: Vec<PathBuf>,
    /// Channels that were already gone.
    pub missing: Vec<PathBuf>,
    /// Channels whose removal failed for another reason.
    pub failed: Vec<PathBuf>,
}

/// The session's set of named channels.
#[derive(Debug)]
pub struct ChannelSet {
    channels: Vec<Channel>,
    mode: Mode,
    torn_down: bool,
}

impl ChannelSet {
    /// Build a channel set from explicit definitions; nothing touches disk yet.
    #[must_use]
    pub fn new(defs: &[ChannelConfig], mode: u32) -> Self {
        let channels = defs
            .iter()
            .map(|def| Channel {
                role: def.role.clone(),
                path: def.path.clone(),
                state: ChannelState::Absent,
            })
            .collect();

        Self {
            channels,
            mode: Mode::from_bits_truncate(mode),
            torn_down: false,
        }
    }

    /// Create every FIFO.
    ///
    /// An existing entry is logged as a stale artifact and treated as
    /// created. Any other failure leaves that channel absent. A set that
    /// was already torn down is never provisioned again.
    pub fn provision(&mut self) -> ProvisionReport {
        let mut report = ProvisionReport::default();

        if self.torn_down {
            warn!("channel set already torn down; refusing to provision a closed session");
            return report;
        }

        let mode = self.mode;
        for channel in &mut self.channels {
            match mkfifo(&channel.path, mode) {
                Ok(()) => {
                    info!(role = %channel.role, path = %channel.path.display(), "channel created");
                    channel.state = ChannelState::Created;
                    report.created.push(channel.path.clone());
                }
                Err(Errno::EEXIST) => {
                    warn!(
                        role = %channel.role,
                        path = %channel.path.display(),
                        "cannot create fifo, already existing; reusing stale channel"
                    );
                    if !is_fifo(&channel.path) {
                        warn!(
                            path = %channel.path.display(),
                            "stale channel path is not a fifo"
                        );
                    }
                    channel.state = ChannelState::Created;
                    report.stale.push(channel.path.clone());
                }
                Err(errno) => {
                    let err = AppError::Channel(format!(
                        "cannot create fifo {}: {errno}",
                        channel.path.display()
                    ));
                    error!(role = %channel.role, %err, "channel left absent");
                    report.failed.push(channel.path.clone());
                }
            }
        }

        report
    }

    /// Remove every FIFO, regardless of how provisioning went.
    ///
    /// Each failure is logged on its own and the loop always continues.
    /// Safe to call more than once; later calls report the channels as
    /// already removed.
    pub fn teardown(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();
        self.torn_down = true;

        for channel in &mut self.channels {
            match fs::remove_file(&channel.path) {
                Ok(()) => {
                    info!(path = %channel.path.display(), "channel removed");
                    channel.state = ChannelState::Removed;
                    report.removed.push(channel.path.clone());
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    warn!(
                        path = %channel.path.display(),
                        %err,
                        "can't unlink channel, already removed"
                    );
                    channel.state = ChannelState::Removed;
                    report.missing.push(channel.path.clone());
                }
                Err(err) => {
                    let err = AppError::Channel(format!(
                        "can't unlink {}: {err}",
                        channel.path.display()
                    ));
                    error!(role = %channel.role, %err, "channel left on disk");
                    report.failed.push(channel.path.clone());
                }
            }
        }

        report
    }

    /// All channels in definition order.
    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// State of the channel at `path`, if it belongs to this set.
    #[must_use]
    pub fn state(&self, path: &Path) -> Option<ChannelState> {
        self.channels
            .iter()
            .find(|channel| channel.path == path)
            .map(|channel| channel.state)
    }

    /// Whether every channel ended in the removed state.
    #[must_use]
    pub fn all_removed(&self) -> bool {
        self.channels
            .iter()
            .all(|channel| channel.state == ChannelState::Removed)
    }

    /// Whether [`teardown`](Self::teardown) has run at least once.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

fn is_fifo(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_fifo())
}
