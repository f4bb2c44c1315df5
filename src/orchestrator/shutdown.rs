//! Cascading shutdown state machine.
//!
//! ```text
//! Idle -> Terminating(motor-x) -> ... -> Terminating(watchdog) -> CleaningUp -> Done
//!  \______________________ interrupt ______________________/^
//! ```
//!
//! Every step waits the pacing interval and then sends SIGINT to one role
//! in [`Role::ORDER`], regardless of which process exited first. The
//! pacing is a heuristic window for each worker to react before the next
//! one is disturbed; it does not confirm that the worker stopped. An
//! operator interrupt abandons the cascade and goes straight to channel
//! cleanup.

use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::{error, info, info_span, warn, Instrument};

use crate::channel::TeardownReport;
use crate::models::{Role, Session, SessionStatus};
use crate::orchestrator::exit_monitor::{ChildExit, ExitWatch};
use crate::orchestrator::interrupt::InterruptFlag;
use crate::{AppError, Result};

/// Delivers a cooperative stop request to one process.
pub trait Signaller: Send + Sync {
    /// Ask the process `pid` playing `role` to stop.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Signal` if the request could not be delivered.
    fn interrupt(&self, role: Role, pid: u32) -> Result<()>;
}

/// Sends `SIGINT`, never a forceful kill.
#[derive(Debug, Clone, Copy, Default)]
pub struct SigintSignaller;

impl Signaller for SigintSignaller {
    fn interrupt(&self, role: Role, pid: u32) -> Result<()> {
        let raw = i32::try_from(pid)
            .map_err(|_| AppError::Signal(format!("pid {pid} of {role} out of range")))?;
        kill(Pid::from_raw(raw), Signal::SIGINT)
            .map_err(|errno| AppError::Signal(format!("failed to kill {role} (pid {pid}): {errno}")))
    }
}

/// Position of the controller in the shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    /// Not started.
    Idle,
    /// Handling the given role.
    Terminating(Role),
    /// Removing channels.
    CleaningUp,
    /// Finished; the supervisor may exit.
    Done,
}

/// What started the shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownTrigger {
    /// A tracked process exited.
    FirstExit(ChildExit),
    /// Nothing was running to wait for (every spawn failed).
    NoLiveProcesses,
    /// The operator interrupted the supervisor.
    Interrupted,
}

/// Record of one shutdown run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Why shutdown ran.
    pub trigger: ShutdownTrigger,
    /// States visited, in order, starting at `Idle`.
    pub states: Vec<ShutdownState>,
    /// Roles a termination request was delivered to, in order.
    pub signalled: Vec<Role>,
    /// Roles skipped because they had no pid or had already exited.
    pub skipped: Vec<Role>,
    /// Roles whose termination request could not be delivered.
    pub failed: Vec<Role>,
    /// Whether an interrupt cut the cascade short.
    pub cut_short: bool,
    /// Channel cleanup outcome.
    pub teardown: TeardownReport,
}

impl ShutdownReport {
    fn new(trigger: ShutdownTrigger) -> Self {
        Self {
            trigger,
            states: vec![ShutdownState::Idle],
            signalled: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            cut_short: false,
            teardown: TeardownReport::default(),
        }
    }

    fn enter(&mut self, state: ShutdownState) {
        info!(?state, "shutdown state");
        self.states.push(state);
    }

    /// Final state reached.
    #[must_use]
    pub fn final_state(&self) -> ShutdownState {
        self.states.last().copied().unwrap_or(ShutdownState::Idle)
    }
}

/// Drives the paced termination cascade and the channel cleanup.
pub struct ShutdownController {
    pacing: Duration,
    signaller: Box<dyn Signaller>,
}

impl std::fmt::Debug for ShutdownController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownController")
            .field("pacing", &self.pacing)
            .finish_non_exhaustive()
    }
}

impl ShutdownController {
    /// Build a controller with a custom signaller.
    #[must_use]
    pub fn new(pacing: Duration, signaller: Box<dyn Signaller>) -> Self {
        Self { pacing, signaller }
    }

    /// Build a controller that sends real `SIGINT`s.
    #[must_use]
    pub fn with_sigint(pacing: Duration) -> Self {
        Self::new(pacing, Box::new(SigintSignaller))
    }

    /// Pacing interval preceding each step.
    #[must_use]
    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Run the full cascade, then clean up the channels.
    ///
    /// Exits already reported on `exits` are folded into the registry
    /// immediately before each signal so finished processes are not
    /// signalled. If
    /// `interrupt` is raised mid-cascade, the remaining roles are left
    /// alone and cleanup starts at once.
    pub async fn run(
        &self,
        session: &mut Session,
        exits: &mut ExitWatch,
        interrupt: &InterruptFlag,
        trigger: ShutdownTrigger,
    ) -> ShutdownReport {
        let span = info_span!("shutdown", session_id = %session.id);
        self.cascade(session, exits, interrupt, trigger)
            .instrument(span)
            .await
    }

    async fn cascade(
        &self,
        session: &mut Session,
        exits: &mut ExitWatch,
        interrupt: &InterruptFlag,
        trigger: ShutdownTrigger,
    ) -> ShutdownReport {
        let mut report = ShutdownReport::new(trigger);
        begin_shutdown(session);

        for role in Role::ORDER {
            if !self.pace(interrupt).await {
                warn!(%role, "interrupt received during shutdown; skipping to cleanup");
                report.cut_short = true;
                break;
            }
            report.enter(ShutdownState::Terminating(role));
            self.terminate(session, exits, role, &mut report);
        }

        if !report.cut_short && !self.pace(interrupt).await {
            report.cut_short = true;
        }

        Self::clean_up(session, &mut report);
        report
    }

    /// Interrupt path: skip the cascade and only remove the channels.
    ///
    /// No worker is signalled; the operator or the watchdog takes care of
    /// them.
    pub fn run_interrupted(session: &mut Session) -> ShutdownReport {
        let span = info_span!("shutdown", session_id = %session.id);
        let _guard = span.enter();

        let mut report = ShutdownReport::new(ShutdownTrigger::Interrupted);
        begin_shutdown(session);
        Self::clean_up(session, &mut report);
        report
    }

    /// Signal one role unless it has no pid or is known to have exited.
    ///
    /// Exits are drained right before the liveness check, with no await
    /// between the drain and the signal. A monitor reaps its child and
    /// reports the exit within one poll, so on the current-thread runtime
    /// a reaped pid is always seen here first and never signalled. On a
    /// multi-threaded runtime a monitor may still reap between the drain
    /// and the signal.
    fn terminate(
        &self,
        session: &mut Session,
        exits: &mut ExitWatch,
        role: Role,
        report: &mut ShutdownReport,
    ) {
        record_exits(session, exits);

        let Some(handle) = session.registry.get(role) else {
            warn!(%role, "role was never registered; skipping");
            report.skipped.push(role);
            return;
        };

        let Some(pid) = handle.pid else {
            warn!(%role, "role has no pid (spawn failed); skipping");
            report.skipped.push(role);
            return;
        };

        if !handle.is_live() {
            info!(%role, pid, "process already exited; skipping");
            report.skipped.push(role);
            return;
        }

        match self.signaller.interrupt(role, pid) {
            Ok(()) => {
                info!(%role, pid, "termination requested");
                session.registry.mark_kill_attempted(role);
                report.signalled.push(role);
            }
            Err(err) => {
                error!(%role, pid, %err, "termination request not delivered; continuing");
                session.registry.mark_kill_attempted(role);
                report.failed.push(role);
            }
        }
    }

    fn clean_up(session: &mut Session, report: &mut ShutdownReport) {
        report.enter(ShutdownState::CleaningUp);
        report.teardown = session.channels.teardown();

        if let Err(err) = session.transition_to(SessionStatus::Closed) {
            warn!(%err, "session status not closed");
        }
        report.enter(ShutdownState::Done);
    }

    /// Sleep one pacing interval. Returns `false` if interrupted.
    async fn pace(&self, interrupt: &InterruptFlag) -> bool {
        if interrupt.is_raised() {
            return false;
        }
        tokio::select! {
            biased;
            () = interrupt.raised() => false,
            () = tokio::time::sleep(self.pacing) => true,
        }
    }
}

fn begin_shutdown(session: &mut Session) {
    if let Err(err) = session.transition_to(SessionStatus::ShuttingDown) {
        warn!(%err, "session already past running state");
    }
}

fn record_exits(session: &mut Session, exits: &mut ExitWatch) {
    for exit in exits.drain() {
        session.registry.mark_exited(exit.pid, exit.exit_code);
    }
}
