//! Session orchestration.
//!
//! Provisions the channels, resets the log, spawns every role in
//! [`Role::ORDER`] while passing earlier pids to later roles, waits for
//! the first exit and hands over to the [`ShutdownController`].
//!
//! Every failure short of a broken configuration is logged and the
//! session carries on.

use std::sync::Arc;

use tracing::{error, info, info_span, warn, Instrument};

use crate::config::SupervisorConfig;
use crate::models::{ProcessHandle, ProcessState, Role, Session, SessionStatus};
use crate::orchestrator::exit_monitor::ExitWatch;
use crate::orchestrator::interrupt::InterruptFlag;
use crate::orchestrator::registry::ProcessRegistry;
use crate::orchestrator::shutdown::{ShutdownController, ShutdownReport, ShutdownTrigger};
use crate::orchestrator::spawner;
use crate::session_log;

/// Result of one complete session.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    /// Session identifier.
    pub session_id: String,
    /// Whether the session log was reset at startup.
    pub log_reset: bool,
    /// Final process handles in spawn order.
    pub processes: Vec<ProcessHandle>,
    /// Shutdown record.
    pub report: ShutdownReport,
}

impl SessionOutcome {
    /// Whether the session ended because of an operator interrupt.
    #[must_use]
    pub fn was_interrupted(&self) -> bool {
        self.report.trigger == ShutdownTrigger::Interrupted || self.report.cut_short
    }
}

/// Orchestrates one session.
#[derive(Debug)]
pub struct Supervisor {
    config: Arc<SupervisorConfig>,
    interrupt: InterruptFlag,
    controller: ShutdownController,
}

impl Supervisor {
    /// Supervisor that stops workers with real `SIGINT`s.
    #[must_use]
    pub fn new(config: Arc<SupervisorConfig>, interrupt: InterruptFlag) -> Self {
        let controller = ShutdownController::with_sigint(config.pacing());
        Self::with_controller(config, interrupt, controller)
    }

    /// Supervisor with a custom shutdown controller.
    #[must_use]
    pub fn with_controller(
        config: Arc<SupervisorConfig>,
        interrupt: InterruptFlag,
        controller: ShutdownController,
    ) -> Self {
        Self {
            config,
            interrupt,
            controller,
        }
    }

    /// Run a session to completion.
    ///
    /// Always returns once the channels have been torn down; none of the
    /// per-step failures is escalated.
    pub async fn run(&self) -> SessionOutcome {
        let mut session = Session::new(&self.config);
        let span = info_span!("session", id = %session.id, supervisor_pid = session.supervisor_pid);
        self.run_session(&mut session).instrument(span).await
    }

    async fn run_session(&self, session: &mut Session) -> SessionOutcome {
        info!(started_at = %session.started_at, "session starting");

        let provision = session.channels.provision();
        info!(
            created = provision.created.len(),
            stale = provision.stale.len(),
            failed = provision.failed.len(),
            "channels provisioned"
        );

        let log_reset = session_log::reset_or_warn(&session.log_file);

        if let Err(err) = session.transition_to(SessionStatus::Running) {
            warn!(%err, "session status not updated");
        }

        let mut exits = ExitWatch::new();

        for role in Role::ORDER {
            if self.interrupt.is_raised() {
                warn!(%role, "interrupted before spawn; skipping remaining roles");
                return Self::finish_interrupted(session, &mut exits, log_reset);
            }
            self.spawn_role(session, role, &mut exits);
        }
        exits.seal();

        info!(monitored = exits.monitored(), "all roles spawned; waiting for first exit");

        let trigger = tokio::select! {
            biased;
            () = self.interrupt.raised() => None,
            trigger = wait_first_exit(&session.registry, &mut exits) => Some(trigger),
        };

        let Some(trigger) = trigger else {
            return Self::finish_interrupted(session, &mut exits, log_reset);
        };

        if let ShutdownTrigger::FirstExit(exit) = &trigger {
            info!(role = %exit.role, pid = exit.pid, reason = %exit.reason, "first exit; shutting down");
            session.registry.mark_exited(exit.pid, exit.exit_code);
        } else {
            warn!("no live process to wait for; shutting down");
        }

        let report = self
            .controller
            .run(session, &mut exits, &self.interrupt, trigger)
            .await;
        exits.stop();

        info!(
            signalled = report.signalled.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "session finished"
        );

        outcome(session, log_reset, report)
    }

    fn finish_interrupted(
        session: &mut Session,
        exits: &mut ExitWatch,
        log_reset: bool,
    ) -> SessionOutcome {
        exits.stop();
        let report = ShutdownController::run_interrupted(session);
        outcome(session, log_reset, report)
    }

    fn spawn_role(&self, session: &mut Session, role: Role, exits: &mut ExitWatch) {
        let mut handle = resolve_command(
            &self.config,
            &session.registry,
            session.supervisor_pid,
            role,
        );

        match spawner::spawn(&handle.program, &handle.args) {
            Ok(spawned) => {
                info!(%role, pid = spawned.pid, argv = ?handle.argv(), "role started");
                handle.pid = Some(spawned.pid);
                handle.state = ProcessState::Running;
                exits.watch(role, spawned.pid, spawned.child);
            }
            Err(err) => {
                error!(%role, %err, "spawn failed; continuing without this role");
            }
        }

        if let Err(err) = session.registry.register(handle) {
            error!(%role, %err, "process not registered");
        }
    }
}

/// Resolve the command line for `role` from the configuration and the
/// pids registered so far.
///
/// Consoles run inside the terminal host:
/// `terminal.program terminal.args… console.program console.args…`.
/// Pid dependencies follow the configured arguments; a role without a pid
/// contributes the configured absent marker. The watchdog also receives
/// `supervisor_pid` last.
#[must_use]
pub fn resolve_command(
    config: &SupervisorConfig,
    registry: &ProcessRegistry,
    supervisor_pid: u32,
    role: Role,
) -> ProcessHandle {
    let command = config.processes.command(role);
    let mut args = Vec::new();

    let program = if role.is_console() {
        args.extend(config.terminal.args.iter().cloned());
        args.push(command.program.clone());
        config.terminal.program.clone()
    } else {
        command.program.clone()
    };
    args.extend(command.args.iter().cloned());

    for dependency in role.pid_dependencies() {
        args.push(registry.pid_arg(*dependency, &config.absent_pid_marker));
    }
    if role == Role::Watchdog {
        args.push(supervisor_pid.to_string());
    }

    ProcessHandle::new(role, program, args)
}

async fn wait_first_exit(registry: &ProcessRegistry, exits: &mut ExitWatch) -> ShutdownTrigger {
    if !registry.has_live() {
        return ShutdownTrigger::NoLiveProcesses;
    }
    match exits.next_exit().await {
        Some(exit) => ShutdownTrigger::FirstExit(exit),
        None => ShutdownTrigger::NoLiveProcesses,
    }
}

fn outcome(session: &Session, log_reset: bool, report: ShutdownReport) -> SessionOutcome {
    SessionOutcome {
        session_id: session.id.clone(),
        log_reset,
        processes: session.registry.all().to_vec(),
        report,
    }
}
