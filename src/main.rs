#![forbid(unsafe_code)]

//! `sim-supervisor` binary for the motor simulation.
//!
//! Loads configuration, installs the interrupt listener and runs one
//! session. Exits with status 0 once the session's channels are gone,
//! whether it ended through a worker exit or an operator interrupt.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use sim_supervisor::config::{ConfigOverrides, LogFormat};
use sim_supervisor::orchestrator::interrupt::{listen_for_interrupt, InterruptFlag};
use sim_supervisor::orchestrator::supervisor::Supervisor;
use sim_supervisor::{AppError, Result, SupervisorConfig};

#[derive(Debug, Parser)]
#[command(name = "sim-supervisor", about = "Motor simulation supervisor", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the delay before each shutdown step, in milliseconds.
    #[arg(long)]
    pacing_ms: Option<u64>,

    /// Override the session log file path.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("sim-supervisor bootstrap");

    let config = Arc::new(load_config(&args)?);

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(config))
}

async fn run(config: Arc<SupervisorConfig>) -> Result<()> {
    let interrupt = InterruptFlag::new();
    let listener = listen_for_interrupt(interrupt.clone())?;

    let supervisor = Supervisor::new(config, interrupt);
    let outcome = supervisor.run().await;
    listener.abort();

    info!(
        session_id = %outcome.session_id,
        interrupted = outcome.was_interrupted(),
        channels_left = outcome.report.teardown.failed.len(),
        "main program exiting with status 0"
    );

    Ok(())
}

fn load_config(args: &Cli) -> Result<SupervisorConfig> {
    let mut config = match &args.config {
        Some(path) => SupervisorConfig::load_from_path(path)?,
        None => SupervisorConfig::default(),
    };

    config.apply_overrides(&ConfigOverrides {
        pacing_ms: args.pacing_ms,
        log_file: args.log_file.clone(),
    });

    config.validate()?;
    info!(
        channels = config.channels.len(),
        pacing_ms = config.pacing_ms,
        log_file = %config.log_file.display(),
        "configuration loaded"
    );
    Ok(config)
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
