//! Supervisor configuration parsing and validation.
//!
//! Every field has a default equal to the fixed layout the simulation
//! binaries expect, so an absent config file yields a working session.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::Deserialize;

use crate::models::Role;
use crate::{AppError, Result};

/// Log output format selected on the command line.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Replaces `pacing_ms`.
    pub pacing_ms: Option<u64>,
    /// Replaces `log_file`.
    pub log_file: Option<PathBuf>,
}

/// One named FIFO provisioned for the session.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ChannelConfig {
    /// Producer/consumer pair the channel connects, for logs.
    pub role: String,
    /// Filesystem path of the FIFO.
    pub path: PathBuf,
}

impl ChannelConfig {
    fn new(role: &str, path: &str) -> Self {
        Self {
            role: role.to_owned(),
            path: PathBuf::from(path),
        }
    }
}

/// Executable plus leading arguments for one launched program.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CommandConfig {
    /// Executable path, resolved by the platform's exec rules.
    pub program: String,
    /// Arguments placed before any pid arguments the supervisor appends.
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandConfig {
    fn program(program: &str) -> Self {
        Self {
            program: program.to_owned(),
            args: Vec::new(),
        }
    }
}

/// Commands for each worker role.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct ProcessesConfig {
    /// Motor-X controller.
    pub motor_x: CommandConfig,
    /// Motor-Z controller.
    pub motor_z: CommandConfig,
    /// World simulator.
    pub world: CommandConfig,
    /// Command console (run inside the terminal host).
    pub command_console: CommandConfig,
    /// Inspection console (run inside the terminal host).
    pub inspection_console: CommandConfig,
    /// Watchdog.
    pub watchdog: CommandConfig,
}

impl Default for ProcessesConfig {
    fn default() -> Self {
        Self {
            motor_x: CommandConfig::program("./bin/motorX"),
            motor_z: CommandConfig::program("./bin/motorZ"),
            world: CommandConfig::program("./bin/world"),
            command_console: CommandConfig::program("./bin/command"),
            inspection_console: CommandConfig::program("./bin/inspection"),
            watchdog: CommandConfig::program("./bin/watchdog"),
        }
    }
}

impl ProcessesConfig {
    /// Command configured for `role`.
    #[must_use]
    pub fn command(&self, role: Role) -> &CommandConfig {
        match role {
            Role::MotorX => &self.motor_x,
            Role::MotorZ => &self.motor_z,
            Role::World => &self.world,
            Role::CommandConsole => &self.command_console,
            Role::InspectionConsole => &self.inspection_console,
            Role::Watchdog => &self.watchdog,
        }
    }
}

fn default_channels() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig::new("motor-x -> world", "/tmp/fifoXW"),
        ChannelConfig::new("motor-z -> world", "/tmp/fifoZW"),
        ChannelConfig::new("world -> inspection-console", "/tmp/fifoWI"),
        ChannelConfig::new("command-console -> motor-x", "/tmp/fifoCX"),
        ChannelConfig::new("command-console -> motor-z", "/tmp/fifoCZ"),
    ]
}

fn default_channel_mode() -> u32 {
    0o666
}

fn default_log_file() -> PathBuf {
    PathBuf::from("./logFile.log")
}

fn default_pacing_ms() -> u64 {
    1000
}

fn default_absent_pid_marker() -> String {
    "none".into()
}

fn default_terminal() -> CommandConfig {
    CommandConfig {
        program: "/usr/bin/konsole".into(),
        args: vec!["-e".into()],
    }
}

/// Global configuration parsed from `supervisor.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SupervisorConfig {
    /// FIFOs created before any worker starts.
    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelConfig>,
    /// Permission bits passed to `mkfifo` (subject to umask).
    #[serde(default = "default_channel_mode")]
    pub channel_mode: u32,
    /// Session log truncated at startup; written by the workers.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    /// Delay before each shutdown step, in milliseconds.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    /// Argument passed in place of the pid of a role that failed to spawn.
    #[serde(default = "default_absent_pid_marker")]
    pub absent_pid_marker: String,
    /// Terminal emulator hosting the two consoles.
    #[serde(default = "default_terminal")]
    pub terminal: CommandConfig,
    /// Worker executables.
    #[serde(default)]
    pub processes: ProcessesConfig,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
            channel_mode: default_channel_mode(),
            log_file: default_log_file(),
            pacing_ms: default_pacing_ms(),
            absent_pid_marker: default_absent_pid_marker(),
            terminal: default_terminal(),
            processes: ProcessesConfig::default(),
        }
    }
}

impl SupervisorConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Pacing interval between shutdown steps.
    ///
    /// A heuristic window for each worker to react to its interrupt; it
    /// does not guarantee the worker has actually exited.
    #[must_use]
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    /// Apply command-line overrides on top of the loaded values.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(pacing_ms) = overrides.pacing_ms {
            self.pacing_ms = pacing_ms;
        }
        if let Some(log_file) = &overrides.log_file {
            self.log_file.clone_from(log_file);
        }
    }

    /// Check structural rules that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            return Err(AppError::Config("channels must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for channel in &self.channels {
            if channel.path.as_os_str().is_empty() {
                return Err(AppError::Config(format!(
                    "channel '{}' has an empty path",
                    channel.role
                )));
            }
            if !seen.insert(&channel.path) {
                return Err(AppError::Config(format!(
                    "duplicate channel path {}",
                    channel.path.display()
                )));
            }
        }

        if self.channel_mode > 0o777 {
            return Err(AppError::Config(format!(
                "channel_mode {:o} exceeds 0o777",
                self.channel_mode
            )));
        }

        if self.terminal.program.trim().is_empty() {
            return Err(AppError::Config("terminal.program must not be empty".into()));
        }

        for role in Role::ORDER {
            if self.processes.command(role).program.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "processes.{} program must not be empty",
                    role.as_str().replace('-', "_")
                )));
            }
        }

        // Workers parse these positions as pids; a numeric marker would be
        // taken for a real process.
        let marker = self.absent_pid_marker.trim();
        if marker.is_empty() || marker.parse::<i64>().is_ok() {
            return Err(AppError::Config(
                "absent_pid_marker must be a non-numeric string".into(),
            ));
        }

        Ok(())
    }
}
