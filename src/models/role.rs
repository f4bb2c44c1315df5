//! Fixed worker roles and their spawn/shutdown order.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Logical identity of one of the fixed worker processes in a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Horizontal-axis motor controller.
    MotorX,
    /// Vertical-axis motor controller.
    MotorZ,
    /// World simulator; reads both motor channels.
    World,
    /// Operator command console, hosted in a terminal window.
    CommandConsole,
    /// Inspection console, hosted in a terminal window.
    InspectionConsole,
    /// Watchdog; receives every other pid on its command line.
    Watchdog,
}

impl Role {
    /// Spawn order, which is also the shutdown order.
    ///
    /// A role that takes another role's pid as an argument always comes
    /// after that role.
    pub const ORDER: [Self; 6] = [
        Self::MotorX,
        Self::MotorZ,
        Self::World,
        Self::CommandConsole,
        Self::InspectionConsole,
        Self::Watchdog,
    ];

    /// Stable display name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MotorX => "motor-x",
            Self::MotorZ => "motor-z",
            Self::World => "world",
            Self::CommandConsole => "command-console",
            Self::InspectionConsole => "inspection-console",
            Self::Watchdog => "watchdog",
        }
    }

    /// Whether the role is launched inside the terminal host.
    #[must_use]
    pub const fn is_console(self) -> bool {
        matches!(self, Self::CommandConsole | Self::InspectionConsole)
    }

    /// Roles whose pids are appended to this role's argument list, in order.
    ///
    /// The watchdog additionally receives the supervisor's own pid after
    /// these.
    #[must_use]
    pub const fn pid_dependencies(self) -> &'static [Self] {
        match self {
            Self::InspectionConsole => &[Self::MotorX, Self::MotorZ],
            Self::Watchdog => &[
                Self::MotorX,
                Self::MotorZ,
                Self::CommandConsole,
                Self::InspectionConsole,
                Self::World,
            ],
            Self::MotorX | Self::MotorZ | Self::World | Self::CommandConsole => &[],
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
