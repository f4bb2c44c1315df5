//! Process supervision.
//!
//! Covers worker spawning, the process registry, exit monitoring,
//! operator interrupts, the cascading shutdown and the session driver
//! tying them together.

pub mod exit_monitor;
pub mod interrupt;
pub mod registry;
pub mod shutdown;
pub mod spawner;
pub mod supervisor;
