//! Domain model module declarations.

pub mod process;
pub mod role;
pub mod session;

pub use process::{ProcessHandle, ProcessState};
pub use role::Role;
pub use session::{Session, SessionStatus};
