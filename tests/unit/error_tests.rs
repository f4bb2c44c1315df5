//! Display format and classification of supervisor errors.

use std::io;

use sim_supervisor::{AppError, SpawnError};

#[test]
fn app_error_display_prefixes() {
    let cases = [
        (AppError::Config("x".into()), "config: x"),
        (AppError::Channel("x".into()), "channel: x"),
        (AppError::Signal("x".into()), "signal: x"),
        (AppError::Session("x".into()), "session: x"),
        (AppError::Io("x".into()), "io: x"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn spawn_error_wraps_into_app_error() {
    let err: AppError = SpawnError::ExecFailed {
        program: "./bin/world".into(),
        reason: "No such file or directory".into(),
    }
    .into();
    assert_eq!(
        err.to_string(),
        "spawn: exec failed for ./bin/world: No such file or directory"
    );
}

#[test]
fn not_found_is_exec_failure() {
    let io_err = io::Error::from_raw_os_error(nix::libc::ENOENT);
    let err = SpawnError::from_io("./bin/motorX", &io_err);
    assert!(matches!(err, SpawnError::ExecFailed { .. }));
    assert_eq!(err.program(), "./bin/motorX");
}

#[test]
fn permission_denied_is_exec_failure() {
    let io_err = io::Error::from_raw_os_error(nix::libc::EACCES);
    let err = SpawnError::from_io("./bin/motorZ", &io_err);
    assert!(matches!(err, SpawnError::ExecFailed { .. }));
}

#[test]
fn resource_exhaustion_is_fork_failure() {
    for errno in [nix::libc::EAGAIN, nix::libc::ENOMEM] {
        let io_err = io::Error::from_raw_os_error(errno);
        let err = SpawnError::from_io("./bin/world", &io_err);
        assert!(
            matches!(err, SpawnError::ForkFailed { .. }),
            "errno {errno} should classify as fork failure"
        );
        assert!(err.to_string().starts_with("fork failed for ./bin/world"));
    }
}

#[test]
fn error_without_errno_is_exec_failure() {
    let io_err = io::Error::other("opaque");
    let err = SpawnError::from_io("prog", &io_err);
    assert!(matches!(err, SpawnError::ExecFailed { .. }));
}

#[test]
fn app_error_implements_std_error_trait() {
    let err = AppError::Channel("test".into());
    let boxed: Box<dyn std::error::Error> = Box::new(err);
    assert!(!boxed.to_string().is_empty());
}
