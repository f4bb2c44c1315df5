//! Spawning real processes and classifying failures.

use sim_supervisor::orchestrator::spawner::spawn;
use sim_supervisor::SpawnError;

#[tokio::test]
async fn spawn_returns_pid_without_blocking() {
    let mut spawned = spawn("/bin/sh", &["-c".into(), "exit 7".into()]).expect("spawn sh");
    assert!(spawned.pid > 0);

    let status = spawned.child.wait().await.expect("wait");
    assert_eq!(status.code(), Some(7));
}

#[tokio::test]
async fn arguments_are_passed_verbatim() {
    let temp = tempfile::tempdir().expect("tempdir");
    let out = temp.path().join("args.txt");
    let script = format!("printf '%s|' \"$@\" > '{}'", out.display());

    let mut spawned = spawn(
        "/bin/sh",
        &[
            "-c".into(),
            script,
            "watchdog".into(),
            "101".into(),
            "$HOME".into(),
            "two words".into(),
        ],
    )
    .expect("spawn sh");
    spawned.child.wait().await.expect("wait");

    let written = std::fs::read_to_string(&out).expect("read args");
    assert_eq!(written, "101|$HOME|two words|", "no shell expansion of arguments");
}

#[tokio::test]
async fn missing_executable_is_exec_failure() {
    let err = spawn("/nonexistent/bin/motorZ", &[]).expect_err("missing binary");
    match &err {
        SpawnError::ExecFailed { program, reason } => {
            assert_eq!(program, "/nonexistent/bin/motorZ");
            assert!(!reason.is_empty());
        }
        SpawnError::ForkFailed { .. } => panic!("expected exec failure, got {err:?}"),
    }
}

#[tokio::test]
async fn non_executable_file_is_exec_failure() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("world");
    std::fs::write(&path, "not a program").expect("write");

    let err = spawn(path.to_str().expect("utf8"), &[]).expect_err("not executable");
    assert!(matches!(err, SpawnError::ExecFailed { .. }), "{err:?}");
}

#[tokio::test]
async fn dropping_child_does_not_kill_it() {
    let spawned = spawn("/bin/sh", &["-c".into(), "exec sleep 5".into()]).expect("spawn");
    let pid = nix::unistd::Pid::from_raw(i32::try_from(spawned.pid).expect("pid fits"));
    drop(spawned);

    // Signal 0 only checks that the process still exists.
    assert!(nix::sys::signal::kill(pid, None).is_ok());
    nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGKILL).expect("cleanup");
}
