//! Insertion-ordered process registry.

use sim_supervisor::models::{ProcessHandle, ProcessState, Role};
use sim_supervisor::orchestrator::registry::ProcessRegistry;

fn spawned(role: Role, pid: u32) -> ProcessHandle {
    let mut handle = ProcessHandle::new(role, format!("./bin/{role}"), Vec::new());
    handle.pid = Some(pid);
    handle.state = ProcessState::Running;
    handle
}

fn failed(role: Role) -> ProcessHandle {
    ProcessHandle::new(role, format!("./bin/{role}"), Vec::new())
}

#[test]
fn all_preserves_insertion_order() {
    let mut registry = ProcessRegistry::new();
    registry.register(spawned(Role::World, 30)).expect("register");
    registry.register(spawned(Role::MotorX, 10)).expect("register");
    registry.register(failed(Role::MotorZ)).expect("register");

    let roles: Vec<_> = registry.all().iter().map(|h| h.role).collect();
    assert_eq!(roles, vec![Role::World, Role::MotorX, Role::MotorZ]);
}

#[test]
fn duplicate_role_rejected() {
    let mut registry = ProcessRegistry::new();
    registry.register(spawned(Role::MotorX, 10)).expect("register");
    let err = registry
        .register(spawned(Role::MotorX, 11))
        .expect_err("duplicate role");
    assert!(err.to_string().contains("already registered"));
    assert_eq!(registry.pid(Role::MotorX), Some(10));
}

#[test]
fn pid_arg_uses_marker_for_failed_spawn() {
    let mut registry = ProcessRegistry::new();
    registry.register(spawned(Role::MotorX, 4242)).expect("register");
    registry.register(failed(Role::MotorZ)).expect("register");

    assert_eq!(registry.pid_arg(Role::MotorX, "none"), "4242");
    assert_eq!(registry.pid_arg(Role::MotorZ, "none"), "none");
    assert_eq!(registry.pid_arg(Role::World, "none"), "none");
}

#[test]
fn mark_exited_returns_role_once() {
    let mut registry = ProcessRegistry::new();
    registry.register(spawned(Role::MotorZ, 20)).expect("register");

    assert_eq!(registry.mark_exited(20, Some(0)), Some(Role::MotorZ));
    assert_eq!(registry.mark_exited(20, Some(1)), None);

    let handle = registry.get(Role::MotorZ).expect("handle");
    assert_eq!(handle.state, ProcessState::Exited);
    assert_eq!(handle.exit_code, Some(0), "exited handle is immutable");
}

#[test]
fn mark_exited_ignores_unknown_pid() {
    let mut registry = ProcessRegistry::new();
    registry.register(spawned(Role::MotorZ, 20)).expect("register");
    assert_eq!(registry.mark_exited(999, None), None);
    assert!(registry.has_live());
}

#[test]
fn mark_kill_attempted_only_for_running() {
    let mut registry = ProcessRegistry::new();
    registry.register(spawned(Role::World, 30)).expect("register");
    registry.register(failed(Role::Watchdog)).expect("register");

    assert!(registry.mark_kill_attempted(Role::World));
    assert!(!registry.mark_kill_attempted(Role::Watchdog));
    assert!(!registry.mark_kill_attempted(Role::MotorX));

    registry.mark_exited(30, None);
    assert_eq!(
        registry.get(Role::World).expect("world").state,
        ProcessState::Exited
    );
}

#[test]
fn live_skips_failed_and_exited() {
    let mut registry = ProcessRegistry::new();
    registry.register(spawned(Role::MotorX, 10)).expect("register");
    registry.register(failed(Role::MotorZ)).expect("register");
    registry.register(spawned(Role::World, 30)).expect("register");
    registry.mark_exited(10, Some(0));

    let live: Vec<_> = registry.live().map(|h| h.role).collect();
    assert_eq!(live, vec![Role::World]);
}

#[test]
fn empty_registry_has_nothing_live() {
    let registry = ProcessRegistry::new();
    assert!(!registry.has_live());
    assert!(registry.all().is_empty());
    assert!(registry.get(Role::MotorX).is_none());
}
