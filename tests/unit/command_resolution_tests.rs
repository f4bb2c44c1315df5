//! Argument lists handed to each role, including propagated pids.

use sim_supervisor::config::SupervisorConfig;
use sim_supervisor::models::{ProcessHandle, ProcessState, Role};
use sim_supervisor::orchestrator::registry::ProcessRegistry;
use sim_supervisor::orchestrator::supervisor::resolve_command;

const SUPERVISOR_PID: u32 = 900;

fn register(registry: &mut ProcessRegistry, role: Role, pid: Option<u32>) {
    let mut handle = ProcessHandle::new(role, format!("./bin/{role}"), Vec::new());
    handle.pid = pid;
    if pid.is_some() {
        handle.state = ProcessState::Running;
    }
    registry.register(handle).expect("register");
}

fn full_registry() -> ProcessRegistry {
    let mut registry = ProcessRegistry::new();
    register(&mut registry, Role::MotorX, Some(101));
    register(&mut registry, Role::MotorZ, Some(102));
    register(&mut registry, Role::World, Some(103));
    register(&mut registry, Role::CommandConsole, Some(104));
    register(&mut registry, Role::InspectionConsole, Some(105));
    registry
}

#[test]
fn motors_and_world_take_no_arguments() {
    let config = SupervisorConfig::default();
    let registry = full_registry();

    for (role, program) in [
        (Role::MotorX, "./bin/motorX"),
        (Role::MotorZ, "./bin/motorZ"),
        (Role::World, "./bin/world"),
    ] {
        let handle = resolve_command(&config, &registry, SUPERVISOR_PID, role);
        assert_eq!(handle.argv(), vec![program], "{role}");
    }
}

#[test]
fn command_console_runs_in_terminal() {
    let config = SupervisorConfig::default();
    let handle = resolve_command(
        &config,
        &full_registry(),
        SUPERVISOR_PID,
        Role::CommandConsole,
    );
    assert_eq!(
        handle.argv(),
        vec!["/usr/bin/konsole", "-e", "./bin/command"]
    );
}

#[test]
fn inspection_console_receives_motor_pids() {
    let config = SupervisorConfig::default();
    let handle = resolve_command(
        &config,
        &full_registry(),
        SUPERVISOR_PID,
        Role::InspectionConsole,
    );
    assert_eq!(
        handle.argv(),
        vec!["/usr/bin/konsole", "-e", "./bin/inspection", "101", "102"]
    );
}

#[test]
fn watchdog_receives_every_pid_in_documented_order() {
    let config = SupervisorConfig::default();
    let handle = resolve_command(&config, &full_registry(), SUPERVISOR_PID, Role::Watchdog);
    assert_eq!(
        handle.argv(),
        vec!["./bin/watchdog", "101", "102", "104", "105", "103", "900"]
    );
}

#[test]
fn failed_motor_becomes_absent_marker_for_inspection() {
    let config = SupervisorConfig::default();
    let mut registry = ProcessRegistry::new();
    register(&mut registry, Role::MotorX, None);
    register(&mut registry, Role::MotorZ, Some(102));

    let handle = resolve_command(&config, &registry, SUPERVISOR_PID, Role::InspectionConsole);
    assert_eq!(&handle.args[2..], ["none", "102"]);
    assert!(
        !handle.args.iter().any(|arg| arg == "0"),
        "absent pid must never be passed as zero"
    );
}

#[test]
fn failed_motor_z_becomes_absent_marker_for_watchdog() {
    let config = SupervisorConfig::default();
    let mut registry = ProcessRegistry::new();
    register(&mut registry, Role::MotorX, Some(101));
    register(&mut registry, Role::MotorZ, None);
    register(&mut registry, Role::World, Some(103));
    register(&mut registry, Role::CommandConsole, Some(104));
    register(&mut registry, Role::InspectionConsole, Some(105));

    let handle = resolve_command(&config, &registry, SUPERVISOR_PID, Role::Watchdog);
    assert_eq!(handle.args, vec!["101", "none", "104", "105", "103", "900"]);
}

#[test]
fn configured_args_precede_pid_arguments() {
    let mut config = SupervisorConfig::default();
    config.processes.watchdog.args = vec!["--interval".into(), "5".into()];
    config.processes.inspection_console.args = vec!["--compact".into()];

    let registry = full_registry();
    let watchdog = resolve_command(&config, &registry, SUPERVISOR_PID, Role::Watchdog);
    assert_eq!(&watchdog.args[..2], ["--interval", "5"]);
    assert_eq!(watchdog.args.len(), 8);

    let inspection = resolve_command(&config, &registry, SUPERVISOR_PID, Role::InspectionConsole);
    assert_eq!(
        inspection.args,
        vec!["-e", "./bin/inspection", "--compact", "101", "102"]
    );
}

#[test]
fn resolved_handle_is_pending() {
    let config = SupervisorConfig::default();
    let handle = resolve_command(&config, &ProcessRegistry::new(), SUPERVISOR_PID, Role::World);
    assert_eq!(handle.state, ProcessState::Pending);
    assert_eq!(handle.pid, None);
}
