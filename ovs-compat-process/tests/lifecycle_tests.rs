//! Probe / terminate / wait against real subprocesses.

use std::process::Command;
use std::time::{Duration, Instant};

use ovs_compat_process::{
    exit_status, fork, signal, spawn, term_signal, wait, Pid, ProcessError, WaitOptions,
};
use rstest::rstest;

/// Beyond any kernel `pid_max`, so never a live process.
const ABSENT_PID: Pid = 0x3fff_fff0;

fn sleeper() -> Pid {
    spawn(Command::new("sleep").arg("30")).expect("spawn sleep")
}

// ---------------------------------------------------------------------------
// 1. Signal
// ---------------------------------------------------------------------------

#[test]
fn probe_live_child_succeeds_and_absent_pid_is_not_found() {
    let pid = sleeper();
    signal(pid, 0).expect("probe live child");

    let err = signal(ABSENT_PID, 0).unwrap_err();
    assert!(matches!(err, ProcessError::NotFound(p) if p == ABSENT_PID), "got: {err}");
    assert!(!err.is_unsupported());
    assert_eq!(err.raw_os_error(), Some(libc::ESRCH));

    signal(pid, libc::SIGKILL).expect("kill");
    wait(pid, None, 0).expect("reap");
}

#[rstest]
#[case(libc::SIGKILL)]
#[case(libc::SIGABRT)]
fn terminate_then_wait_reports_exit(#[case] signo: i32) {
    let pid = sleeper();
    signal(pid, signo).expect("terminate");

    let mut status = 0;
    let reaped = wait(pid, Some(&mut status), 0).expect("wait");
    assert_eq!(reaped, pid);
    assert_eq!(term_signal(status), Some(libc::SIGKILL));
    assert_eq!(exit_status(status), None);

    // Reaped: the id no longer resolves.
    assert!(matches!(signal(pid, 0), Err(ProcessError::NotFound(_))));
}

#[test]
fn unsupported_signal_on_live_child_leaves_it_running() {
    let pid = sleeper();
    for signo in [libc::SIGTERM, libc::SIGINT, libc::SIGHUP, libc::SIGUSR1] {
        let err = signal(pid, signo).unwrap_err();
        assert!(matches!(err, ProcessError::UnsupportedSignal(_)), "got: {err}");
    }
    assert_eq!(wait(pid, None, libc::WNOHANG).expect("nohang"), 0);

    signal(pid, libc::SIGKILL).expect("kill");
    wait(pid, None, 0).expect("reap");
}

#[test]
fn unsupported_signal_wins_over_missing_process() {
    let err = signal(ABSENT_PID, libc::SIGTERM).unwrap_err();
    assert!(matches!(err, ProcessError::UnsupportedSignal(_)), "got: {err}");
}

#[test]
fn terminating_a_foreign_process_is_inaccessible() {
    // SAFETY: geteuid has no preconditions.
    if unsafe { libc::geteuid() } == 0 {
        // Root may signal init; nothing to refuse.
        return;
    }
    let err = signal(1, libc::SIGKILL).unwrap_err();
    assert!(matches!(err, ProcessError::Inaccessible { pid: 1, .. }), "got: {err}");
    assert!(err.is_unsupported());
    assert_eq!(err.raw_os_error(), Some(libc::EPERM));
}

// ---------------------------------------------------------------------------
// 2. Wait
// ---------------------------------------------------------------------------

#[test]
fn exit_code_is_written_when_requested() {
    let pid = spawn(Command::new("sh").args(["-c", "exit 3"])).expect("spawn");
    let mut status = -1;
    assert_eq!(wait(pid, Some(&mut status), 0).expect("wait"), pid);
    assert_eq!(exit_status(status), Some(3));
}

#[test]
fn absent_status_location_is_not_written() {
    let pid = spawn(Command::new("sh").args(["-c", "exit 0"])).expect("spawn");
    assert_eq!(wait(pid, None, 0).expect("wait"), pid);
}

#[test]
fn nohang_on_running_child_returns_zero_without_writing() {
    let pid = sleeper();
    let mut status = 77;
    let start = Instant::now();
    assert_eq!(wait(pid, Some(&mut status), libc::WNOHANG).expect("nohang"), 0);
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(status, 77);

    signal(pid, libc::SIGKILL).expect("kill");
    assert_eq!(wait(pid, Some(&mut status), 0).expect("reap"), pid);
    assert_eq!(term_signal(status), Some(libc::SIGKILL));
}

#[test]
fn unsupported_option_bits_fail_without_blocking() {
    let pid = sleeper();
    let start = Instant::now();
    let err = wait(pid, None, libc::WCONTINUED).unwrap_err();
    assert!(matches!(err, ProcessError::InvalidOptions(_)), "got: {err}");
    assert!(start.elapsed() < Duration::from_secs(5));

    signal(pid, libc::SIGKILL).expect("kill");
    wait(pid, None, 0).expect("reap");
}

#[test]
fn untraced_reports_stopped_child() {
    let pid = sleeper();
    // SAFETY: `pid` is our own live child.
    assert_eq!(unsafe { libc::kill(pid, libc::SIGSTOP) }, 0);

    let mut status = 0;
    let flags = WaitOptions::UNTRACED.bits();
    assert_eq!(wait(pid, Some(&mut status), flags).expect("wait stopped"), pid);
    assert!(libc::WIFSTOPPED(status));
    assert_eq!(libc::WSTOPSIG(status), libc::SIGSTOP);

    signal(pid, libc::SIGKILL).expect("kill");
    wait(pid, None, 0).expect("reap");
}

#[test]
fn non_child_fails_without_blocking() {
    let parent = std::os::unix::process::parent_id() as Pid;
    let start = Instant::now();
    let err = wait(parent, None, 0).unwrap_err();
    assert!(matches!(err, ProcessError::NoSuchChild(p) if p == parent), "got: {err}");
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn absent_pid_is_no_such_child_for_wait() {
    let err = wait(ABSENT_PID, None, 0).unwrap_err();
    assert!(matches!(err, ProcessError::NoSuchChild(_)), "got: {err}");
}

// ---------------------------------------------------------------------------
// 3. Creation
// ---------------------------------------------------------------------------

#[test]
fn fork_never_pretends_to_be_a_child() {
    assert!(matches!(fork(), Err(ProcessError::NotImplemented(_))));
}
