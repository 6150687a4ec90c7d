//! Scoped process references backed by pidfds.
//!
//! A pidfd pins the identity of one process, so a signal or wait issued
//! through it cannot land on an unrelated process that reused the id.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use crate::error::{host_err, ProcessError};
use crate::Pid;

/// `idtype_t` value for waiting on a pidfd. Not exported by every libc release.
const P_PIDFD: libc::idtype_t = 3;

#[derive(Debug)]
pub(crate) struct ProcessHandle {
    pid: Pid,
    fd: OwnedFd,
}

/// Outcome of a wait-class query on a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChildState {
    Running,
    /// POSIX-encoded status word.
    Changed(i32),
}

impl ProcessHandle {
    /// Acquire a reference, or fail with `NotFound` when `pid` names no process.
    pub(crate) fn open(pid: Pid) -> Result<Self, ProcessError> {
        if pid <= 0 {
            return Err(ProcessError::InvalidPid(pid));
        }
        // SAFETY: plain syscall; on success the descriptor is owned from here on.
        let rc = unsafe { libc::syscall(libc::SYS_pidfd_open, pid, 0) };
        if rc < 0 {
            return Err(lookup_error("pidfd_open", pid, io::Error::last_os_error()));
        }
        // SAFETY: `rc` is a fresh descriptor nobody else owns.
        let fd = unsafe { OwnedFd::from_raw_fd(rc as libc::c_int) };
        tracing::trace!(pid, fd = fd.as_raw_fd(), "process handle acquired");
        Ok(Self { pid, fd })
    }

    pub(crate) fn pid(&self) -> Pid {
        self.pid
    }

    pub(crate) fn send_signal(&self, signo: i32) -> Result<(), ProcessError> {
        // SAFETY: null siginfo is allowed and makes the kernel fill in a default.
        let rc = unsafe {
            libc::syscall(
                libc::SYS_pidfd_send_signal,
                self.fd.as_raw_fd(),
                signo,
                std::ptr::null::<libc::siginfo_t>(),
                0,
            )
        };
        if rc < 0 {
            return Err(lookup_error(
                "pidfd_send_signal",
                self.pid,
                io::Error::last_os_error(),
            ));
        }
        Ok(())
    }

    /// `waitid` on this handle. `ECHILD` means the process is not ours to wait for.
    pub(crate) fn wait(&self, flags: libc::c_int) -> Result<ChildState, ProcessError> {
        loop {
            // SAFETY: all-zero is a valid siginfo_t.
            let mut info: libc::siginfo_t = unsafe { std::mem::zeroed() };
            // SAFETY: `info` is live and writable for the call.
            let rc = unsafe { libc::waitid(P_PIDFD, self.fd.as_raw_fd() as libc::id_t, &mut info, flags) };
            if rc < 0 {
                let err = io::Error::last_os_error();
                match err.raw_os_error() {
                    Some(libc::EINTR) => continue,
                    Some(libc::ECHILD) => return Err(ProcessError::NoSuchChild(self.pid)),
                    _ => return Err(host_err("waitid", err)),
                }
            }
            // SAFETY: waitid filled `info` for a SIGCHLD-class event, or left it zeroed.
            let (child, status) = unsafe { (info.si_pid(), info.si_status()) };
            if child == 0 {
                return Ok(ChildState::Running);
            }
            return Ok(ChildState::Changed(encode_status(info.si_code, status)));
        }
    }
}

/// Map a failed open or signal on `pid`: gone is `NotFound`, refused is
/// `Inaccessible`, anything else is a host failure of `op`.
pub(crate) fn lookup_error(op: &'static str, pid: Pid, err: io::Error) -> ProcessError {
    match err.raw_os_error() {
        Some(libc::ESRCH) => ProcessError::NotFound(pid),
        Some(libc::EPERM) | Some(libc::EACCES) => ProcessError::Inaccessible { pid, source: err },
        _ => host_err(op, err),
    }
}

/// Pack a `waitid` result into the classic `waitpid` status word.
pub(crate) fn encode_status(code: libc::c_int, status: libc::c_int) -> i32 {
    match code {
        libc::CLD_EXITED => (status & 0xff) << 8,
        libc::CLD_KILLED => status & 0x7f,
        libc::CLD_DUMPED => (status & 0x7f) | 0x80,
        libc::CLD_STOPPED | libc::CLD_TRAPPED => ((status & 0xff) << 8) | 0x7f,
        libc::CLD_CONTINUED => 0xffff,
        _ => status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_status_decodes_with_native_macros() {
        let exited = encode_status(libc::CLD_EXITED, 3);
        assert!(libc::WIFEXITED(exited));
        assert_eq!(libc::WEXITSTATUS(exited), 3);

        let killed = encode_status(libc::CLD_KILLED, libc::SIGKILL);
        assert!(libc::WIFSIGNALED(killed));
        assert_eq!(libc::WTERMSIG(killed), libc::SIGKILL);

        let dumped = encode_status(libc::CLD_DUMPED, libc::SIGABRT);
        assert!(libc::WIFSIGNALED(dumped));
        assert!(libc::WCOREDUMP(dumped));

        let stopped = encode_status(libc::CLD_STOPPED, libc::SIGSTOP);
        assert!(libc::WIFSTOPPED(stopped));
        assert_eq!(libc::WSTOPSIG(stopped), libc::SIGSTOP);
    }

    #[test]
    fn refused_lookup_is_inaccessible_and_unsupported() {
        for errno in [libc::EPERM, libc::EACCES] {
            let err = lookup_error("pidfd_send_signal", 1, io::Error::from_raw_os_error(errno));
            assert!(matches!(err, ProcessError::Inaccessible { pid: 1, .. }), "got: {err}");
            assert!(err.is_unsupported());
            assert_eq!(err.raw_os_error(), Some(errno));
        }
    }

    #[test]
    fn vanished_process_is_not_found() {
        let err = lookup_error("pidfd_open", 77, io::Error::from_raw_os_error(libc::ESRCH));
        assert!(matches!(err, ProcessError::NotFound(77)), "got: {err}");
        assert!(!err.is_unsupported());
    }

    #[test]
    fn other_lookup_failures_name_the_host_call() {
        let err = lookup_error("pidfd_open", 5, io::Error::from_raw_os_error(libc::EMFILE));
        assert!(matches!(err, ProcessError::Host { op: "pidfd_open", .. }), "got: {err}");
        assert_eq!(err.raw_os_error(), Some(libc::EMFILE));
    }

    #[test]
    fn nonpositive_pid_is_rejected_before_any_host_call() {
        for pid in [0, -1, -42] {
            assert!(matches!(ProcessHandle::open(pid), Err(ProcessError::InvalidPid(p)) if p == pid));
        }
    }

    #[test]
    fn own_process_can_be_opened() {
        let me = std::process::id() as Pid;
        let handle = ProcessHandle::open(me).unwrap();
        assert_eq!(handle.pid(), me);
    }
}
