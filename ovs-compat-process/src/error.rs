//! Error types for ovs-compat-process.

use std::io;

use thiserror::Error;

use crate::Pid;

/// All errors that can arise from process control.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Only `0` (probe), `SIGABRT` and `SIGKILL` are deliverable.
    #[error("signal {0} is not supported; only 0, SIGABRT and SIGKILL can be delivered")]
    UnsupportedSignal(i32),

    /// Process-group and "every process" targets have no equivalent here.
    #[error("process id {0} does not name a single process")]
    InvalidPid(Pid),

    /// The process exists but refused the request.
    #[error("process {pid} is not accessible: {source}")]
    Inaccessible {
        pid: Pid,
        #[source]
        source: io::Error,
    },

    /// Wait option bits outside `WNOHANG | WUNTRACED`.
    #[error("unsupported wait options {0:#x}")]
    InvalidOptions(i32),

    /// No live process with this id.
    #[error("no such process: {0}")]
    NotFound(Pid),

    /// The id is not a waitable child of the caller, or is an "any child" sentinel.
    #[error("no such child: {0}")]
    NoSuchChild(Pid),

    /// The operation has no honest emulation on this host.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// Any other host failure, with the failing call named.
    #[error("{op} failed: {source}")]
    Host {
        op: &'static str,
        #[source]
        source: io::Error,
    },
}

impl ProcessError {
    /// POSIX errno equivalent for callers that still speak errno.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            ProcessError::UnsupportedSignal(_)
            | ProcessError::InvalidPid(_)
            | ProcessError::InvalidOptions(_) => Some(libc::EINVAL),
            ProcessError::Inaccessible { source, .. } => source.raw_os_error().or(Some(libc::EPERM)),
            ProcessError::NotFound(_) => Some(libc::ESRCH),
            ProcessError::NoSuchChild(_) => Some(libc::ECHILD),
            ProcessError::NotImplemented(_) => Some(libc::ENOSYS),
            ProcessError::Host { source, .. } => source.raw_os_error(),
        }
    }

    /// Unsupported-or-invalid requests, as opposed to missing processes.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            ProcessError::UnsupportedSignal(_)
                | ProcessError::InvalidPid(_)
                | ProcessError::Inaccessible { .. }
                | ProcessError::InvalidOptions(_)
                | ProcessError::NotImplemented(_)
        )
    }
}

pub(crate) fn host_err(op: &'static str, source: io::Error) -> ProcessError {
    ProcessError::Host { op, source }
}
