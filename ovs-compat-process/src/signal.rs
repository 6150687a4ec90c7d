//! Narrowed signal delivery.
//!
//! | signo               | effect                                      |
//! |---------------------|---------------------------------------------|
//! | `0`                 | probe: succeeds iff the process can be opened |
//! | `SIGABRT`, `SIGKILL`| forced termination                          |
//! | anything else       | [`ProcessError::UnsupportedSignal`]         |
//!
//! Termination is always forced (`SIGKILL`), whichever of the two was
//! asked for: the host this layer models has no graceful abort.

use crate::error::ProcessError;
use crate::handle::ProcessHandle;
use crate::Pid;

/// How a signal number is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Probe,
    Terminate,
}

impl SignalKind {
    pub fn classify(signo: i32) -> Result<Self, ProcessError> {
        match signo {
            0 => Ok(SignalKind::Probe),
            libc::SIGABRT | libc::SIGKILL => Ok(SignalKind::Terminate),
            other => Err(ProcessError::UnsupportedSignal(other)),
        }
    }
}

/// Deliver `signo` to `pid` under the narrowed model above.
///
/// Unsupported signal numbers fail before the process is looked up, so the
/// result does not depend on whether `pid` exists.
pub fn signal(pid: Pid, signo: i32) -> Result<(), ProcessError> {
    let kind = SignalKind::classify(signo)?;
    let handle = ProcessHandle::open(pid)?;
    match kind {
        SignalKind::Probe => Ok(()),
        SignalKind::Terminate => {
            handle.send_signal(libc::SIGKILL)?;
            tracing::info!(pid = handle.pid(), requested = signo, "process terminated");
            Ok(())
        }
    }
}
