//! Process creation.
//!
//! There is no `fork` on the modelled host. Faking one (returning the
//! "child" value without creating anything) would send every caller down
//! its child branch in the parent, so [`fork`] refuses outright. Callers
//! that need a subprocess use [`spawn`], which starts a real process and
//! returns its id for [`crate::signal`] and [`crate::wait`].

use std::process::Command;

use crate::error::ProcessError;
use crate::Pid;

/// Always [`ProcessError::NotImplemented`].
pub fn fork() -> Result<Pid, ProcessError> {
    tracing::debug!("fork requested; not available on this host");
    Err(ProcessError::NotImplemented("fork"))
}

/// Start `command` and return its process id.
///
/// The child is not reaped automatically; collect it with [`crate::wait`].
pub fn spawn(command: &mut Command) -> Result<Pid, ProcessError> {
    let child = command.spawn().map_err(|source| ProcessError::Host {
        op: "spawn",
        source,
    })?;
    let pid = child.id() as Pid;
    tracing::debug!(pid, program = ?command.get_program(), "subprocess spawned");
    Ok(pid)
}
