//! # ovs-compat-process
//!
//! Narrowed process control: existence probes, forced termination, and
//! blocking wait-for-exit on a child.
//!
//! Every call acquires its own process handle (a pidfd), uses it, and lets
//! it drop before returning, on success and error paths alike. Nothing
//! here holds a process reference between calls.
//!
//! Process creation is limited to [`spawn`]; [`fork`] reports
//! [`ProcessError::NotImplemented`] instead of pretending to be a child.

pub mod error;
mod handle;
pub mod signal;
pub mod spawn;
pub mod wait;

pub use error::ProcessError;
pub use signal::{signal, SignalKind};
pub use spawn::{fork, spawn};
pub use wait::{exit_status, term_signal, wait, WaitOptions};

/// Host process id.
pub type Pid = i32;
