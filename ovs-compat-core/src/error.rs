//! Error types for ovs-compat-core.

use std::io;

use thiserror::Error;

/// Errors from clock reads and sleeps.
///
/// Directory resolution has no error type: an unset override silently
/// falls back to the compiled default.
#[derive(Debug, Error)]
pub enum TimeError {
    /// Clock id outside `{0 = wall, 1 = monotonic}`.
    #[error("invalid clock id {0}; only 0 (wall) and 1 (monotonic) are supported")]
    InvalidClock(i32),

    /// The host clock call itself failed.
    #[error("host clock call failed: {0}")]
    Host(#[source] io::Error),
}

impl TimeError {
    /// Host error code, when the failure came from the host.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            TimeError::InvalidClock(_) => Some(libc::EINVAL),
            TimeError::Host(err) => err.raw_os_error(),
        }
    }
}
