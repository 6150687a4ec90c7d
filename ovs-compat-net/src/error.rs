//! Error types for ovs-compat-net.

use std::fmt;
use std::io;

use thiserror::Error;

/// The host call a pair fabrication was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairStep {
    CreateListener,
    ReuseAddr,
    Bind,
    Listen,
    LocalAddr,
    CreateConnector,
    Connect,
    Accept,
    VerifyPeer,
}

impl PairStep {
    /// Every step in execution order.
    pub const ALL: [PairStep; 9] = [
        PairStep::CreateListener,
        PairStep::ReuseAddr,
        PairStep::Bind,
        PairStep::Listen,
        PairStep::LocalAddr,
        PairStep::CreateConnector,
        PairStep::Connect,
        PairStep::Accept,
        PairStep::VerifyPeer,
    ];
}

impl fmt::Display for PairStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PairStep::CreateListener => "create listener",
            PairStep::ReuseAddr => "enable address reuse",
            PairStep::Bind => "bind loopback",
            PairStep::Listen => "listen",
            PairStep::LocalAddr => "query bound address",
            PairStep::CreateConnector => "create connecting endpoint",
            PairStep::Connect => "connect",
            PairStep::Accept => "accept",
            PairStep::VerifyPeer => "verify accepted peer",
        };
        f.write_str(name)
    }
}

/// Socket pair fabrication errors.
///
/// Whatever the variant, no endpoint created during the attempt is left open.
#[derive(Debug, Error)]
pub enum PairError {
    /// Domain, type, or protocol outside stream-over-loopback. Nothing was created.
    #[error("socket pair unsupported for domain {domain}, type {ty}, protocol {protocol}")]
    Unsupported { domain: i32, ty: i32, protocol: i32 },

    /// A host call failed part-way through; the OS error is preserved.
    #[error("socket pair creation failed at {step}: {source}")]
    Failed {
        step: PairStep,
        #[source]
        source: io::Error,
    },
}

impl PairError {
    /// Underlying host error code, for diagnostics.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            PairError::Unsupported { .. } => Some(libc::EOPNOTSUPP),
            PairError::Failed { source, .. } => source.raw_os_error(),
        }
    }

    pub fn step(&self) -> Option<PairStep> {
        match self {
            PairError::Unsupported { .. } => None,
            PairError::Failed { step, .. } => Some(*step),
        }
    }
}
