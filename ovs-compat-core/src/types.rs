//! Shared enums for the compatibility layer.
//!
//! Every enum that crosses into the CLI's JSON output is serializable via
//! serde with lowercase names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TimeError;

// ---------------------------------------------------------------------------
// Directories
// ---------------------------------------------------------------------------

/// The six directory locations a daemon asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryKind {
    Config,
    SharedData,
    Run,
    Log,
    Database,
    Binary,
}

impl DirectoryKind {
    /// All kinds, in the order the CLI prints them.
    pub const ALL: [DirectoryKind; 6] = [
        DirectoryKind::Config,
        DirectoryKind::SharedData,
        DirectoryKind::Run,
        DirectoryKind::Log,
        DirectoryKind::Database,
        DirectoryKind::Binary,
    ];

    /// Position of this kind in [`DirectoryKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Environment variable that overrides this kind.
    pub fn env_var(self) -> &'static str {
        match self {
            DirectoryKind::Config => "OVS_SYSCONFDIR",
            DirectoryKind::SharedData => "OVS_PKGDATADIR",
            DirectoryKind::Run => "OVS_RUNDIR",
            DirectoryKind::Log => "OVS_LOGDIR",
            DirectoryKind::Database => "OVS_DBDIR",
            DirectoryKind::Binary => "OVS_BINDIR",
        }
    }
}

impl fmt::Display for DirectoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryKind::Config => write!(f, "config"),
            DirectoryKind::SharedData => write!(f, "shared-data"),
            DirectoryKind::Run => write!(f, "run"),
            DirectoryKind::Log => write!(f, "log"),
            DirectoryKind::Database => write!(f, "database"),
            DirectoryKind::Binary => write!(f, "binary"),
        }
    }
}

/// Where a resolved directory value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectorySource {
    /// The kind's own environment variable.
    Override,
    /// Database only: `OVS_SYSCONFDIR` plus the product suffix.
    Derived,
    /// Compiled-in default.
    Default,
}

impl fmt::Display for DirectorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectorySource::Override => write!(f, "override"),
            DirectorySource::Derived => write!(f, "derived"),
            DirectorySource::Default => write!(f, "default"),
        }
    }
}

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

/// Logical clock identities. The discriminants are the wire values callers
/// pass in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockId {
    Wall = 0,
    Monotonic = 1,
}

impl TryFrom<i32> for ClockId {
    type Error = TimeError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(ClockId::Wall),
            1 => Ok(ClockId::Monotonic),
            other => Err(TimeError::InvalidClock(other)),
        }
    }
}

impl FromStr for ClockId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wall" | "realtime" => Ok(ClockId::Wall),
            "monotonic" => Ok(ClockId::Monotonic),
            other => Err(format!(
                "unknown clock '{other}'; expected: wall, monotonic"
            )),
        }
    }
}

impl fmt::Display for ClockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockId::Wall => write!(f, "wall"),
            ClockId::Monotonic => write!(f, "monotonic"),
        }
    }
}

// ---------------------------------------------------------------------------
// Diagnostic severities
// ---------------------------------------------------------------------------

/// Syslog-style severity tag written in front of each diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Emerg,
    Alert,
    Crit,
    Err,
    Warning,
    Notice,
    Info,
    Debug,
}

impl Severity {
    pub fn tag(self) -> &'static str {
        match self {
            Severity::Emerg => "EMERG",
            Severity::Alert => "ALERT",
            Severity::Crit => "CRIT",
            Severity::Err => "ERR",
            Severity::Warning => "WARNING",
            Severity::Notice => "NOTICE",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, <Self as FromStr>::Err> {
        match s.to_ascii_lowercase().as_str() {
            "emerg" => Ok(Severity::Emerg),
            "alert" => Ok(Severity::Alert),
            "crit" => Ok(Severity::Crit),
            "err" | "error" => Ok(Severity::Err),
            "warning" | "warn" => Ok(Severity::Warning),
            "notice" => Ok(Severity::Notice),
            "info" => Ok(Severity::Info),
            "debug" => Ok(Severity::Debug),
            other => Err(format!(
                "unknown severity '{other}'; expected one of: emerg, alert, crit, err, warning, notice, info, debug"
            )),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
