//! ovs-compat core library: directory configuration, clocks, diagnostic sink.
//!
//! Public API surface:
//! - [`dirs`]: environment-overridable directory configuration
//! - [`time`]: wall / monotonic clock access
//! - [`diag`]: append-only diagnostic log file
//! - [`error`]: [`TimeError`]
//! - [`types`]: shared enums ([`DirectoryKind`], [`ClockId`], [`Severity`])

pub mod diag;
pub mod dirs;
pub mod error;
pub mod time;
pub mod types;

pub use diag::DiagSink;
pub use dirs::{Directories, DirectoryDefaults, DirectoryEntry};
pub use error::TimeError;
pub use time::{Clocks, Timespec};
pub use types::{ClockId, DirectoryKind, DirectorySource, Severity};

/// Product name folded into the compiled directory defaults.
pub const PRODUCT: &str = "openvswitch";
