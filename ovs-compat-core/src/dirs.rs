//! Directory configuration.
//!
//! Six directory kinds resolve from `OVS_*` environment overrides or from
//! compiled defaults. Resolution happens once, when a [`Directories`] value
//! is built at startup; the value is immutable afterwards and is handed to
//! whatever needs a path.
//!
//! # API pattern
//!
//! - [`Directories::resolve_with`]: explicit defaults and variable lookup;
//!   used in tests so they never touch the process environment
//! - [`Directories::from_env`]: documented defaults + `std::env::var_os`
//!
//! # Database directory
//!
//! ```text
//! OVS_DBDIR (non-empty)        → used verbatim
//! else OVS_SYSCONFDIR (set)    → $OVS_SYSCONFDIR/openvswitch
//! else                         → compiled database default
//! ```
//!
//! The middle step reads the *variable*, not the resolved config directory,
//! so a custom config default never leaks into the database path. Being set
//! is enough there: an empty `OVS_SYSCONFDIR` yields `/openvswitch`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::types::{DirectoryKind, DirectorySource};
use crate::PRODUCT;

// ---------------------------------------------------------------------------
// 1. Compiled defaults
// ---------------------------------------------------------------------------

/// Compiled-in fallbacks, one per kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryDefaults {
    pub sysconfdir: PathBuf,
    pub pkgdatadir: PathBuf,
    pub rundir: PathBuf,
    pub logdir: PathBuf,
    pub dbdir: PathBuf,
    pub bindir: PathBuf,
}

impl DirectoryDefaults {
    /// Defaults laid out under an install prefix, e.g. `/usr/local` or `/opt/ovs`.
    pub fn with_prefix(prefix: impl AsRef<Path>) -> Self {
        let prefix = prefix.as_ref();
        Self {
            sysconfdir: prefix.join("etc"),
            pkgdatadir: prefix.join("share").join(PRODUCT),
            rundir: prefix.join("var").join("run").join(PRODUCT),
            logdir: prefix.join("var").join("log").join(PRODUCT),
            dbdir: prefix.join("etc").join(PRODUCT),
            bindir: prefix.join("bin"),
        }
    }

    pub fn get(&self, kind: DirectoryKind) -> &Path {
        match kind {
            DirectoryKind::Config => &self.sysconfdir,
            DirectoryKind::SharedData => &self.pkgdatadir,
            DirectoryKind::Run => &self.rundir,
            DirectoryKind::Log => &self.logdir,
            DirectoryKind::Database => &self.dbdir,
            DirectoryKind::Binary => &self.bindir,
        }
    }
}

impl Default for DirectoryDefaults {
    fn default() -> Self {
        Self::with_prefix("/usr/local")
    }
}

// ---------------------------------------------------------------------------
// 2. Resolved entries
// ---------------------------------------------------------------------------

/// One resolved directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub kind: DirectoryKind,
    pub value: PathBuf,
    pub default: PathBuf,
    pub override_var: &'static str,
    pub source: DirectorySource,
}

/// Immutable snapshot of every directory kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directories {
    entries: [DirectoryEntry; 6],
}

impl Directories {
    /// Resolve against the process environment and the documented defaults.
    pub fn from_env() -> Self {
        Self::resolve_with(&DirectoryDefaults::default(), |name| std::env::var_os(name))
    }

    /// Resolve every kind exactly once using `lookup` for variable values.
    ///
    /// Empty values count as unset, except for the `OVS_SYSCONFDIR` step of
    /// the database chain, where any set value is used.
    pub fn resolve_with<F>(defaults: &DirectoryDefaults, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let entries = DirectoryKind::ALL.map(|kind| {
            let default = defaults.get(kind).to_path_buf();
            let (value, source) = match non_empty(kind.env_var()) {
                Some(value) => (PathBuf::from(value), DirectorySource::Override),
                None if kind == DirectoryKind::Database => {
                    match lookup(DirectoryKind::Config.env_var()) {
                        Some(sysconf) => (derive_dbdir(sysconf), DirectorySource::Derived),
                        None => (default.clone(), DirectorySource::Default),
                    }
                }
                None => (default.clone(), DirectorySource::Default),
            };
            tracing::debug!(%kind, path = %value.display(), %source, "directory resolved");
            DirectoryEntry {
                kind,
                value,
                default,
                override_var: kind.env_var(),
                source,
            }
        });
        Self { entries }
    }

    pub fn get(&self, kind: DirectoryKind) -> &Path {
        &self.entry(kind).value
    }

    pub fn entry(&self, kind: DirectoryKind) -> &DirectoryEntry {
        &self.entries[kind.index()]
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn sysconfdir(&self) -> &Path {
        self.get(DirectoryKind::Config)
    }

    pub fn pkgdatadir(&self) -> &Path {
        self.get(DirectoryKind::SharedData)
    }

    pub fn rundir(&self) -> &Path {
        self.get(DirectoryKind::Run)
    }

    pub fn logdir(&self) -> &Path {
        self.get(DirectoryKind::Log)
    }

    pub fn dbdir(&self) -> &Path {
        self.get(DirectoryKind::Database)
    }

    pub fn bindir(&self) -> &Path {
        self.get(DirectoryKind::Binary)
    }
}

/// `<sysconf>/openvswitch`, joined textually.
fn derive_dbdir(sysconf: OsString) -> PathBuf {
    let mut path = sysconf;
    path.push("/");
    path.push(PRODUCT);
    PathBuf::from(path)
}

impl Default for Directories {
    /// Every kind at its documented default, ignoring the environment.
    fn default() -> Self {
        Self::resolve_with(&DirectoryDefaults::default(), |_| None)
    }
}
