//! Append-only diagnostic sink.
//!
//! Stands in for the host syslog the daemon expects. Each message becomes
//! one line in `ovs-compat.log` under the directory given at open:
//!
//! ```text
//! 2026-10-19T08:15:02.118Z ovs-vswitchd[4242]: WARNING bridge br0 has no ports
//! ```
//!
//! There is no rotation and no level filtering.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};

use crate::types::Severity;

/// Fixed file name the sink appends to.
pub const DIAG_LOG_FILE: &str = "ovs-compat.log";

/// `<dir>/ovs-compat.log`
pub fn diag_log_path(dir: &Path) -> PathBuf {
    dir.join(DIAG_LOG_FILE)
}

/// An open (or closed) diagnostic log.
#[derive(Debug)]
pub struct DiagSink {
    ident: String,
    path: PathBuf,
    file: Option<File>,
}

impl DiagSink {
    /// Open `<dir>/ovs-compat.log` for appending, creating it if needed.
    ///
    /// `ident` is the program name stamped on every line.
    pub fn open(dir: &Path, ident: impl Into<String>) -> io::Result<Self> {
        let path = diag_log_path(dir);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            ident: ident.into(),
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Append one line. A closed sink drops the message.
    pub fn write(&mut self, severity: Severity, message: &str) -> io::Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        let line = format_line(&self.ident, std::process::id(), severity, message);
        file.write_all(line.as_bytes())?;
        file.flush()
    }

    /// Flush and release the file. Later writes are no-ops.
    pub fn close(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(file) => file.sync_all(),
            None => Ok(()),
        }
    }
}

fn format_line(ident: &str, pid: u32, severity: Severity, message: &str) -> String {
    let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    // Embedded newlines would split one message across lines.
    let message = message.replace(['\r', '\n'], " ");
    format!("{stamp} {ident}[{pid}]: {} {message}\n", severity.tag())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_append_one_line_each() {
        let dir = TempDir::new().unwrap();
        let mut sink = DiagSink::open(dir.path(), "ovsdb-server").unwrap();
        sink.write(Severity::Info, "listening").unwrap();
        sink.write(Severity::Err, "lost connection").unwrap();
        sink.close().unwrap();

        let contents = std::fs::read_to_string(diag_log_path(dir.path())).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("ovsdb-server["));
        assert!(lines[0].ends_with("INFO listening"));
        assert!(lines[1].ends_with("ERR lost connection"));
    }

    #[test]
    fn reopen_appends_instead_of_truncating() {
        let dir = TempDir::new().unwrap();
        for round in 0..2 {
            let mut sink = DiagSink::open(dir.path(), "ovs-vswitchd").unwrap();
            sink.write(Severity::Notice, &format!("round {round}")).unwrap();
        }
        let contents = std::fs::read_to_string(diag_log_path(dir.path())).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn write_after_close_is_dropped() {
        let dir = TempDir::new().unwrap();
        let mut sink = DiagSink::open(dir.path(), "x").unwrap();
        sink.close().unwrap();
        assert!(!sink.is_open());
        sink.write(Severity::Debug, "ignored").unwrap();
        let contents = std::fs::read_to_string(sink.path()).unwrap();
        assert!(contents.is_empty());
    }

    #[test]
    fn newlines_are_flattened() {
        let line = format_line("p", 1, Severity::Warning, "a\nb\r\nc");
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.ends_with("WARNING a b  c\n"));
    }
}
