//! `ovs-compat log`: append to the diagnostic log.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use ovs_compat_core::{DiagSink, Directories, Severity};

/// Arguments for `ovs-compat log`.
#[derive(Args, Debug)]
pub struct LogArgs {
    /// emerg, alert, crit, err, warning, notice, info, or debug.
    pub severity: Severity,

    /// Message text; newlines are folded into spaces.
    pub message: String,

    /// Directory holding `ovs-compat.log`; defaults to the resolved log dir.
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Program name stamped on the line.
    #[arg(long, default_value = "ovs-compat")]
    pub ident: String,
}

impl LogArgs {
    pub fn run(self) -> Result<()> {
        let dir = match self.dir {
            Some(dir) => dir,
            None => Directories::from_env().logdir().to_path_buf(),
        };
        let mut sink = DiagSink::open(&dir, self.ident)
            .with_context(|| format!("failed to open diagnostic log in {}", dir.display()))?;
        sink.write(self.severity, &self.message)
            .with_context(|| format!("failed to write {}", sink.path().display()))?;
        sink.close()
            .with_context(|| format!("failed to close {}", sink.path().display()))?;
        println!("{}", sink.path().display());
        Ok(())
    }
}
