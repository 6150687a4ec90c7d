//! `ovs-compat signal | wait | run`: narrowed process control.

use std::process::Command;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use ovs_compat_core::Clocks;
use ovs_compat_process::{
    exit_status, signal, spawn, term_signal, wait, Pid, SignalKind, WaitOptions,
};

/// Arguments for `ovs-compat signal`.
#[derive(Args, Debug)]
pub struct SignalArgs {
    /// Target process id.
    #[arg(allow_negative_numbers = true)]
    pub pid: Pid,

    /// Signal number: 0 probes, SIGABRT (6) or SIGKILL (9) terminates.
    pub signo: i32,
}

impl SignalArgs {
    pub fn run(self) -> Result<()> {
        signal(self.pid, self.signo)
            .with_context(|| format!("signal {} to process {} failed", self.signo, self.pid))?;
        match SignalKind::classify(self.signo) {
            Ok(SignalKind::Probe) => println!("process {} exists", self.pid),
            _ => println!("process {} terminated", self.pid),
        }
        Ok(())
    }
}

/// Arguments for `ovs-compat wait`.
///
/// Only children of this command are waitable, so on its own this mostly
/// reports that `pid` is not a child.
#[derive(Args, Debug)]
pub struct WaitArgs {
    /// Child process id.
    #[arg(allow_negative_numbers = true)]
    pub pid: Pid,

    /// Return immediately if the child is still running.
    #[arg(long)]
    pub nohang: bool,
}

impl WaitArgs {
    pub fn run(self) -> Result<()> {
        let options = if self.nohang {
            WaitOptions::NOHANG
        } else {
            WaitOptions::empty()
        };
        let mut status = 0;
        let reaped = wait(self.pid, Some(&mut status), options.bits())
            .with_context(|| format!("wait for process {} failed", self.pid))?;
        if reaped == 0 {
            println!("process {} still running", self.pid);
        } else {
            println!("process {reaped} {}", describe(status));
        }
        Ok(())
    }
}

/// Arguments for `ovs-compat run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Send SIGKILL after this many milliseconds if still running.
    #[arg(long)]
    pub kill_after_ms: Option<u64>,

    /// Program and its arguments.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let Some((program, args)) = self.command.split_first() else {
            bail!("no program given");
        };
        let pid = spawn(Command::new(program).args(args))
            .with_context(|| format!("failed to start '{program}'"))?;
        tracing::info!(pid, program = %program, "started");

        if let Some(ms) = self.kill_after_ms {
            Clocks::new()
                .sleep(Duration::from_millis(ms), false)
                .context("sleep before kill failed")?;
            let mut status = 0;
            let still_running = wait(pid, Some(&mut status), WaitOptions::NOHANG.bits())
                .with_context(|| format!("status check for process {pid} failed"))?
                == 0;
            if !still_running {
                println!("process {pid} {}", describe(status));
                return Ok(());
            }
            signal(pid, libc::SIGKILL)
                .with_context(|| format!("failed to terminate process {pid}"))?;
        }

        let mut status = 0;
        wait(pid, Some(&mut status), 0).with_context(|| format!("wait for process {pid} failed"))?;
        println!("process {pid} {}", describe(status));
        Ok(())
    }
}

fn describe(status: i32) -> String {
    if let Some(code) = exit_status(status) {
        let text = format!("exited with status {code}");
        return if code == 0 {
            text.green().to_string()
        } else {
            text.yellow().to_string()
        };
    }
    if let Some(signo) = term_signal(status) {
        return format!("killed by signal {signo}").red().to_string();
    }
    if libc::WIFSTOPPED(status) {
        return format!("stopped by signal {}", libc::WSTOPSIG(status));
    }
    format!("changed state (status {status:#x})")
}
