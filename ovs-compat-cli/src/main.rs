//! ovs-compat: inspect and exercise the host compatibility layer.
//!
//! # Usage
//!
//! ```text
//! ovs-compat dirs [--json]
//! ovs-compat clock [--clock wall|monotonic] [--json]
//! ovs-compat pair [--count N] [--ipv6]
//! ovs-compat signal <pid> <signo>
//! ovs-compat wait <pid> [--nohang]
//! ovs-compat run [--kill-after-ms MS] -- <program> [args...]
//! ovs-compat log <severity> <message> [--dir D] [--ident NAME]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    clock::ClockArgs, dirs::DirsArgs, log::LogArgs, pair::PairArgs, process::RunArgs,
    process::SignalArgs, process::WaitArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "ovs-compat",
    version,
    about = "Inspect and exercise the Open vSwitch host compatibility layer",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show resolved installation directories and where each came from.
    Dirs(DirsArgs),

    /// Read the wall or monotonic clock and its resolution.
    Clock(ClockArgs),

    /// Create loopback socket pairs and echo a payload across each.
    Pair(PairArgs),

    /// Send a probe (0) or terminate (SIGABRT / SIGKILL) signal.
    Signal(SignalArgs),

    /// Wait for a child process of this command.
    Wait(WaitArgs),

    /// Spawn a program, optionally kill it, and report how it ended.
    Run(RunArgs),

    /// Append one line to the diagnostic log.
    Log(LogArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Dirs(args) => args.run(),
        Commands::Clock(args) => args.run(),
        Commands::Pair(args) => args.run(),
        Commands::Signal(args) => args.run(),
        Commands::Wait(args) => args.run(),
        Commands::Run(args) => args.run(),
        Commands::Log(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
