//! `ovs-compat dirs`: resolved installation directories.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use ovs_compat_core::{Directories, DirectoryEntry, DirectorySource};

/// Arguments for `ovs-compat dirs`.
#[derive(Args, Debug)]
pub struct DirsArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl DirsArgs {
    pub fn run(self) -> Result<()> {
        let dirs = Directories::from_env();
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(dirs.entries())
                    .context("failed to serialize directories JSON")?
            );
            return Ok(());
        }

        print_table(&dirs);
        Ok(())
    }
}

#[derive(Tabled)]
struct DirRow {
    kind: String,
    path: String,
    source: String,
    variable: String,
}

fn print_table(dirs: &Directories) {
    let rows: Vec<DirRow> = dirs.entries().iter().map(row).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let overridden = dirs
        .entries()
        .iter()
        .filter(|entry| entry.source == DirectorySource::Override)
        .count();
    if overridden > 0 {
        println!("{overridden} of {} set from the environment.", dirs.entries().len());
    }
}

fn row(entry: &DirectoryEntry) -> DirRow {
    DirRow {
        kind: entry.kind.to_string(),
        path: entry.value.display().to_string(),
        source: source_label(entry.source),
        variable: entry.override_var.to_string(),
    }
}

fn source_label(source: DirectorySource) -> String {
    match source {
        DirectorySource::Override => "override".green().bold().to_string(),
        DirectorySource::Derived => "derived".yellow().to_string(),
        DirectorySource::Default => "default".bright_black().to_string(),
    }
}
