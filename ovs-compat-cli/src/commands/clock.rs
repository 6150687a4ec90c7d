//! `ovs-compat clock`: clock readings and resolution.

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use ovs_compat_core::{ClockId, Clocks, Timespec};

/// Arguments for `ovs-compat clock`.
#[derive(Args, Debug)]
pub struct ClockArgs {
    /// Read only this clock (`wall` or `monotonic`); both by default.
    #[arg(long)]
    pub clock: Option<ClockId>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ClockReport {
    clock: ClockId,
    reading: Timespec,
    resolution: Timespec,
    /// RFC 3339 rendering, wall clock only.
    #[serde(skip_serializing_if = "Option::is_none")]
    utc: Option<String>,
}

#[derive(Tabled)]
struct ClockRow {
    clock: String,
    seconds: i64,
    nanos: u32,
    resolution_ns: u64,
    utc: String,
}

impl ClockArgs {
    pub fn run(self) -> Result<()> {
        let clocks = Clocks::new();
        let selected = match self.clock {
            Some(clock) => vec![clock],
            None => vec![ClockId::Wall, ClockId::Monotonic],
        };

        let reports = selected
            .into_iter()
            .map(|clock| read(&clocks, clock))
            .collect::<Result<Vec<_>>>()?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&reports).context("failed to serialize clock JSON")?
            );
            return Ok(());
        }

        let rows: Vec<ClockRow> = reports
            .into_iter()
            .map(|report| ClockRow {
                clock: report.clock.to_string(),
                seconds: report.reading.secs,
                nanos: report.reading.nanos,
                resolution_ns: report.resolution.as_nanos(),
                utc: report.utc.unwrap_or_else(|| "-".to_string()),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

fn read(clocks: &Clocks, clock: ClockId) -> Result<ClockReport> {
    let reading = clocks
        .get_time(clock)
        .with_context(|| format!("failed to read the {clock} clock"))?;
    let resolution = clocks
        .get_resolution(clock)
        .with_context(|| format!("failed to query {clock} clock resolution"))?;
    let utc = match clock {
        ClockId::Wall => reading
            .to_datetime()
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Micros, true)),
        ClockId::Monotonic => None,
    };
    Ok(ClockReport {
        clock,
        reading,
        resolution,
        utc,
    })
}
