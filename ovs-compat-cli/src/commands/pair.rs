//! `ovs-compat pair`: fabricate loopback pairs and prove they carry data.

use std::io::{IoSlice, Read, Write};
use std::net::TcpStream;
use std::os::fd::AsFd;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use ovs_compat_net::{gather_write, iovec::total_len, socket_pair};

/// Arguments for `ovs-compat pair`.
#[derive(Args, Debug)]
pub struct PairArgs {
    /// Number of pairs to create, one after another.
    #[arg(long, default_value_t = 1)]
    pub count: u32,

    /// Use the IPv6 loopback instead of IPv4.
    #[arg(long)]
    pub ipv6: bool,
}

impl PairArgs {
    pub fn run(self) -> Result<()> {
        let domain = if self.ipv6 { libc::AF_INET6 } else { libc::AF_INET };
        let mut failed = 0u32;

        for round in 0..self.count {
            if let Err(err) = echo_once(domain, round) {
                failed += 1;
                eprintln!("{} pair {round}: {err:#}", "failed".red().bold());
            }
        }

        let ok = self.count - failed;
        println!(
            "{} {ok} of {} pairs carried data both ways",
            if failed == 0 {
                "■".green().bold()
            } else {
                "■".red().bold()
            },
            self.count
        );
        if failed > 0 {
            bail!("{failed} of {} pairs failed", self.count);
        }
        Ok(())
    }
}

fn echo_once(domain: libc::c_int, round: u32) -> Result<()> {
    let (a, b) = socket_pair(domain, libc::SOCK_STREAM, 0).context("pair setup failed")?;
    let mut a = TcpStream::from(a);
    let mut b = TcpStream::from(b);

    let tag = round.to_string();
    let parts = [IoSlice::new(b"ping-"), IoSlice::new(tag.as_bytes())];
    let expected = total_len(&parts);
    let written = gather_write(a.as_fd(), &parts).context("gather write failed")?;
    if written != expected {
        a.write_all(&format!("ping-{tag}").as_bytes()[written..])
            .context("write of remainder failed")?;
    }

    let mut got = vec![0u8; expected];
    b.read_exact(&mut got).context("read on accepted end failed")?;
    b.write_all(&got).context("echo back failed")?;

    let mut back = vec![0u8; expected];
    a.read_exact(&mut back).context("read on connecting end failed")?;
    if back != format!("ping-{tag}").as_bytes() {
        bail!("payload mismatch: {:?}", String::from_utf8_lossy(&back));
    }
    tracing::debug!(round, bytes = expected, "pair echoed");
    Ok(())
}
