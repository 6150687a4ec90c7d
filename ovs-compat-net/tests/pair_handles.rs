//! Handle accounting for socket pair creation.
//!
//! Counts entries in `/proc/self/fd`, so this file holds a single test: any
//! other test running concurrently in the same binary would skew the count.

use std::fs;
use std::io::{self, Read, Write};
use std::net::TcpStream;

use ovs_compat_net::{socket_pair, socket_pair_with, PairError, PairStep};

fn open_handles() -> usize {
    fs::read_dir("/proc/self/fd").expect("read /proc/self/fd").count()
}

fn roundtrip(a: &mut TcpStream, b: &mut TcpStream, payload: &[u8]) {
    a.write_all(payload).expect("write a");
    let mut got = vec![0u8; payload.len()];
    b.read_exact(&mut got).expect("read b");
    assert_eq!(got, payload);

    b.write_all(payload).expect("write b");
    a.read_exact(&mut got).expect("read a");
    assert_eq!(got, payload);
}

#[test]
fn pair_creation_never_leaks_handles() {
    // Successive creations: +2 on success, +0 on failure, back to baseline on drop.
    for round in 0..1_000u32 {
        let before = open_handles();
        match socket_pair(libc::AF_INET, libc::SOCK_STREAM, 0) {
            Ok((a, b)) => {
                assert_eq!(open_handles(), before + 2, "round {round}");
                let mut a = TcpStream::from(a);
                let mut b = TcpStream::from(b);
                roundtrip(&mut a, &mut b, format!("round-{round}").as_bytes());
                drop((a, b));
            }
            Err(err) => {
                assert!(!matches!(err, PairError::Unsupported { .. }), "round {round}: {err}");
                assert_eq!(open_handles(), before, "round {round}: {err}");
            }
        }
        assert_eq!(open_handles(), before, "round {round} after drop");
    }

    // A failure injected at every step leaves nothing behind.
    for fail_at in PairStep::ALL {
        let before = open_handles();
        let err = socket_pair_with(libc::AF_INET, libc::SOCK_STREAM, 0, |step| {
            if step == fail_at {
                Err(io::Error::from_raw_os_error(libc::EMFILE))
            } else {
                Ok(())
            }
        })
        .unwrap_err();
        assert_eq!(err.step(), Some(fail_at));
        assert_eq!(err.raw_os_error(), Some(libc::EMFILE));
        assert_eq!(open_handles(), before, "leak after failure at {fail_at}");
    }

    // Unsupported input never reaches the host.
    let before = open_handles();
    assert!(socket_pair(libc::AF_INET, libc::SOCK_DGRAM, 0).is_err());
    assert_eq!(open_handles(), before);
}
