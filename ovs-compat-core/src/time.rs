//! Wall and monotonic clocks.
//!
//! [`Clocks`] is created once at startup and shared by reference. It keeps
//! the highest monotonic reading handed out so far; a later host reading
//! that is lower (it should never be, but some hosts get this wrong across
//! CPUs) is clamped up to it.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::TimeError;
use crate::types::ClockId;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Seconds + nanoseconds, as the host reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Timespec {
    pub secs: i64,
    /// Always `< 1_000_000_000`.
    pub nanos: u32,
}

impl Timespec {
    /// Total nanoseconds; negative readings saturate to zero.
    pub fn as_nanos(&self) -> u64 {
        if self.secs < 0 {
            return 0;
        }
        (self.secs as u64)
            .saturating_mul(NANOS_PER_SEC)
            .saturating_add(u64::from(self.nanos))
    }

    pub fn from_nanos(nanos: u64) -> Self {
        Self {
            secs: (nanos / NANOS_PER_SEC) as i64,
            nanos: (nanos % NANOS_PER_SEC) as u32,
        }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_nanos(self.as_nanos())
    }

    /// Interpret a wall-clock reading as a UTC timestamp.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.secs, self.nanos)
    }

    fn from_libc(ts: &libc::timespec) -> Self {
        Self {
            secs: ts.tv_sec as i64,
            nanos: ts.tv_nsec.clamp(0, 999_999_999) as u32,
        }
    }
}

fn native_clock(clock: ClockId) -> libc::clockid_t {
    match clock {
        ClockId::Wall => libc::CLOCK_REALTIME,
        ClockId::Monotonic => libc::CLOCK_MONOTONIC,
    }
}

fn to_libc(d: Duration) -> libc::timespec {
    libc::timespec {
        tv_sec: libc::time_t::try_from(d.as_secs()).unwrap_or(libc::time_t::MAX),
        tv_nsec: d.subsec_nanos() as libc::c_long,
    }
}

fn from_libc_duration(ts: &libc::timespec) -> Duration {
    let secs = u64::try_from(ts.tv_sec).unwrap_or(0);
    let nanos = u32::try_from(ts.tv_nsec).unwrap_or(0);
    Duration::new(secs, nanos)
}

/// Clock access for the process. Build once, share by reference.
#[derive(Debug, Default)]
pub struct Clocks {
    monotonic_floor: AtomicU64,
}

impl Clocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `clock`. Monotonic readings never go backward.
    pub fn get_time(&self, clock: ClockId) -> Result<Timespec, TimeError> {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: `ts` is a valid, writable timespec for the duration of the call.
        let rc = unsafe { libc::clock_gettime(native_clock(clock), &mut ts) };
        if rc != 0 {
            return Err(TimeError::Host(io::Error::last_os_error()));
        }
        let reading = Timespec::from_libc(&ts);

        match clock {
            ClockId::Wall => Ok(reading),
            ClockId::Monotonic => {
                let nanos = reading.as_nanos();
                let previous = self.monotonic_floor.fetch_max(nanos, Ordering::AcqRel);
                if previous > nanos {
                    tracing::debug!(previous, nanos, "monotonic reading clamped");
                }
                Ok(Timespec::from_nanos(previous.max(nanos)))
            }
        }
    }

    /// Read the clock named by a raw id (`0` wall, `1` monotonic).
    pub fn get_time_by_id(&self, raw: i32) -> Result<Timespec, TimeError> {
        self.get_time(ClockId::try_from(raw)?)
    }

    /// Granularity of `clock`.
    pub fn get_resolution(&self, clock: ClockId) -> Result<Timespec, TimeError> {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: `ts` is a valid, writable timespec for the duration of the call.
        let rc = unsafe { libc::clock_getres(native_clock(clock), &mut ts) };
        if rc != 0 {
            return Err(TimeError::Host(io::Error::last_os_error()));
        }
        Ok(Timespec::from_libc(&ts))
    }

    pub fn get_resolution_by_id(&self, raw: i32) -> Result<Timespec, TimeError> {
        self.get_resolution(ClockId::try_from(raw)?)
    }

    /// Sleep for `duration` and return the time left.
    ///
    /// With `allow_interrupt`, a signal ends the sleep early and the
    /// remainder is returned. Without it the sleep resumes until the full
    /// duration has elapsed and the result is always zero.
    pub fn sleep(&self, duration: Duration, allow_interrupt: bool) -> Result<Duration, TimeError> {
        let mut request = to_libc(duration);
        loop {
            let mut remaining = libc::timespec {
                tv_sec: 0,
                tv_nsec: 0,
            };
            // SAFETY: both pointers reference live, properly aligned timespecs.
            let rc = unsafe { libc::nanosleep(&request, &mut remaining) };
            if rc == 0 {
                return Ok(Duration::ZERO);
            }

            let err = io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EINTR) {
                return Err(TimeError::Host(err));
            }
            if allow_interrupt {
                return Ok(from_libc_duration(&remaining));
            }
            request = remaining;
        }
    }
}
