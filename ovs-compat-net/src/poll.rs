//! Readiness-event shapes and an epoll pass-through.
//!
//! [`EpollEvent`] mirrors the native event record: an interest/readiness
//! bit set plus one payload the registrant chose. The payload is a tagged
//! [`EpollData`] rather than a union, so exactly one member is ever live.
//! The host hands the payload back as a bare 64-bit word; decoding it needs
//! the [`PayloadKind`] the caller registered with.
//!
//! [`Poller`] does no policy of its own. Add, modify, remove, and wait map
//! one-to-one onto `epoll_ctl` / `epoll_wait`.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::time::Duration;

use bitflags::bitflags;

bitflags! {
    /// Interest / readiness bits, with the native values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventFlags: u32 {
        const IN = libc::EPOLLIN as u32;
        const PRI = libc::EPOLLPRI as u32;
        const OUT = libc::EPOLLOUT as u32;
        const ERR = libc::EPOLLERR as u32;
        const HUP = libc::EPOLLHUP as u32;
        const ONESHOT = libc::EPOLLONESHOT as u32;
        const ET = libc::EPOLLET as u32;
    }
}

/// Which [`EpollData`] member a registration uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Ptr,
    Fd,
    U32,
    U64,
}

/// Registrant-chosen payload, returned unchanged with each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpollData {
    Ptr(*mut libc::c_void),
    Fd(RawFd),
    U32(u32),
    U64(u64),
}

impl EpollData {
    pub fn kind(&self) -> PayloadKind {
        match self {
            EpollData::Ptr(_) => PayloadKind::Ptr,
            EpollData::Fd(_) => PayloadKind::Fd,
            EpollData::U32(_) => PayloadKind::U32,
            EpollData::U64(_) => PayloadKind::U64,
        }
    }

    /// The 64-bit word the host stores.
    pub fn to_word(self) -> u64 {
        match self {
            EpollData::Ptr(ptr) => ptr as usize as u64,
            EpollData::Fd(fd) => fd as u32 as u64,
            EpollData::U32(v) => u64::from(v),
            EpollData::U64(v) => v,
        }
    }

    pub fn from_word(kind: PayloadKind, word: u64) -> Self {
        match kind {
            PayloadKind::Ptr => EpollData::Ptr(word as usize as *mut libc::c_void),
            PayloadKind::Fd => EpollData::Fd(word as u32 as RawFd),
            PayloadKind::U32 => EpollData::U32(word as u32),
            PayloadKind::U64 => EpollData::U64(word),
        }
    }
}

/// One readiness event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpollEvent {
    pub events: EventFlags,
    pub data: EpollData,
}

impl EpollEvent {
    pub fn new(events: EventFlags, data: EpollData) -> Self {
        Self { events, data }
    }

    pub fn to_native(self) -> libc::epoll_event {
        libc::epoll_event {
            events: self.events.bits(),
            u64: self.data.to_word(),
        }
    }

    pub fn from_native(raw: &libc::epoll_event, kind: PayloadKind) -> Self {
        // Copy out of the (packed on x86_64) struct before use.
        let events = raw.events;
        let word = raw.u64;
        Self {
            events: EventFlags::from_bits_retain(events),
            data: EpollData::from_word(kind, word),
        }
    }
}

/// Registration operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtlOp {
    Add,
    Del,
    Mod,
}

impl CtlOp {
    fn native(self) -> libc::c_int {
        match self {
            CtlOp::Add => libc::EPOLL_CTL_ADD,
            CtlOp::Del => libc::EPOLL_CTL_DEL,
            CtlOp::Mod => libc::EPOLL_CTL_MOD,
        }
    }
}

/// An epoll instance.
#[derive(Debug)]
pub struct Poller {
    epfd: OwnedFd,
}

impl Poller {
    pub fn new() -> io::Result<Self> {
        // SAFETY: plain syscall; the descriptor is owned from here on.
        let fd = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: `fd` is a fresh descriptor nobody else owns.
        Ok(Self {
            epfd: unsafe { OwnedFd::from_raw_fd(fd) },
        })
    }

    /// Raw `epoll_ctl`. `event` may be `None` only for [`CtlOp::Del`].
    pub fn ctl(&self, op: CtlOp, fd: RawFd, event: Option<EpollEvent>) -> io::Result<()> {
        let mut native = event.map(EpollEvent::to_native);
        let ptr = native
            .as_mut()
            .map_or(std::ptr::null_mut(), |ev| ev as *mut libc::epoll_event);
        // SAFETY: `ptr` is null or points at `native`, which lives across the call.
        let rc = unsafe { libc::epoll_ctl(self.epfd.as_raw_fd(), op.native(), fd, ptr) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn add(&self, fd: RawFd, event: EpollEvent) -> io::Result<()> {
        self.ctl(CtlOp::Add, fd, Some(event))
    }

    pub fn modify(&self, fd: RawFd, event: EpollEvent) -> io::Result<()> {
        self.ctl(CtlOp::Mod, fd, Some(event))
    }

    pub fn remove(&self, fd: RawFd) -> io::Result<()> {
        self.ctl(CtlOp::Del, fd, None)
    }

    /// Wait for up to `max` events. `None` blocks indefinitely.
    ///
    /// Every returned payload is decoded as `kind`.
    pub fn wait(
        &self,
        max: usize,
        timeout: Option<Duration>,
        kind: PayloadKind,
    ) -> io::Result<Vec<EpollEvent>> {
        let max = max.clamp(1, libc::c_int::MAX as usize);
        let timeout_ms = match timeout {
            None => -1,
            Some(d) => libc::c_int::try_from(d.as_millis()).unwrap_or(libc::c_int::MAX),
        };
        let mut raw = vec![libc::epoll_event { events: 0, u64: 0 }; max];
        // SAFETY: `raw` has room for `max` events.
        let n = unsafe {
            libc::epoll_wait(
                self.epfd.as_raw_fd(),
                raw.as_mut_ptr(),
                max as libc::c_int,
                timeout_ms,
            )
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(raw[..n as usize]
            .iter()
            .map(|ev| EpollEvent::from_native(ev, kind))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_bits_match_native_values() {
        assert_eq!(EventFlags::IN.bits(), 0x001);
        assert_eq!(EventFlags::PRI.bits(), 0x002);
        assert_eq!(EventFlags::OUT.bits(), 0x004);
        assert_eq!(EventFlags::ERR.bits(), 0x008);
        assert_eq!(EventFlags::HUP.bits(), 0x010);
        assert_eq!(EventFlags::ONESHOT.bits(), 1 << 30);
        assert_eq!(EventFlags::ET.bits(), 1 << 31);
    }

    #[test]
    fn payload_survives_native_conversion() {
        let cases = [
            EpollData::Fd(17),
            EpollData::U32(0xdead_beef),
            EpollData::U64(u64::MAX - 1),
            EpollData::Ptr(0x1000 as *mut libc::c_void),
        ];
        for data in cases {
            let ev = EpollEvent::new(EventFlags::IN | EventFlags::ET, data);
            let back = EpollEvent::from_native(&ev.to_native(), data.kind());
            assert_eq!(back, ev);
        }
    }

    #[test]
    fn del_with_unregistered_fd_passes_host_error_through() {
        let poller = Poller::new().unwrap();
        let err = poller.remove(poller.epfd.as_raw_fd()).unwrap_err();
        assert!(err.raw_os_error().is_some());
    }
}
