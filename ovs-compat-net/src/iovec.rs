//! Scatter/gather transfers.
//!
//! Buffer sequences are [`IoSlice`] / [`IoSliceMut`], which are laid out as
//! the host's `iovec`. A transfer covers the whole sequence in order as one
//! call. Short counts are normal; the caller re-issues for the rest.

use std::io::{self, IoSlice, IoSliceMut};
use std::mem;
use std::os::fd::{AsRawFd, BorrowedFd};
use std::ptr;

use bitflags::bitflags;

/// Most buffers the host takes in one call; longer sequences transfer a prefix.
pub const IOV_MAX: usize = 1024;

bitflags! {
    /// Per-call and per-message flags (`MSG_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MsgFlags: i32 {
        const OOB = libc::MSG_OOB;
        const PEEK = libc::MSG_PEEK;
        const DONTWAIT = libc::MSG_DONTWAIT;
        const WAITALL = libc::MSG_WAITALL;
        const NOSIGNAL = libc::MSG_NOSIGNAL;
        const EOR = libc::MSG_EOR;
        const TRUNC = libc::MSG_TRUNC;
        const CTRUNC = libc::MSG_CTRUNC;
    }
}

/// Outgoing message envelope.
#[derive(Debug, Default)]
pub struct MsgOut<'a> {
    /// Destination address bytes; `None` on a connected socket.
    pub name: Option<&'a [u8]>,
    pub iov: &'a [IoSlice<'a>],
    /// Ancillary data (`cmsghdr` records).
    pub control: Option<&'a [u8]>,
}

/// Incoming message envelope.
#[derive(Debug)]
pub struct MsgIn<'a, 'b> {
    /// Receives the source address, if wanted.
    pub name: Option<&'a mut [u8]>,
    pub iov: &'a mut [IoSliceMut<'b>],
    /// Receives ancillary data, if wanted.
    pub control: Option<&'a mut [u8]>,
}

/// What [`recv_msg`] filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Received {
    pub bytes: usize,
    pub name_len: usize,
    pub control_len: usize,
    /// Flags the host set on the message, e.g. [`MsgFlags::TRUNC`].
    pub flags: MsgFlags,
}

/// Sum of buffer lengths.
pub fn total_len(bufs: &[IoSlice<'_>]) -> usize {
    bufs.iter().map(|b| b.len()).sum()
}

fn iov_count(len: usize) -> libc::c_int {
    len.min(IOV_MAX) as libc::c_int
}

fn cvt(rc: isize) -> io::Result<usize> {
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(rc as usize)
    }
}

/// Read into `bufs` in order (`readv`).
pub fn scatter_read(fd: BorrowedFd<'_>, bufs: &mut [IoSliceMut<'_>]) -> io::Result<usize> {
    // SAFETY: IoSliceMut is ABI-compatible with iovec and each slice is live and writable.
    let rc = unsafe {
        libc::readv(
            fd.as_raw_fd(),
            bufs.as_mut_ptr() as *mut libc::iovec as *const libc::iovec,
            iov_count(bufs.len()),
        )
    };
    cvt(rc)
}

/// Write `bufs` in order (`writev`).
pub fn gather_write(fd: BorrowedFd<'_>, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
    // SAFETY: IoSlice is ABI-compatible with iovec and each slice is live.
    let rc = unsafe {
        libc::writev(
            fd.as_raw_fd(),
            bufs.as_ptr() as *const libc::iovec,
            iov_count(bufs.len()),
        )
    };
    cvt(rc)
}

/// Send one message (`sendmsg`).
pub fn send_msg(fd: BorrowedFd<'_>, msg: &MsgOut<'_>, flags: MsgFlags) -> io::Result<usize> {
    // SAFETY: all-zero is a valid msghdr.
    let mut hdr: libc::msghdr = unsafe { mem::zeroed() };
    if let Some(name) = msg.name {
        hdr.msg_name = name.as_ptr() as *mut libc::c_void;
        hdr.msg_namelen = name.len() as libc::socklen_t;
    }
    hdr.msg_iov = msg.iov.as_ptr() as *mut libc::iovec;
    hdr.msg_iovlen = msg.iov.len().min(IOV_MAX) as _;
    if let Some(control) = msg.control {
        hdr.msg_control = control.as_ptr() as *mut libc::c_void;
        hdr.msg_controllen = control.len() as _;
    }
    // SAFETY: every pointer in `hdr` borrows from `msg`, which outlives the call;
    // the host only reads through them.
    let rc = unsafe { libc::sendmsg(fd.as_raw_fd(), &hdr, flags.bits()) };
    cvt(rc)
}

/// Receive one message (`recvmsg`).
pub fn recv_msg(fd: BorrowedFd<'_>, msg: &mut MsgIn<'_, '_>, flags: MsgFlags) -> io::Result<Received> {
    // SAFETY: all-zero is a valid msghdr.
    let mut hdr: libc::msghdr = unsafe { mem::zeroed() };
    match msg.name.as_deref_mut() {
        Some(name) => {
            hdr.msg_name = name.as_mut_ptr() as *mut libc::c_void;
            hdr.msg_namelen = name.len() as libc::socklen_t;
        }
        None => hdr.msg_name = ptr::null_mut(),
    }
    hdr.msg_iov = msg.iov.as_mut_ptr() as *mut libc::iovec;
    hdr.msg_iovlen = msg.iov.len().min(IOV_MAX) as _;
    if let Some(control) = msg.control.as_deref_mut() {
        hdr.msg_control = control.as_mut_ptr() as *mut libc::c_void;
        hdr.msg_controllen = control.len() as _;
    }
    // SAFETY: every pointer in `hdr` borrows mutably from `msg` for the call.
    let rc = unsafe { libc::recvmsg(fd.as_raw_fd(), &mut hdr, flags.bits()) };
    let bytes = cvt(rc)?;
    Ok(Received {
        bytes,
        name_len: hdr.msg_namelen as usize,
        control_len: hdr.msg_controllen as usize,
        flags: MsgFlags::from_bits_retain(hdr.msg_flags),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::fd::AsFd;

    use crate::pair::stream_pair;

    #[test]
    fn gather_write_then_scatter_read_preserves_order() {
        let (a, b) = stream_pair().unwrap();
        let parts = [IoSlice::new(b"alpha-"), IoSlice::new(b"beta-"), IoSlice::new(b"gamma")];
        let written = gather_write(a.as_fd(), &parts).unwrap();
        assert_eq!(written, total_len(&parts));

        let mut first = [0u8; 4];
        let mut rest = [0u8; 64];
        let mut got = 0;
        while got < written {
            // Re-issue for the remainder on a short read.
            let (head, tail) = if got < first.len() {
                (&mut first[got..], &mut rest[..])
            } else {
                (&mut first[..0], &mut rest[got - 4..])
            };
            let mut bufs = [IoSliceMut::new(head), IoSliceMut::new(tail)];
            let n = scatter_read(b.as_fd(), &mut bufs).unwrap();
            assert!(n > 0);
            got += n;
        }
        assert_eq!(&first, b"alph");
        assert_eq!(&rest[..written - 4], b"a-beta-gamma");
    }

    #[test]
    fn empty_sequence_transfers_nothing() {
        let (a, _b) = stream_pair().unwrap();
        assert_eq!(gather_write(a.as_fd(), &[]).unwrap(), 0);
    }

    #[test]
    fn msg_envelope_roundtrip_on_connected_pair() {
        let (a, b) = stream_pair().unwrap();
        let iov = [IoSlice::new(b"hdr:"), IoSlice::new(b"body")];
        let out = MsgOut {
            name: None,
            iov: &iov,
            control: None,
        };
        assert_eq!(send_msg(a.as_fd(), &out, MsgFlags::NOSIGNAL).unwrap(), 8);

        let mut buf = [0u8; 8];
        let mut control = [0u8; 64];
        let mut iov = [IoSliceMut::new(&mut buf)];
        let mut msg = MsgIn {
            name: None,
            iov: &mut iov,
            control: Some(&mut control),
        };
        let got = recv_msg(b.as_fd(), &mut msg, MsgFlags::WAITALL).unwrap();
        assert_eq!(got.bytes, 8);
        assert_eq!(got.control_len, 0);
        assert!(!got.flags.contains(MsgFlags::CTRUNC));
        assert_eq!(&buf, b"hdr:body");
    }

    #[test]
    fn peek_leaves_data_queued() {
        let (a, b) = stream_pair().unwrap();
        gather_write(a.as_fd(), &[IoSlice::new(b"xyz")]).unwrap();

        let mut peeked = [0u8; 3];
        let mut iov = [IoSliceMut::new(&mut peeked)];
        let mut msg = MsgIn {
            name: None,
            iov: &mut iov,
            control: None,
        };
        let got = recv_msg(b.as_fd(), &mut msg, MsgFlags::PEEK | MsgFlags::WAITALL).unwrap();
        assert_eq!(got.bytes, 3);

        let mut again = [0u8; 3];
        let n = scatter_read(b.as_fd(), &mut [IoSliceMut::new(&mut again)]).unwrap();
        assert_eq!(&again[..n], &b"xyz"[..n]);
        assert_eq!(peeked, *b"xyz");
    }
}
