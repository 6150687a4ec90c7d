//! Connected duplex pair over loopback TCP.
//!
//! The host has no `socketpair`, so one is fabricated:
//!
//! ```text
//! listener  = socket(); SO_REUSEADDR; bind(loopback:0); listen(1)
//! addr      = getsockname(listener), family/address forced to loopback
//! connector = socket(); connect(addr)
//! accepted  = accept(listener); peer must be connector's own address
//! close(listener) → (accepted, connector)
//! ```
//!
//! Every endpoint is an [`OwnedFd`] from the moment it exists, so an early
//! return closes exactly the endpoints created so far and nothing twice.
//! The attempt is made once; the listener picks its own port so there is
//! no collision to retry.

use std::io;
use std::mem;
use std::net::{Ipv4Addr, Ipv6Addr, TcpStream};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use libc::c_int;

use crate::error::{PairError, PairStep};

/// Loopback-capable address families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketDomain {
    Inet,
    Inet6,
}

impl SocketDomain {
    fn family(self) -> c_int {
        match self {
            SocketDomain::Inet => libc::AF_INET,
            SocketDomain::Inet6 => libc::AF_INET6,
        }
    }
}

impl TryFrom<c_int> for SocketDomain {
    type Error = c_int;

    fn try_from(raw: c_int) -> Result<Self, Self::Error> {
        match raw {
            libc::AF_INET => Ok(SocketDomain::Inet),
            libc::AF_INET6 => Ok(SocketDomain::Inet6),
            other => Err(other),
        }
    }
}

/// Create a connected pair. Only stream sockets in `AF_INET`/`AF_INET6`
/// with protocol `0` or `IPPROTO_TCP` are accepted; `SOCK_CLOEXEC` in `ty`
/// is allowed and is always applied anyway.
pub fn socket_pair(domain: c_int, ty: c_int, protocol: c_int) -> Result<(OwnedFd, OwnedFd), PairError> {
    socket_pair_with(domain, ty, protocol, |_| Ok(()))
}

/// [`socket_pair`] with a hook that runs before each step.
///
/// An error from `checkpoint` aborts the sequence at that step exactly as
/// a failing host call would, which lets callers exercise the cleanup path.
pub fn socket_pair_with<F>(
    domain: c_int,
    ty: c_int,
    protocol: c_int,
    mut checkpoint: F,
) -> Result<(OwnedFd, OwnedFd), PairError>
where
    F: FnMut(PairStep) -> io::Result<()>,
{
    let unsupported = PairError::Unsupported {
        domain,
        ty,
        protocol,
    };
    let Ok(domain) = SocketDomain::try_from(domain) else {
        return Err(unsupported);
    };
    if ty & !libc::SOCK_CLOEXEC != libc::SOCK_STREAM {
        return Err(unsupported);
    }
    if protocol != 0 && protocol != libc::IPPROTO_TCP {
        return Err(unsupported);
    }

    fabricate(domain, &mut checkpoint)
}

/// An IPv4 loopback pair as standard library streams.
pub fn stream_pair() -> Result<(TcpStream, TcpStream), PairError> {
    let (a, b) = socket_pair(libc::AF_INET, libc::SOCK_STREAM, 0)?;
    Ok((TcpStream::from(a), TcpStream::from(b)))
}

fn fabricate<F>(domain: SocketDomain, checkpoint: &mut F) -> Result<(OwnedFd, OwnedFd), PairError>
where
    F: FnMut(PairStep) -> io::Result<()>,
{
    let listener = attempt(PairStep::CreateListener, checkpoint, || new_socket(domain))?;
    attempt(PairStep::ReuseAddr, checkpoint, || enable_reuse(&listener))?;
    attempt(PairStep::Bind, checkpoint, || {
        bind(&listener, &SockAddr::loopback(domain))
    })?;
    attempt(PairStep::Listen, checkpoint, || listen(&listener))?;

    let mut target = attempt(PairStep::LocalAddr, checkpoint, || local_addr(&listener))?;
    // getsockname can report the unspecified address on some hosts.
    target.force_loopback();

    let connector = attempt(PairStep::CreateConnector, checkpoint, || new_socket(domain))?;
    attempt(PairStep::Connect, checkpoint, || connect(&connector, &target))?;
    let accepted = attempt(PairStep::Accept, checkpoint, || accept(&listener))?;
    attempt(PairStep::VerifyPeer, checkpoint, || verify_peer(&accepted, &connector))?;

    drop(listener);
    tracing::trace!(
        accepted = accepted.as_raw_fd(),
        connector = connector.as_raw_fd(),
        "socket pair created"
    );
    Ok((accepted, connector))
}

fn attempt<T, F>(
    step: PairStep,
    checkpoint: &mut F,
    op: impl FnOnce() -> io::Result<T>,
) -> Result<T, PairError>
where
    F: FnMut(PairStep) -> io::Result<()>,
{
    checkpoint(step).and_then(|()| op()).map_err(|source| {
        tracing::debug!(%step, error = %source, os_error = ?source.raw_os_error(), "socket pair step failed");
        PairError::Failed { step, source }
    })
}

// ---------------------------------------------------------------------------
// Host calls
// ---------------------------------------------------------------------------

fn cvt(rc: c_int) -> io::Result<c_int> {
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(rc)
    }
}

fn new_socket(domain: SocketDomain) -> io::Result<OwnedFd> {
    // SAFETY: plain syscall; the returned descriptor is owned from here on.
    let fd = cvt(unsafe { libc::socket(domain.family(), libc::SOCK_STREAM | libc::SOCK_CLOEXEC, 0) })?;
    // SAFETY: `fd` is a fresh descriptor nobody else owns.
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

fn enable_reuse(sock: &OwnedFd) -> io::Result<()> {
    let on: c_int = 1;
    // SAFETY: `on` outlives the call and the length matches its type.
    cvt(unsafe {
        libc::setsockopt(
            sock.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_REUSEADDR,
            &on as *const c_int as *const libc::c_void,
            mem::size_of::<c_int>() as libc::socklen_t,
        )
    })
    .map(drop)
}

fn bind(sock: &OwnedFd, addr: &SockAddr) -> io::Result<()> {
    let (ptr, len) = addr.as_raw();
    // SAFETY: `ptr`/`len` describe a live sockaddr owned by `addr`.
    cvt(unsafe { libc::bind(sock.as_raw_fd(), ptr, len) }).map(drop)
}

fn listen(sock: &OwnedFd) -> io::Result<()> {
    // SAFETY: plain syscall on a descriptor we own.
    cvt(unsafe { libc::listen(sock.as_raw_fd(), 1) }).map(drop)
}

fn connect(sock: &OwnedFd, addr: &SockAddr) -> io::Result<()> {
    let (ptr, len) = addr.as_raw();
    loop {
        // SAFETY: `ptr`/`len` describe a live sockaddr owned by `addr`.
        match cvt(unsafe { libc::connect(sock.as_raw_fd(), ptr, len) }) {
            Ok(_) => return Ok(()),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

fn accept(listener: &OwnedFd) -> io::Result<OwnedFd> {
    loop {
        // SAFETY: null address pointers are allowed; we don't need the peer here.
        let rc = unsafe {
            libc::accept4(
                listener.as_raw_fd(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                libc::SOCK_CLOEXEC,
            )
        };
        match cvt(rc) {
            // SAFETY: `fd` is a fresh descriptor nobody else owns.
            Ok(fd) => return Ok(unsafe { OwnedFd::from_raw_fd(fd) }),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

fn local_addr(sock: &OwnedFd) -> io::Result<SockAddr> {
    query_addr(sock, libc::getsockname)
}

fn peer_addr(sock: &OwnedFd) -> io::Result<SockAddr> {
    query_addr(sock, libc::getpeername)
}

type AddrQuery = unsafe extern "C" fn(c_int, *mut libc::sockaddr, *mut libc::socklen_t) -> c_int;

fn query_addr(sock: &OwnedFd, query: AddrQuery) -> io::Result<SockAddr> {
    // SAFETY: an all-zero sockaddr_storage is a valid value.
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
    // SAFETY: `storage` is large enough for any address and `len` says so.
    cvt(unsafe {
        query(
            sock.as_raw_fd(),
            &mut storage as *mut libc::sockaddr_storage as *mut libc::sockaddr,
            &mut len,
        )
    })?;
    SockAddr::from_storage(&storage)
}

/// The accepted endpoint must be the one we connected. Anything else is a
/// third party that raced us to the listener.
fn verify_peer(accepted: &OwnedFd, connector: &OwnedFd) -> io::Result<()> {
    let peer = peer_addr(accepted)?;
    let ours = local_addr(connector)?;
    if peer.same_endpoint(&ours) {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "accepted connection did not come from the connecting endpoint",
        ))
    }
}

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum SockAddr {
    V4(libc::sockaddr_in),
    V6(libc::sockaddr_in6),
}

impl SockAddr {
    fn loopback(domain: SocketDomain) -> Self {
        let mut addr = match domain {
            // SAFETY: all-zero is a valid sockaddr_in / sockaddr_in6.
            SocketDomain::Inet => SockAddr::V4(unsafe { mem::zeroed() }),
            SocketDomain::Inet6 => SockAddr::V6(unsafe { mem::zeroed() }),
        };
        addr.force_loopback();
        addr
    }

    fn from_storage(storage: &libc::sockaddr_storage) -> io::Result<Self> {
        match c_int::from(storage.ss_family) {
            libc::AF_INET => {
                // SAFETY: family says the storage holds a sockaddr_in.
                let sin = unsafe { *(storage as *const _ as *const libc::sockaddr_in) };
                Ok(SockAddr::V4(sin))
            }
            libc::AF_INET6 => {
                // SAFETY: family says the storage holds a sockaddr_in6.
                let sin6 = unsafe { *(storage as *const _ as *const libc::sockaddr_in6) };
                Ok(SockAddr::V6(sin6))
            }
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unexpected address family {other}"),
            )),
        }
    }

    /// Keep the port, reset family and address to loopback.
    fn force_loopback(&mut self) {
        match self {
            SockAddr::V4(sin) => {
                sin.sin_family = libc::AF_INET as libc::sa_family_t;
                sin.sin_addr.s_addr = u32::from(Ipv4Addr::LOCALHOST).to_be();
            }
            SockAddr::V6(sin6) => {
                sin6.sin6_family = libc::AF_INET6 as libc::sa_family_t;
                sin6.sin6_addr.s6_addr = Ipv6Addr::LOCALHOST.octets();
            }
        }
    }

    fn same_endpoint(&self, other: &SockAddr) -> bool {
        match (self, other) {
            (SockAddr::V4(a), SockAddr::V4(b)) => {
                a.sin_port == b.sin_port && a.sin_addr.s_addr == b.sin_addr.s_addr
            }
            (SockAddr::V6(a), SockAddr::V6(b)) => {
                a.sin6_port == b.sin6_port && a.sin6_addr.s6_addr == b.sin6_addr.s6_addr
            }
            _ => false,
        }
    }

    fn as_raw(&self) -> (*const libc::sockaddr, libc::socklen_t) {
        match self {
            SockAddr::V4(sin) => (
                sin as *const libc::sockaddr_in as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
            ),
            SockAddr::V6(sin6) => (
                sin6 as *const libc::sockaddr_in6 as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t,
            ),
        }
    }
}
