//! # ovs-compat-net
//!
//! Socket-level compatibility pieces for a host backend built on loopback
//! TCP, `readv`/`writev`, and epoll.
//!
//! - [`pair`]: connected duplex pair fabricated from listen/connect/accept
//! - [`iovec`]: scatter/gather transfers and message envelopes
//! - [`poll`]: readiness-event shapes and a one-to-one epoll pass-through

pub mod error;
pub mod iovec;
pub mod pair;
pub mod poll;

pub use error::{PairError, PairStep};
pub use iovec::{gather_write, recv_msg, scatter_read, send_msg, MsgFlags, MsgIn, MsgOut, Received};
pub use pair::{socket_pair, socket_pair_with, stream_pair, SocketDomain};
pub use poll::{CtlOp, EpollData, EpollEvent, EventFlags, PayloadKind, Poller};
