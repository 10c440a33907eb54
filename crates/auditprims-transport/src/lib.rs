//! Netlink audit socket transport.
//!
//! This is the lowest layer of auditprims. It owns the datagram plumbing
//! between user space and the kernel audit subsystem:
//! - opening and closing the `NETLINK_AUDIT` socket (Linux)
//! - sending a datagram to the kernel, retrying only on `EINTR`
//! - receiving a datagram, retrying only on `EINTR`, with non-blocking
//!   "nothing queued" reported as `Ok(None)`
//! - rejecting datagrams whose sender is not the kernel
//!
//! Everything above this layer talks to the socket through the
//! [`NetlinkIo`] trait, so the exchange logic can run against a simulated
//! kernel in tests.

pub mod datagram;
pub mod error;
pub mod traits;

#[cfg(target_os = "linux")]
pub mod netlink;

pub use datagram::{check_descriptor, recv_datagram, send_datagram};
pub use error::{Result, TransportError};
pub use traits::{NetlinkIo, RecvFlags, RecvMode, SenderAddr, KERNEL_PORT_ID, SOCKADDR_NL_LEN};

#[cfg(target_os = "linux")]
pub use netlink::{AuditSocket, BorrowedAuditSocket, NETLINK_AUDIT};
