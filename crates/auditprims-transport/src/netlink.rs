use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};

use tracing::{debug, error, info};

use crate::error::{Result, TransportError};
use crate::traits::{NetlinkIo, RecvFlags, SenderAddr};

/// Netlink protocol unit of the kernel audit subsystem.
pub const NETLINK_AUDIT: libc::c_int = libc::NETLINK_AUDIT;

/// An owned `NETLINK_AUDIT` socket.
///
/// Closed on drop. Use [`AuditSocket::close`] to observe close errors.
#[derive(Debug)]
pub struct AuditSocket {
    fd: OwnedFd,
}

impl AuditSocket {
    /// Open a raw netlink socket bound to the audit protocol.
    ///
    /// Requires `CAP_AUDIT_CONTROL` for most control requests to succeed,
    /// but opening itself is unprivileged.
    pub fn open() -> Result<Self> {
        // SAFETY: socket(2) has no pointer arguments.
        let fd = unsafe {
            libc::socket(
                libc::AF_NETLINK,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                NETLINK_AUDIT,
            )
        };
        if fd < 0 {
            return Err(TransportError::Open(io::Error::last_os_error()));
        }

        // SAFETY: `fd` was just returned by socket(2) and is owned by nobody else.
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };
        info!(fd = fd.as_raw_fd(), "opened netlink audit socket");
        Ok(Self { fd })
    }

    /// Close the socket, reporting failure instead of swallowing it.
    pub fn close(self) -> Result<()> {
        let fd = self.fd.into_raw_fd();
        // SAFETY: `fd` came from `into_raw_fd`, so this is its only close.
        let rc = unsafe { libc::close(fd) };
        if rc < 0 {
            let source = io::Error::last_os_error();
            error!(fd, %source, "attempting to close invalid audit socket");
            return Err(TransportError::Close { fd, source });
        }
        debug!(fd, "closed netlink audit socket");
        Ok(())
    }

    /// Borrow this socket as a [`BorrowedAuditSocket`].
    pub fn as_borrowed(&self) -> BorrowedAuditSocket {
        BorrowedAuditSocket::new(self.fd.as_raw_fd())
    }
}

impl From<OwnedFd> for AuditSocket {
    fn from(fd: OwnedFd) -> Self {
        Self { fd }
    }
}

impl From<AuditSocket> for OwnedFd {
    fn from(sock: AuditSocket) -> Self {
        sock.fd
    }
}

impl AsFd for AuditSocket {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for AuditSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl NetlinkIo for AuditSocket {
    fn raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }

    fn send_to_kernel(&mut self, datagram: &[u8]) -> io::Result<usize> {
        sendto_kernel(self.fd.as_raw_fd(), datagram)
    }

    fn recv_from(&mut self, buf: &mut [u8], flags: RecvFlags) -> io::Result<(usize, SenderAddr)> {
        recvfrom_kernel(self.fd.as_raw_fd(), buf, flags)
    }
}

/// A caller-owned audit socket descriptor.
///
/// The descriptor is not validated here and is never closed; every
/// exchange checks it is non-negative before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowedAuditSocket {
    fd: RawFd,
}

impl BorrowedAuditSocket {
    pub fn new(fd: RawFd) -> Self {
        Self { fd }
    }
}

impl NetlinkIo for BorrowedAuditSocket {
    fn raw_fd(&self) -> RawFd {
        self.fd
    }

    fn send_to_kernel(&mut self, datagram: &[u8]) -> io::Result<usize> {
        sendto_kernel(self.fd, datagram)
    }

    fn recv_from(&mut self, buf: &mut [u8], flags: RecvFlags) -> io::Result<(usize, SenderAddr)> {
        recvfrom_kernel(self.fd, buf, flags)
    }
}

fn kernel_addr() -> libc::sockaddr_nl {
    // SAFETY: sockaddr_nl is plain old data; all-zero is a valid value.
    let mut addr: libc::sockaddr_nl = unsafe { std::mem::zeroed() };
    addr.nl_family = libc::AF_NETLINK as libc::sa_family_t;
    addr
}

fn sendto_kernel(fd: RawFd, datagram: &[u8]) -> io::Result<usize> {
    let addr = kernel_addr();

    // SAFETY: `datagram` is readable for its length and `addr` is a valid
    // sockaddr_nl whose size is passed alongside it.
    let rc = unsafe {
        libc::sendto(
            fd,
            datagram.as_ptr().cast::<libc::c_void>(),
            datagram.len(),
            0,
            (&addr as *const libc::sockaddr_nl).cast::<libc::sockaddr>(),
            std::mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t,
        )
    };

    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(rc as usize)
    }
}

fn recvfrom_kernel(
    fd: RawFd,
    buf: &mut [u8],
    flags: RecvFlags,
) -> io::Result<(usize, SenderAddr)> {
    let mut addr = kernel_addr();
    let mut addr_len = std::mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t;

    // SAFETY: `buf` is writable for its length; `addr` and `addr_len` are
    // valid writable pointers sized for a sockaddr_nl.
    let rc = unsafe {
        libc::recvfrom(
            fd,
            buf.as_mut_ptr().cast::<libc::c_void>(),
            buf.len(),
            flags.as_raw(),
            (&mut addr as *mut libc::sockaddr_nl).cast::<libc::sockaddr>(),
            &mut addr_len,
        )
    };

    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok((
        rc as usize,
        SenderAddr {
            len: addr_len as usize,
            pid: addr.nl_pid,
        },
    ))
}
