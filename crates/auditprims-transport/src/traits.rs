use std::io;
use std::os::fd::RawFd;

/// Size of `struct sockaddr_nl` as reported by `recvfrom`.
pub const SOCKADDR_NL_LEN: usize = 12;

/// Netlink port id reserved for the kernel.
pub const KERNEL_PORT_ID: u32 = 0;

/// Whether a receive may block waiting for a datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecvMode {
    #[default]
    Blocking,
    NonBlocking,
}

/// Flags for a single receive attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecvFlags {
    /// Return immediately when nothing is queued (`MSG_DONTWAIT`).
    pub dont_wait: bool,
    /// Leave the datagram queued (`MSG_PEEK`).
    pub peek: bool,
}

impl RecvFlags {
    pub fn new(mode: RecvMode, peek: bool) -> Self {
        Self {
            dont_wait: mode == RecvMode::NonBlocking,
            peek,
        }
    }

    /// The `recvfrom` flag word for these options.
    pub fn as_raw(self) -> libc::c_int {
        let mut flags = 0;
        if self.dont_wait {
            flags |= libc::MSG_DONTWAIT;
        }
        if self.peek {
            flags |= libc::MSG_PEEK;
        }
        flags
    }
}

/// Sender address reported alongside a received datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderAddr {
    /// Address length written back by the kernel.
    pub len: usize,
    /// Netlink port id of the sender (0 for the kernel).
    pub pid: u32,
}

impl SenderAddr {
    /// The address every genuine kernel datagram carries.
    pub const fn kernel() -> Self {
        Self {
            len: SOCKADDR_NL_LEN,
            pid: KERNEL_PORT_ID,
        }
    }
}

/// Single-attempt datagram I/O against the kernel audit endpoint.
///
/// Implementations perform exactly one system call per method and report
/// `EINTR`/`EAGAIN` as plain `io::Error`s; retry policy lives in
/// [`crate::datagram`].
pub trait NetlinkIo {
    /// The raw descriptor backing this endpoint. May be negative.
    fn raw_fd(&self) -> RawFd;

    /// Send one datagram to the kernel, returning bytes accepted.
    fn send_to_kernel(&mut self, datagram: &[u8]) -> io::Result<usize>;

    /// Receive one datagram into `buf`, returning its length and sender.
    fn recv_from(&mut self, buf: &mut [u8], flags: RecvFlags) -> io::Result<(usize, SenderAddr)>;
}

impl<T: NetlinkIo + ?Sized> NetlinkIo for &mut T {
    fn raw_fd(&self) -> RawFd {
        (**self).raw_fd()
    }

    fn send_to_kernel(&mut self, datagram: &[u8]) -> io::Result<usize> {
        (**self).send_to_kernel(datagram)
    }

    fn recv_from(&mut self, buf: &mut [u8], flags: RecvFlags) -> io::Result<(usize, SenderAddr)> {
        (**self).recv_from(buf, flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recv_flags_from_mode() {
        assert_eq!(RecvFlags::new(RecvMode::Blocking, false).as_raw(), 0);
        assert_eq!(
            RecvFlags::new(RecvMode::NonBlocking, false).as_raw(),
            libc::MSG_DONTWAIT
        );
        assert_eq!(
            RecvFlags::new(RecvMode::NonBlocking, true).as_raw(),
            libc::MSG_DONTWAIT | libc::MSG_PEEK
        );
        assert_eq!(
            RecvFlags::new(RecvMode::Blocking, true).as_raw(),
            libc::MSG_PEEK
        );
    }
}
