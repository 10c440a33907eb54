use std::os::fd::RawFd;

/// Errors that can occur while moving datagrams over the audit socket.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The socket handle is negative.
    #[error("invalid audit socket descriptor {0}")]
    InvalidDescriptor(RawFd),

    /// Failed to create the netlink audit socket.
    #[error("failed to open netlink audit socket: {0}")]
    Open(#[source] std::io::Error),

    /// Failed to close the netlink audit socket.
    #[error("failed to close audit socket {fd}: {source}")]
    Close {
        fd: RawFd,
        source: std::io::Error,
    },

    /// The kernel accepted fewer bytes than the datagram holds.
    #[error("protocol fault: short write ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },

    /// The datagram send failed outright.
    #[error("protocol fault: send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// The reported sender address has an unexpected size.
    #[error("protocol fault: sender address is {len} bytes, expected {expected}")]
    BadSenderAddress { len: usize, expected: usize },

    /// The datagram did not come from the kernel.
    #[error("invalid netlink sender port {pid}, expected kernel port 0")]
    SpoofedSender { pid: u32 },

    /// Receive failed with something other than `EINTR`.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Whether this error belongs to the protocol-fault class
    /// (partial write, failed send, malformed sender address).
    pub fn is_protocol_fault(&self) -> bool {
        matches!(
            self,
            Self::ShortWrite { .. } | Self::SendFailed(_) | Self::BadSenderAddress { .. }
        )
    }

    /// Positive errno equivalent of this error.
    pub fn errno(&self) -> i32 {
        match self {
            Self::InvalidDescriptor(_) => libc::EBADF,
            Self::ShortWrite { .. } | Self::SendFailed(_) | Self::BadSenderAddress { .. } => {
                libc::EPROTO
            }
            Self::SpoofedSender { .. } => libc::EINVAL,
            Self::Open(source) | Self::Close { source, .. } | Self::Io(source) => {
                source.raw_os_error().unwrap_or(libc::EIO)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
