/// Errors that can occur in audit session operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] auditprims_transport::TransportError),

    /// Encoding or decoding error.
    #[error("frame error: {0}")]
    Frame(#[from] auditprims_frame::FrameError),

    /// The kernel acknowledged the request with a non-zero code.
    #[error("kernel rejected request: {}", os_error(.code))]
    KernelRejected { code: i32 },

    /// A control argument is outside its accepted values.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The ack carried a different sequence (strict skew policy only).
    #[error("sequence skew: expected {expected}, got {got}")]
    SequenceSkew { expected: i16, got: i16 },

    /// A reply of an unexpected type arrived where a specific one was needed.
    #[error("unexpected reply type {msg_type}")]
    UnexpectedReply { msg_type: u16 },
}

impl ClientError {
    /// Positive errno equivalent of this error.
    pub fn errno(&self) -> i32 {
        match self {
            Self::Transport(err) => err.errno(),
            Self::Frame(err) => err.errno(),
            Self::KernelRejected { code } => code.wrapping_abs(),
            Self::InvalidArgument(_) => libc::EINVAL,
            Self::SequenceSkew { .. } | Self::UnexpectedReply { .. } => libc::EPROTO,
        }
    }
}

fn os_error(code: &i32) -> std::io::Error {
    std::io::Error::from_raw_os_error(code.wrapping_abs())
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use auditprims_frame::FrameError;
    use auditprims_transport::TransportError;

    use super::*;

    #[test]
    fn errno_mapping() {
        assert_eq!(
            ClientError::from(TransportError::InvalidDescriptor(-1)).errno(),
            libc::EBADF
        );
        assert_eq!(
            ClientError::from(FrameError::BadMessage {
                declared: 40,
                received: 20
            })
            .errno(),
            libc::EBADE
        );
        assert_eq!(ClientError::KernelRejected { code: -13 }.errno(), 13);
        assert_eq!(ClientError::KernelRejected { code: 13 }.errno(), 13);
        assert_eq!(
            ClientError::InvalidArgument("x".into()).errno(),
            libc::EINVAL
        );
    }

    #[test]
    fn kernel_rejected_displays_os_error() {
        let text = ClientError::KernelRejected { code: -1 }.to_string();
        assert!(text.starts_with("kernel rejected request:"));
        assert!(text.contains("os error 1"));
    }
}
