/// Errors that can occur during message encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The message does not fit the protocol's maximum size.
    #[error("netlink message too large ({size} bytes, max {max})")]
    TooLarge { size: usize, max: usize },

    /// The header disagrees with the bytes actually received.
    #[error("bad kernel response: header declares {declared} bytes, received {received}")]
    BadMessage { declared: u32, received: usize },

    /// The body is too short for the shape its type implies.
    #[error("bad kernel response: type {msg_type} body is {len} bytes, need {min}")]
    ShortBody {
        msg_type: u16,
        len: usize,
        min: usize,
    },
}

impl FrameError {
    /// Positive errno equivalent of this error.
    pub fn errno(&self) -> i32 {
        match self {
            Self::TooLarge { .. } => libc::EFBIG,
            Self::BadMessage { .. } | Self::ShortBody { .. } => libc::EBADE,
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
