//! Netlink audit message encoding and zero-copy reply classification.
//!
//! Every audit message is a netlink datagram:
//! - a 16-byte `nlmsghdr` (length, type, flags, sequence, port id)
//! - a body padded to 4-byte alignment
//!
//! Requests are encoded into owned buffers; replies are decoded in place and
//! classified by type into a [`Reply`] that borrows the receive buffer.

pub mod codec;
pub mod error;
pub mod msg_type;
pub mod payload;
pub mod reply;

pub use codec::{
    align, encode_message, encode_request, message_space, NlHeader, RequestMessage, ALIGNTO,
    HEADER_SIZE, MAX_AUDIT_MESSAGE_LENGTH, NLM_F_ACK, NLM_F_REQUEST, RECV_BUFFER_SIZE,
    REQUEST_FLAGS,
};
pub use error::{FrameError, Result};
pub use msg_type::{
    type_name, AUDIT_GET, AUDIT_LIST_RULES, AUDIT_LOGSPLIT_SET, AUDIT_SET, AUDIT_SIGNAL_INFO,
    NLMSG_DONE, NLMSG_ERROR, NLMSG_NOOP,
};
pub use payload::{
    AuditStatus, ErrorView, LogSplit, LogSplitStatus, SignalInfoView, StatusView,
    AUDIT_STATUS_BACKLOG_LIMIT, AUDIT_STATUS_ENABLED, AUDIT_STATUS_FAILURE, AUDIT_STATUS_PID,
    AUDIT_STATUS_RATE_LIMIT, AUDIT_STATUS_SIZE,
};
pub use reply::{decode_reply, Reply, ReplyBody};
