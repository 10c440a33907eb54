//! Audit control session over a netlink audit socket.
//!
//! This is the "just works" layer. An [`AuditSession`] sends sequenced
//! requests, correlates the kernel's acknowledgement, receives classified
//! replies, and implements the control verbs (registering the audit
//! daemon pid, toggling log splitting, reading status).
//!
//! A session is not synchronized. Callers sharing one socket across
//! threads must hold a lock across each send and its acknowledgement.

pub mod control;
pub mod error;
pub mod sequence;
pub mod session;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use control::WaitMode;
pub use error::{ClientError, Result};
pub use sequence::SequenceTracker;
pub use session::{AuditSession, SessionConfig, SkewPolicy};

pub use auditprims_frame::{LogSplit, Reply, ReplyBody};
pub use auditprims_transport::RecvMode;

#[cfg(target_os = "linux")]
pub use session::{attach, open};
