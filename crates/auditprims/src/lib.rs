//! Kernel audit control over netlink.
//!
//! auditprims lets a privileged process register itself as the kernel's
//! audit event consumer, toggle log splitting, read audit status, and
//! exchange arbitrary audit control messages.
//!
//! # Crate Structure
//!
//! - [`transport`] - Netlink audit socket and interruption-safe datagram I/O
//! - [`frame`] - Message encoding and zero-copy reply classification
//! - [`client`] - Sequenced sessions and control verbs (behind `client` feature)

/// Re-export transport types.
pub mod transport {
    pub use auditprims_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use auditprims_frame::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use auditprims_client::*;
}
