//! Netlink and audit message type tags.
//!
//! Types below 16 are netlink control messages.
//! Types 1000-1099 are audit control requests and their replies.

/// No-op; carries no data.
pub const NLMSG_NOOP: u16 = 1;

/// Error or acknowledgement (error code 0).
pub const NLMSG_ERROR: u16 = 2;

/// End of a multipart dump.
pub const NLMSG_DONE: u16 = 3;

/// Get audit status.
pub const AUDIT_GET: u16 = 1000;

/// Set audit status (enable, failure mode, registrant pid, limits).
pub const AUDIT_SET: u16 = 1001;

/// Get info about the sender of a signal to the audit daemon.
pub const AUDIT_SIGNAL_INFO: u16 = 1010;

/// List syscall filtering rules.
pub const AUDIT_LIST_RULES: u16 = 1013;

/// Toggle log splitting (vendor extension).
pub const AUDIT_LOGSPLIT_SET: u16 = 1020;

/// Returns a human-readable name for a message type.
pub fn type_name(msg_type: u16) -> &'static str {
    match msg_type {
        NLMSG_NOOP => "NOOP",
        NLMSG_ERROR => "ERROR",
        NLMSG_DONE => "DONE",
        AUDIT_GET => "GET",
        AUDIT_SET => "SET",
        AUDIT_SIGNAL_INFO => "SIGNAL_INFO",
        AUDIT_LIST_RULES => "LIST_RULES",
        AUDIT_LOGSPLIT_SET => "LOGSPLIT_SET",
        1000..=1099 => "AUDIT_CONTROL",
        1100..=1199 => "USER",
        1300..=1399 => "EVENT",
        _ => "UNKNOWN",
    }
}

/// Returns true for netlink-level control types.
pub fn is_netlink_control(msg_type: u16) -> bool {
    msg_type < 16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_known_and_ranged_types() {
        assert_eq!(type_name(NLMSG_ERROR), "ERROR");
        assert_eq!(type_name(AUDIT_SET), "SET");
        assert_eq!(type_name(1005), "AUDIT_CONTROL");
        assert_eq!(type_name(1300), "EVENT");
        assert_eq!(type_name(9), "UNKNOWN");
        assert!(is_netlink_control(NLMSG_ERROR));
        assert!(!is_netlink_control(AUDIT_GET));
    }
}
