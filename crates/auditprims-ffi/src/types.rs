/// `wmode` for set operations: return once acknowledged.
pub const AUDITPRIMS_WAIT_NO: i32 = 0;
/// `wmode` for set operations: also drain the kernel's confirmation.
pub const AUDITPRIMS_WAIT_YES: i32 = 1;

/// `block` for `auditprims_get_reply`: wait for a datagram.
pub const AUDITPRIMS_GET_REPLY_BLOCKING: i32 = 0;
/// `block` for `auditprims_get_reply`: return 0 if nothing is queued.
pub const AUDITPRIMS_GET_REPLY_NONBLOCKING: i32 = 1;

pub const AUDITPRIMS_LOGSPLIT_OFF: i32 = 0;
pub const AUDITPRIMS_LOGSPLIT_ON: i32 = 1;

/// A reply copied out for C callers.
///
/// `data` holds the body bytes and is owned by this library; release it
/// with `auditprims_reply_free`. `error` is the embedded code of an
/// `NLMSG_ERROR` reply and 0 otherwise.
#[repr(C)]
#[derive(Debug)]
pub struct AuditprimsReply {
    pub msg_type: u16,
    pub len: u32,
    pub seq: u32,
    pub error: i32,
    pub data: *mut u8,
    pub data_len: usize,
}

impl Default for AuditprimsReply {
    fn default() -> Self {
        Self {
            msg_type: 0,
            len: 0,
            seq: 0,
            error: 0,
            data: std::ptr::null_mut(),
            data_len: 0,
        }
    }
}
