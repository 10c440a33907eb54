//! Typed audit payloads.
//!
//! Owned types are used to build request bodies. `*View` types borrow a
//! received body in place.

use crate::codec::{read_u32, NlHeader};

/// `mask` bit: `enabled` is valid.
pub const AUDIT_STATUS_ENABLED: u32 = 0x0001;
/// `mask` bit: `failure` is valid.
pub const AUDIT_STATUS_FAILURE: u32 = 0x0002;
/// `mask` bit: `pid` is valid.
pub const AUDIT_STATUS_PID: u32 = 0x0004;
/// `mask` bit: `rate_limit` is valid.
pub const AUDIT_STATUS_RATE_LIMIT: u32 = 0x0008;
/// `mask` bit: `backlog_limit` is valid.
pub const AUDIT_STATUS_BACKLOG_LIMIT: u32 = 0x0010;

/// Size of the classic `struct audit_status`. Newer kernels append fields.
pub const AUDIT_STATUS_SIZE: usize = 32;

/// Kernel audit status record (`struct audit_status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuditStatus {
    /// Which fields below are meaningful in a SET request.
    pub mask: u32,
    pub enabled: u32,
    pub failure: u32,
    /// Registered audit daemon pid.
    pub pid: u32,
    pub rate_limit: u32,
    pub backlog_limit: u32,
    pub lost: u32,
    pub backlog: u32,
}

impl AuditStatus {
    /// A SET body that registers `pid` as the audit event consumer.
    pub fn for_pid(pid: u32) -> Self {
        Self {
            mask: AUDIT_STATUS_PID,
            pid,
            ..Self::default()
        }
    }

    pub fn to_bytes(&self) -> [u8; AUDIT_STATUS_SIZE] {
        let fields = [
            self.mask,
            self.enabled,
            self.failure,
            self.pid,
            self.rate_limit,
            self.backlog_limit,
            self.lost,
            self.backlog,
        ];
        let mut out = [0u8; AUDIT_STATUS_SIZE];
        for (chunk, field) in out.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&field.to_ne_bytes());
        }
        out
    }
}

/// Borrowed status reply body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusView<'a> {
    bytes: &'a [u8],
}

impl<'a> StatusView<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn mask(&self) -> u32 {
        read_u32(self.bytes, 0)
    }

    pub fn enabled(&self) -> u32 {
        read_u32(self.bytes, 4)
    }

    pub fn failure(&self) -> u32 {
        read_u32(self.bytes, 8)
    }

    pub fn pid(&self) -> u32 {
        read_u32(self.bytes, 12)
    }

    pub fn rate_limit(&self) -> u32 {
        read_u32(self.bytes, 16)
    }

    pub fn backlog_limit(&self) -> u32 {
        read_u32(self.bytes, 20)
    }

    pub fn lost(&self) -> u32 {
        read_u32(self.bytes, 24)
    }

    pub fn backlog(&self) -> u32 {
        read_u32(self.bytes, 28)
    }

    /// Fields past the classic record, untouched.
    pub fn extension(&self) -> &'a [u8] {
        &self.bytes[AUDIT_STATUS_SIZE..]
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn to_status(&self) -> AuditStatus {
        AuditStatus {
            mask: self.mask(),
            enabled: self.enabled(),
            failure: self.failure(),
            pid: self.pid(),
            rate_limit: self.rate_limit(),
            backlog_limit: self.backlog_limit(),
            lost: self.lost(),
            backlog: self.backlog(),
        }
    }
}

/// Borrowed `struct nlmsgerr` body: an error code and the echoed request header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorView<'a> {
    bytes: &'a [u8],
}

impl<'a> ErrorView<'a> {
    /// Minimum body size: the error code.
    pub const MIN_SIZE: usize = 4;

    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// The embedded code as sent by the kernel (a negated errno, or 0).
    pub fn code(&self) -> i32 {
        read_u32(self.bytes, 0) as i32
    }

    /// A zero code is a plain acknowledgement.
    pub fn is_ack(&self) -> bool {
        self.code() == 0
    }

    /// Positive errno carried by this reply.
    pub fn errno(&self) -> i32 {
        self.code().wrapping_abs()
    }

    /// Header of the request this reply answers, if echoed.
    pub fn request_header(&self) -> Option<NlHeader> {
        NlHeader::parse(self.bytes.get(Self::MIN_SIZE..)?)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

/// Borrowed `struct audit_sig_info` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalInfoView<'a> {
    bytes: &'a [u8],
}

impl<'a> SignalInfoView<'a> {
    /// Minimum body size: uid and pid.
    pub const MIN_SIZE: usize = 8;

    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Login uid of the signalling process.
    pub fn uid(&self) -> u32 {
        read_u32(self.bytes, 0)
    }

    pub fn pid(&self) -> i32 {
        read_u32(self.bytes, 4) as i32
    }

    /// Security context of the sender, without trailing NULs.
    pub fn context(&self) -> &'a [u8] {
        let ctx = &self.bytes[Self::MIN_SIZE..];
        let end = ctx.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        &ctx[..end]
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

/// Log-split control value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum LogSplit {
    Off = 0,
    On = 1,
}

impl TryFrom<i32> for LogSplit {
    type Error = i32;

    /// Accepts exactly the two sentinels; returns the rejected value otherwise.
    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::On),
            other => Err(other),
        }
    }
}

/// Body of an `AUDIT_LOGSPLIT_SET` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSplitStatus {
    pub enabled: LogSplit,
}

impl LogSplitStatus {
    pub fn to_bytes(&self) -> [u8; 4] {
        (self.enabled as u32).to_ne_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_for_pid_sets_mask_and_pid() {
        let status = AuditStatus::for_pid(4242);
        assert_eq!(status.mask, AUDIT_STATUS_PID);
        assert_eq!(status.pid, 4242);

        let bytes = status.to_bytes();
        let view = StatusView::new(&bytes);
        assert_eq!(view.mask(), AUDIT_STATUS_PID);
        assert_eq!(view.pid(), 4242);
        assert_eq!(view.enabled(), 0);
        assert!(view.extension().is_empty());
        assert_eq!(view.to_status(), status);
    }

    #[test]
    fn status_view_keeps_extension_fields() {
        let mut bytes = AuditStatus {
            enabled: 1,
            backlog_limit: 8192,
            ..AuditStatus::default()
        }
        .to_bytes()
        .to_vec();
        bytes.extend_from_slice(&[9, 9, 9, 9]);

        let view = StatusView::new(&bytes);
        assert_eq!(view.enabled(), 1);
        assert_eq!(view.backlog_limit(), 8192);
        assert_eq!(view.extension(), &[9, 9, 9, 9]);
    }

    #[test]
    fn error_view_reads_code_and_echo() {
        let mut bytes = (-13i32).to_ne_bytes().to_vec();
        let mut echoed = bytes::BytesMut::new();
        NlHeader {
            len: 48,
            msg_type: 1001,
            flags: 5,
            seq: 9,
            pid: 0,
        }
        .put(&mut echoed);
        bytes.extend_from_slice(&echoed);

        let view = ErrorView::new(&bytes);
        assert_eq!(view.code(), -13);
        assert_eq!(view.errno(), 13);
        assert!(!view.is_ack());
        let header = view.request_header().unwrap();
        assert_eq!(header.msg_type, 1001);
        assert_eq!(header.seq, 9);
    }

    #[test]
    fn error_view_without_echo() {
        let bytes = 0i32.to_ne_bytes();
        let view = ErrorView::new(&bytes);
        assert!(view.is_ack());
        assert!(view.request_header().is_none());
    }

    #[test]
    fn signal_info_context_trims_nuls() {
        let mut bytes = 1000u32.to_ne_bytes().to_vec();
        bytes.extend_from_slice(&77i32.to_ne_bytes());
        bytes.extend_from_slice(b"u:r:init:s0\0\0\0");

        let view = SignalInfoView::new(&bytes);
        assert_eq!(view.uid(), 1000);
        assert_eq!(view.pid(), 77);
        assert_eq!(view.context(), b"u:r:init:s0");
    }

    #[test]
    fn log_split_accepts_only_sentinels() {
        assert_eq!(LogSplit::try_from(0), Ok(LogSplit::Off));
        assert_eq!(LogSplit::try_from(1), Ok(LogSplit::On));
        assert_eq!(LogSplit::try_from(2), Err(2));
        assert_eq!(LogSplit::try_from(-1), Err(-1));
        assert_eq!(
            LogSplitStatus {
                enabled: LogSplit::On
            }
            .to_bytes(),
            1u32.to_ne_bytes()
        );
    }
}
