use tracing::error;

use crate::codec::{NlHeader, HEADER_SIZE};
use crate::error::{FrameError, Result};
use crate::msg_type::{AUDIT_GET, AUDIT_LIST_RULES, AUDIT_SIGNAL_INFO, NLMSG_ERROR};
use crate::payload::{ErrorView, SignalInfoView, StatusView, AUDIT_STATUS_SIZE};

/// A reply body, classified by the header's type and borrowed from the
/// receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyBody<'a> {
    /// `NLMSG_ERROR`: an error code, 0 for a plain acknowledgement.
    Error(ErrorView<'a>),
    /// `AUDIT_GET`: the kernel's audit status.
    Status(StatusView<'a>),
    /// `AUDIT_LIST_RULES`: an opaque `audit_rule_data` record.
    RuleData(&'a [u8]),
    /// `AUDIT_SIGNAL_INFO`: who last signalled the audit daemon.
    SignalInfo(SignalInfoView<'a>),
    /// Any other type.
    Generic(&'a [u8]),
}

/// A decoded reply datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply<'a> {
    header: NlHeader,
    body: ReplyBody<'a>,
}

impl<'a> Reply<'a> {
    pub fn header(&self) -> &NlHeader {
        &self.header
    }

    pub fn msg_type(&self) -> u16 {
        self.header.msg_type
    }

    /// Declared header plus body length.
    pub fn len(&self) -> usize {
        self.header.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= HEADER_SIZE
    }

    /// The reply's sequence truncated to the 16 bits user space assigns.
    pub fn sequence(&self) -> i16 {
        self.header.sequence()
    }

    pub fn body(&self) -> ReplyBody<'a> {
        self.body
    }

    pub fn is_error(&self) -> bool {
        matches!(self.body, ReplyBody::Error(_))
    }

    /// The embedded code if this is an error/ack reply.
    pub fn error_code(&self) -> Option<i32> {
        match self.body {
            ReplyBody::Error(view) => Some(view.code()),
            _ => None,
        }
    }

    /// Raw body bytes regardless of classification.
    pub fn body_bytes(&self) -> &'a [u8] {
        match self.body {
            ReplyBody::Error(view) => view.as_bytes(),
            ReplyBody::Status(view) => view.as_bytes(),
            ReplyBody::SignalInfo(view) => view.as_bytes(),
            ReplyBody::RuleData(bytes) | ReplyBody::Generic(bytes) => bytes,
        }
    }
}

/// Decode the first `received` bytes of `buf` as a reply.
///
/// `buf.len()` is the receive capacity: a header that does not fit what
/// was received is [`FrameError::TooLarge`] when the receive filled the
/// whole buffer (the datagram was truncated), otherwise
/// [`FrameError::BadMessage`]. The body is never copied.
pub fn decode_reply(buf: &[u8], received: usize) -> Result<Reply<'_>> {
    let capacity = buf.len();
    let received = received.min(capacity);

    let header = match NlHeader::parse(&buf[..received]) {
        Some(header) if header.fits(received) => header,
        parsed => {
            let err = if received == capacity {
                FrameError::TooLarge {
                    size: parsed.map_or(received, |h| h.len as usize),
                    max: capacity,
                }
            } else {
                FrameError::BadMessage {
                    declared: parsed.map_or(0, |h| h.len),
                    received,
                }
            };
            error!(%err, "bad kernel response");
            return Err(err);
        }
    };

    let body = &buf[HEADER_SIZE..header.len as usize];
    let body = match header.msg_type {
        NLMSG_ERROR => ReplyBody::Error(ErrorView::new(require(
            header.msg_type,
            body,
            ErrorView::MIN_SIZE,
        )?)),
        AUDIT_GET => ReplyBody::Status(StatusView::new(require(
            header.msg_type,
            body,
            AUDIT_STATUS_SIZE,
        )?)),
        AUDIT_LIST_RULES => ReplyBody::RuleData(body),
        AUDIT_SIGNAL_INFO => ReplyBody::SignalInfo(SignalInfoView::new(require(
            header.msg_type,
            body,
            SignalInfoView::MIN_SIZE,
        )?)),
        _ => ReplyBody::Generic(body),
    };

    Ok(Reply { header, body })
}

fn require(msg_type: u16, body: &[u8], min: usize) -> Result<&[u8]> {
    if body.len() < min {
        let err = FrameError::ShortBody {
            msg_type,
            len: body.len(),
            min,
        };
        error!(%err, "bad kernel response");
        return Err(err);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;
    use crate::codec::{encode_message, RECV_BUFFER_SIZE};
    use crate::payload::AuditStatus;

    fn datagram(msg_type: u16, seq: u32, payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_message(msg_type, 0, seq, payload, &mut buf).unwrap();
        buf.to_vec()
    }

    fn receive_into(wire: &[u8]) -> (Vec<u8>, usize) {
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        buf[..wire.len()].copy_from_slice(wire);
        (buf, wire.len())
    }

    #[test]
    fn classifies_error_reply() {
        let (buf, len) = receive_into(&datagram(NLMSG_ERROR, 3, &(-1i32).to_ne_bytes()));
        let reply = decode_reply(&buf, len).unwrap();
        assert!(reply.is_error());
        assert_eq!(reply.error_code(), Some(-1));
        assert_eq!(reply.sequence(), 3);
    }

    #[test]
    fn classifies_status_reply_without_copy() {
        let status = AuditStatus {
            enabled: 1,
            pid: 321,
            ..AuditStatus::default()
        };
        let (buf, len) = receive_into(&datagram(AUDIT_GET, 1, &status.to_bytes()));
        let reply = decode_reply(&buf, len).unwrap();
        let ReplyBody::Status(view) = reply.body() else {
            panic!("expected status body");
        };
        assert_eq!(view.pid(), 321);
        assert_eq!(view.to_status(), status);
        assert!(std::ptr::eq(
            view.as_bytes().as_ptr(),
            buf[HEADER_SIZE..].as_ptr()
        ));
    }

    #[test]
    fn classifies_rule_data_and_signal_info() {
        let (buf, len) = receive_into(&datagram(AUDIT_LIST_RULES, 1, b"rule"));
        let reply = decode_reply(&buf, len).unwrap();
        assert_eq!(reply.body(), ReplyBody::RuleData(b"rule"));

        let mut sig = 0u32.to_ne_bytes().to_vec();
        sig.extend_from_slice(&1i32.to_ne_bytes());
        let (buf, len) = receive_into(&datagram(AUDIT_SIGNAL_INFO, 1, &sig));
        let reply = decode_reply(&buf, len).unwrap();
        let ReplyBody::SignalInfo(view) = reply.body() else {
            panic!("expected signal info body");
        };
        assert_eq!(view.pid(), 1);
    }

    #[test]
    fn unknown_type_is_generic() {
        let (buf, len) = receive_into(&datagram(1300, 0, b"type=SYSCALL"));
        let reply = decode_reply(&buf, len).unwrap();
        let ReplyBody::Generic(bytes) = reply.body() else {
            panic!("expected generic body");
        };
        assert_eq!(bytes, b"type=SYSCALL");
    }

    #[test]
    fn header_longer_than_received_is_bad_message() {
        let mut wire = datagram(1300, 0, b"abcd");
        wire[0..4].copy_from_slice(&64u32.to_ne_bytes());
        let (buf, len) = receive_into(&wire);
        let result = decode_reply(&buf, len);
        assert!(matches!(
            result,
            Err(FrameError::BadMessage {
                declared: 64,
                received: 20
            })
        ));
    }

    #[test]
    fn runt_datagram_is_bad_message() {
        let (buf, _) = receive_into(&[1, 2, 3]);
        assert!(matches!(
            decode_reply(&buf, 3),
            Err(FrameError::BadMessage { .. })
        ));
        assert!(matches!(
            decode_reply(&buf, 0),
            Err(FrameError::BadMessage { .. })
        ));
    }

    #[test]
    fn truncated_full_buffer_is_too_large() {
        let mut buf = vec![0u8; 64];
        let wire = datagram(1300, 0, &[0u8; 48]);
        buf.copy_from_slice(&wire);
        buf[0..4].copy_from_slice(&128u32.to_ne_bytes());
        let result = decode_reply(&buf, 64);
        assert!(matches!(
            result,
            Err(FrameError::TooLarge { size: 128, max: 64 })
        ));
    }

    #[test]
    fn short_status_body_is_rejected() {
        let (buf, len) = receive_into(&datagram(AUDIT_GET, 0, &[0u8; 8]));
        assert!(matches!(
            decode_reply(&buf, len),
            Err(FrameError::ShortBody {
                msg_type: AUDIT_GET,
                len: 8,
                min: AUDIT_STATUS_SIZE
            })
        ));
    }
}
