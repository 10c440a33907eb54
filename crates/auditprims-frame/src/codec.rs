use bytes::{BufMut, BytesMut};
use tracing::error;

use crate::error::{FrameError, Result};

/// Netlink header: len (4) + type (2) + flags (2) + seq (4) + pid (4) = 16 bytes.
pub const HEADER_SIZE: usize = 16;

/// Netlink alignment unit (`NLMSG_ALIGNTO`).
pub const ALIGNTO: usize = 4;

/// Largest total message the audit protocol carries.
pub const MAX_AUDIT_MESSAGE_LENGTH: usize = 8970;

/// Receive buffer capacity: a header plus the largest body.
pub const RECV_BUFFER_SIZE: usize = HEADER_SIZE + MAX_AUDIT_MESSAGE_LENGTH;

/// Message is a request.
pub const NLM_F_REQUEST: u16 = 0x1;

/// Request an acknowledgement.
pub const NLM_F_ACK: u16 = 0x4;

/// Flags carried by every request.
pub const REQUEST_FLAGS: u16 = NLM_F_REQUEST | NLM_F_ACK;

/// Round `len` up to the netlink alignment (`NLMSG_ALIGN`).
pub const fn align(len: usize) -> usize {
    (len + ALIGNTO - 1) & !(ALIGNTO - 1)
}

/// Total wire size of a message with a `payload_len`-byte body (`NLMSG_SPACE`).
pub const fn message_space(payload_len: usize) -> usize {
    align(HEADER_SIZE + payload_len)
}

/// A netlink message header in host byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NlHeader {
    /// Header plus body length in bytes.
    pub len: u32,
    pub msg_type: u16,
    pub flags: u16,
    /// Correlation id. Requests carry a sign-extended `i16`.
    pub seq: u32,
    /// Sender port id.
    pub pid: u32,
}

impl NlHeader {
    /// Read a header from the first [`HEADER_SIZE`] bytes of `src`.
    ///
    /// Returns `None` if `src` is too short to hold one.
    pub fn parse(src: &[u8]) -> Option<Self> {
        if src.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            len: read_u32(src, 0),
            msg_type: u16::from_ne_bytes([src[4], src[5]]),
            flags: u16::from_ne_bytes([src[6], src[7]]),
            seq: read_u32(src, 8),
            pid: read_u32(src, 12),
        })
    }

    /// Append this header to `dst`.
    pub fn put(&self, dst: &mut BytesMut) {
        dst.put_u32_ne(self.len);
        dst.put_u16_ne(self.msg_type);
        dst.put_u16_ne(self.flags);
        dst.put_u32_ne(self.seq);
        dst.put_u32_ne(self.pid);
    }

    /// The sequence number as the 16-bit value user space assigned.
    pub fn sequence(&self) -> i16 {
        self.seq as i16
    }

    /// Whether this header fits within `received` bytes (`NLMSG_OK`).
    pub fn fits(&self, received: usize) -> bool {
        received >= HEADER_SIZE
            && self.len as usize >= HEADER_SIZE
            && self.len as usize <= received
    }
}

pub(crate) fn read_u32(src: &[u8], offset: usize) -> u32 {
    u32::from_ne_bytes([
        src[offset],
        src[offset + 1],
        src[offset + 2],
        src[offset + 3],
    ])
}

/// Encode a message into the wire format.
///
/// Wire format (host byte order):
/// ```text
/// ┌───────────┬──────────┬──────────┬───────────┬───────────┬──────────────────┐
/// │ Len (4B)  │ Type(2B) │ Flags(2B)│ Seq (4B)  │ Pid (4B)  │ Body, zero-padded│
/// │ hdr+body  │          │          │           │           │ to 4-byte align  │
/// └───────────┴──────────┴──────────┴───────────┴───────────┴──────────────────┘
/// ```
///
/// Fails with [`FrameError::TooLarge`] before writing anything if the
/// aligned size exceeds [`MAX_AUDIT_MESSAGE_LENGTH`].
pub fn encode_message(
    msg_type: u16,
    flags: u16,
    seq: u32,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let space = message_space(payload.len());
    if space > MAX_AUDIT_MESSAGE_LENGTH {
        error!(
            size = space,
            max = MAX_AUDIT_MESSAGE_LENGTH,
            "netlink message is too large"
        );
        return Err(FrameError::TooLarge {
            size: space,
            max: MAX_AUDIT_MESSAGE_LENGTH,
        });
    }

    dst.reserve(space);
    NlHeader {
        len: space as u32,
        msg_type,
        flags,
        seq,
        pid: 0,
    }
    .put(dst);
    dst.put_slice(payload);
    dst.put_bytes(0, space - HEADER_SIZE - payload.len());
    Ok(())
}

/// Encode a request with [`REQUEST_FLAGS`] and no sequence number yet.
///
/// The sequence is stamped with [`RequestMessage::set_sequence`] once the
/// request is certain to be transmitted.
pub fn encode_request(msg_type: u16, payload: &[u8]) -> Result<RequestMessage> {
    let mut buf = BytesMut::new();
    encode_message(msg_type, REQUEST_FLAGS, 0, payload, &mut buf)?;
    Ok(RequestMessage { buf })
}

/// An encoded request ready for transmission.
#[derive(Debug, Clone)]
pub struct RequestMessage {
    buf: BytesMut,
}

impl RequestMessage {
    /// Stamp the correlation id into the header.
    pub fn set_sequence(&mut self, seq: i16) {
        let raw = (seq as i32 as u32).to_ne_bytes();
        self.buf[8..12].copy_from_slice(&raw);
    }

    pub fn header(&self) -> NlHeader {
        // The buffer always starts with a header written by `encode_message`.
        NlHeader::parse(&self.buf).unwrap_or_default()
    }

    /// The full datagram: header, body, padding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Body bytes including alignment padding.
    pub fn payload(&self) -> &[u8] {
        &self.buf[HEADER_SIZE..]
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
