use auditprims_frame::{decode_reply, encode_request, type_name, Reply, RECV_BUFFER_SIZE};
use auditprims_transport::{check_descriptor, recv_datagram, send_datagram, NetlinkIo, RecvMode};
#[cfg(target_os = "linux")]
use auditprims_transport::{AuditSocket, BorrowedAuditSocket};
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::sequence::SequenceTracker;

/// What to do when an acknowledgement carries a different sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkewPolicy {
    /// Log a warning and accept the acknowledgement.
    #[default]
    Warn,
    /// Fail the send with [`ClientError::SequenceSkew`].
    Reject,
}

/// Session-level configuration.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub skew_policy: SkewPolicy,
}

/// A request/acknowledge session on one audit socket.
///
/// Owns the sequence counter and the receive buffer. Replies returned by
/// [`AuditSession::receive`] borrow that buffer, so they must be dropped
/// before the next exchange.
pub struct AuditSession<S> {
    io: S,
    sequence: SequenceTracker,
    config: SessionConfig,
    buf: Box<[u8]>,
}

/// Open a new audit socket and start a session on it.
#[cfg(target_os = "linux")]
pub fn open() -> Result<AuditSession<AuditSocket>> {
    Ok(AuditSession::new(AuditSocket::open()?))
}

/// Start a session on a caller-owned descriptor.
#[cfg(target_os = "linux")]
pub fn attach(fd: std::os::fd::RawFd) -> AuditSession<BorrowedAuditSocket> {
    AuditSession::new(BorrowedAuditSocket::new(fd))
}

impl<S: NetlinkIo> AuditSession<S> {
    pub fn new(io: S) -> Self {
        Self::from_parts(io, SequenceTracker::new(), SessionConfig::default())
    }

    pub fn with_config(io: S, config: SessionConfig) -> Self {
        Self::from_parts(io, SequenceTracker::new(), config)
    }

    /// Build a session that continues an existing sequence.
    pub fn from_parts(io: S, sequence: SequenceTracker, config: SessionConfig) -> Self {
        Self {
            io,
            sequence,
            config,
            buf: vec![0u8; RECV_BUFFER_SIZE].into_boxed_slice(),
        }
    }

    /// Send a request and wait for the kernel to acknowledge it.
    ///
    /// Returns the sequence number assigned to the request. The counter is
    /// only advanced once the request has been encoded and the descriptor
    /// checked, so a rejected request leaves it untouched.
    pub fn send(&mut self, msg_type: u16, payload: &[u8]) -> Result<i16> {
        check_descriptor(self.io.raw_fd())?;
        let mut request = encode_request(msg_type, payload)?;

        let seq = self.sequence.advance();
        request.set_sequence(seq);

        debug!(
            msg_type,
            type_name = type_name(msg_type),
            seq,
            len = request.len(),
            "sending audit request"
        );
        send_datagram(&mut self.io, request.as_bytes())?;

        self.wait_for_ack(seq)?;
        Ok(seq)
    }

    /// Receive and classify one reply.
    ///
    /// Returns `Ok(None)` only in [`RecvMode::NonBlocking`] when nothing is
    /// queued. With `peek`, the datagram stays queued for the next receive.
    pub fn receive(&mut self, mode: RecvMode, peek: bool) -> Result<Option<Reply<'_>>> {
        let Some(len) = recv_datagram(&mut self.io, &mut self.buf, mode, peek)? else {
            return Ok(None);
        };

        let reply = decode_reply(&self.buf, len)?;
        debug!(
            msg_type = reply.msg_type(),
            type_name = type_name(reply.msg_type()),
            seq = reply.sequence(),
            len = reply.len(),
            peek,
            "received audit reply"
        );
        Ok(Some(reply))
    }

    /// Confirm the kernel accepted request `expected`.
    ///
    /// Peeks the next reply. An error/ack reply is consumed and its code
    /// checked; any other reply is left queued for the caller. A sequence
    /// mismatch is handled per [`SkewPolicy`].
    pub fn wait_for_ack(&mut self, expected: i16) -> Result<()> {
        let (error_code, got) = match self.receive(RecvMode::Blocking, true)? {
            Some(reply) => (reply.error_code(), reply.sequence()),
            // Blocking receives never report an empty queue.
            None => return Ok(()),
        };

        if let Some(code) = error_code {
            self.receive(RecvMode::Blocking, false)?;
            if code != 0 {
                debug!(seq = expected, code, "kernel rejected audit request");
                return Err(ClientError::KernelRejected { code });
            }
        }

        if got != expected {
            match self.config.skew_policy {
                SkewPolicy::Warn => warn!(
                    expected,
                    got,
                    "sequence number between user space and kernel space is out of skew"
                ),
                SkewPolicy::Reject => return Err(ClientError::SequenceSkew { expected, got }),
            }
        }

        Ok(())
    }

    /// Discard one queued reply without blocking. Failures are ignored.
    pub(crate) fn drain_one(&mut self) {
        match self.receive(RecvMode::NonBlocking, false) {
            Ok(Some(reply)) => debug!(
                msg_type = reply.msg_type(),
                seq = reply.sequence(),
                "discarded kernel confirmation"
            ),
            Ok(None) => debug!("no kernel confirmation queued"),
            Err(err) => debug!(%err, "ignoring kernel confirmation drain failure"),
        }
    }

    /// The session's sequence counter.
    pub fn sequence(&self) -> SequenceTracker {
        self.sequence
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn get_ref(&self) -> &S {
        &self.io
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.io
    }

    pub fn into_inner(self) -> S {
        self.io
    }

    /// Split into the endpoint and the sequence counter to resume later.
    pub fn into_parts(self) -> (S, SequenceTracker) {
        (self.io, self.sequence)
    }
}

#[cfg(target_os = "linux")]
impl AuditSession<AuditSocket> {
    /// Close the owned socket.
    pub fn close(self) -> Result<()> {
        self.io.close().map_err(Into::into)
    }
}

impl<S> std::fmt::Debug for AuditSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditSession")
            .field("sequence", &self.sequence.current())
            .field("config", &self.config)
            .finish()
    }
}
