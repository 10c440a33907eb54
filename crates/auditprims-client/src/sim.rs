//! In-memory kernel endpoint.
//!
//! [`SimKernel`] implements [`NetlinkIo`] without a socket: sends are
//! recorded and answered from a script, receives pop from an in-memory
//! queue. It honours `MSG_PEEK`/`MSG_DONTWAIT` semantics, so the full
//! send/ack/receive exchange runs unprivileged and deterministically.

use std::collections::{HashMap, VecDeque};
use std::io::{self, ErrorKind};
use std::os::fd::RawFd;

use auditprims_frame::{encode_message, NlHeader, NLMSG_ERROR};
use auditprims_transport::{NetlinkIo, RecvFlags, SenderAddr, SOCKADDR_NL_LEN};
use bytes::BytesMut;

/// How the simulated kernel acknowledges each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckBehavior {
    /// Queue nothing.
    Silent,
    /// Queue an `NLMSG_ERROR` reply with `code`, echoing the request sequence.
    Ack { code: i32 },
    /// Queue an `NLMSG_ERROR` reply with `code` and a fixed sequence.
    AckWithSequence { code: i32, seq: u32 },
}

/// A scripted outcome for the next send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendFault {
    /// Fail with `EINTR`.
    Interrupted,
    /// Accept only this many bytes.
    Short(usize),
    /// Fail with this OS error.
    Os(i32),
}

#[derive(Debug, Clone)]
struct Queued {
    bytes: Vec<u8>,
    sender: SenderAddr,
}

/// A deterministic stand-in for the kernel audit endpoint.
#[derive(Debug)]
pub struct SimKernel {
    fd: RawFd,
    ack: AckBehavior,
    responses: HashMap<u16, (u16, Vec<u8>)>,
    inbox: VecDeque<Queued>,
    sent: Vec<Vec<u8>>,
    send_faults: VecDeque<SendFault>,
    recv_interrupts: usize,
    recv_calls: usize,
}

impl Default for SimKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl SimKernel {
    /// A kernel that acknowledges every request with code 0.
    pub fn new() -> Self {
        Self::with_fd(3)
    }

    /// Like [`SimKernel::new`] but reporting `fd` as its descriptor.
    pub fn with_fd(fd: RawFd) -> Self {
        Self {
            fd,
            ack: AckBehavior::Ack { code: 0 },
            responses: HashMap::new(),
            inbox: VecDeque::new(),
            sent: Vec::new(),
            send_faults: VecDeque::new(),
            recv_interrupts: 0,
            recv_calls: 0,
        }
    }

    pub fn with_ack(mut self, ack: AckBehavior) -> Self {
        self.ack = ack;
        self
    }

    /// Answer every `request_type` with a `reply_type` datagram queued ahead of the ack.
    pub fn with_response(mut self, request_type: u16, reply_type: u16, payload: Vec<u8>) -> Self {
        self.responses.insert(request_type, (reply_type, payload));
        self
    }

    /// Queue a kernel datagram.
    pub fn push_reply(&mut self, msg_type: u16, seq: u32, payload: &[u8]) {
        self.push_from(msg_type, seq, payload, 0);
    }

    /// Queue a datagram claiming to come from netlink port `pid`.
    pub fn push_from(&mut self, msg_type: u16, seq: u32, payload: &[u8], pid: u32) {
        let bytes = build(msg_type, seq, payload);
        self.push_raw(
            bytes,
            SenderAddr {
                len: SOCKADDR_NL_LEN,
                pid,
            },
        );
    }

    /// Queue arbitrary bytes with an arbitrary sender address.
    pub fn push_raw(&mut self, bytes: Vec<u8>, sender: SenderAddr) {
        self.inbox.push_back(Queued { bytes, sender });
    }

    pub fn push_send_fault(&mut self, fault: SendFault) {
        self.send_faults.push_back(fault);
    }

    /// Fail the next `count` receives with `EINTR`.
    pub fn interrupt_next_recvs(&mut self, count: usize) {
        self.recv_interrupts = count;
    }

    /// Datagrams accepted so far.
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    pub fn sent_headers(&self) -> Vec<NlHeader> {
        self.sent
            .iter()
            .filter_map(|bytes| NlHeader::parse(bytes))
            .collect()
    }

    /// Datagrams still queued for receive.
    pub fn pending(&self) -> usize {
        self.inbox.len()
    }

    /// Receive attempts, including interrupted ones.
    pub fn recv_calls(&self) -> usize {
        self.recv_calls
    }

    fn answer(&mut self, request: &[u8]) {
        let Some(header) = NlHeader::parse(request) else {
            return;
        };

        if let Some((reply_type, payload)) = self.responses.get(&header.msg_type).cloned() {
            self.push_reply(reply_type, header.seq, &payload);
        }

        let (code, seq) = match self.ack {
            AckBehavior::Silent => return,
            AckBehavior::Ack { code } => (code, header.seq),
            AckBehavior::AckWithSequence { code, seq } => (code, seq),
        };
        let mut body = code.to_ne_bytes().to_vec();
        body.extend_from_slice(&request[..request.len().min(auditprims_frame::HEADER_SIZE)]);
        self.push_reply(NLMSG_ERROR, seq, &body);
    }
}

fn build(msg_type: u16, seq: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    match encode_message(msg_type, 0, seq, payload, &mut buf) {
        Ok(()) => buf.to_vec(),
        // Oversized test payloads are queued raw so truncation can be exercised.
        Err(_) => payload.to_vec(),
    }
}

impl NetlinkIo for SimKernel {
    fn raw_fd(&self) -> RawFd {
        self.fd
    }

    fn send_to_kernel(&mut self, datagram: &[u8]) -> io::Result<usize> {
        match self.send_faults.pop_front() {
            Some(SendFault::Interrupted) => return Err(ErrorKind::Interrupted.into()),
            Some(SendFault::Short(n)) => return Ok(n.min(datagram.len())),
            Some(SendFault::Os(code)) => return Err(io::Error::from_raw_os_error(code)),
            None => {}
        }

        self.sent.push(datagram.to_vec());
        self.answer(datagram);
        Ok(datagram.len())
    }

    fn recv_from(&mut self, buf: &mut [u8], flags: RecvFlags) -> io::Result<(usize, SenderAddr)> {
        self.recv_calls += 1;
        if self.recv_interrupts > 0 {
            self.recv_interrupts -= 1;
            return Err(ErrorKind::Interrupted.into());
        }

        let queued = if flags.peek {
            self.inbox.front().cloned()
        } else {
            self.inbox.pop_front()
        };

        let Some(queued) = queued else {
            if flags.dont_wait {
                return Err(ErrorKind::WouldBlock.into());
            }
            return Err(io::Error::new(
                ErrorKind::TimedOut,
                "simulated kernel has nothing queued for a blocking receive",
            ));
        };

        let len = queued.bytes.len().min(buf.len());
        buf[..len].copy_from_slice(&queued.bytes[..len]);
        Ok((len, queued.sender))
    }
}

#[cfg(test)]
mod tests {
    use auditprims_frame::AUDIT_SET;

    use super::*;

    #[test]
    fn acks_echo_request_sequence() {
        let mut kernel = SimKernel::new();
        let mut request = auditprims_frame::encode_request(AUDIT_SET, &[]).unwrap();
        request.set_sequence(5);
        kernel.send_to_kernel(request.as_bytes()).unwrap();

        let mut buf = [0u8; 64];
        let (len, sender) = kernel
            .recv_from(
                &mut buf,
                RecvFlags {
                    dont_wait: true,
                    peek: false,
                },
            )
            .unwrap();
        assert_eq!(sender, SenderAddr::kernel());
        let header = NlHeader::parse(&buf[..len]).unwrap();
        assert_eq!(header.msg_type, NLMSG_ERROR);
        assert_eq!(header.seq, 5);
    }

    #[test]
    fn silent_kernel_queues_nothing() {
        let mut kernel = SimKernel::new().with_ack(AckBehavior::Silent);
        let request = auditprims_frame::encode_request(AUDIT_SET, &[]).unwrap();
        kernel.send_to_kernel(request.as_bytes()).unwrap();
        assert_eq!(kernel.pending(), 0);
        assert_eq!(kernel.sent().len(), 1);
    }
}
