use std::io::ErrorKind;
use std::os::fd::RawFd;

use tracing::{debug, error};

use crate::error::{Result, TransportError};
use crate::traits::{NetlinkIo, RecvFlags, RecvMode, KERNEL_PORT_ID, SOCKADDR_NL_LEN};

/// Reject negative socket handles before any I/O.
pub fn check_descriptor(fd: RawFd) -> Result<()> {
    if fd < 0 {
        return Err(TransportError::InvalidDescriptor(fd));
    }
    Ok(())
}

/// Send a complete datagram to the kernel.
///
/// Retries while the send is interrupted by a signal. Anything short of the
/// full datagram being accepted is a protocol fault.
pub fn send_datagram<I: NetlinkIo + ?Sized>(io: &mut I, datagram: &[u8]) -> Result<()> {
    check_descriptor(io.raw_fd())?;

    let sent = loop {
        match io.send_to_kernel(datagram) {
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            other => break other,
        }
    };

    match sent {
        Ok(written) if written == datagram.len() => Ok(()),
        Ok(written) => Err(TransportError::ShortWrite {
            written,
            expected: datagram.len(),
        }),
        Err(err) => {
            error!(%err, "error sending data over the netlink socket");
            Err(TransportError::SendFailed(err))
        }
    }
}

/// Receive one datagram from the kernel into `buf`.
///
/// Returns `Ok(None)` only for a non-blocking receive with nothing queued.
/// Signal interruptions are retried. The sender must be the kernel; any
/// other port id is rejected before the bytes are handed upward.
pub fn recv_datagram<I: NetlinkIo + ?Sized>(
    io: &mut I,
    buf: &mut [u8],
    mode: RecvMode,
    peek: bool,
) -> Result<Option<usize>> {
    check_descriptor(io.raw_fd())?;

    let flags = RecvFlags::new(mode, peek);
    let (len, sender) = loop {
        match io.recv_from(buf, flags) {
            Ok(received) => break received,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if mode == RecvMode::NonBlocking && err.kind() == ErrorKind::WouldBlock => {
                debug!("no datagram queued on audit socket");
                return Ok(None);
            }
            Err(err) => {
                error!(%err, "error receiving from netlink socket");
                return Err(TransportError::Io(err));
            }
        }
    };

    if sender.len != SOCKADDR_NL_LEN {
        error!(
            len = sender.len,
            expected = SOCKADDR_NL_LEN,
            "protocol fault: unexpected sender address length"
        );
        return Err(TransportError::BadSenderAddress {
            len: sender.len,
            expected: SOCKADDR_NL_LEN,
        });
    }

    if sender.pid != KERNEL_PORT_ID {
        error!(pid = sender.pid, "invalid netlink pid received, expected 0");
        return Err(TransportError::SpoofedSender { pid: sender.pid });
    }

    Ok(Some(len))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;

    use super::*;
    use crate::traits::SenderAddr;

    #[derive(Default)]
    struct ScriptedIo {
        fd: RawFd,
        sends: VecDeque<io::Result<usize>>,
        recvs: VecDeque<io::Result<(Vec<u8>, SenderAddr)>>,
        send_calls: usize,
        recv_calls: usize,
        last_flags: Option<RecvFlags>,
    }

    impl NetlinkIo for ScriptedIo {
        fn raw_fd(&self) -> RawFd {
            self.fd
        }

        fn send_to_kernel(&mut self, datagram: &[u8]) -> io::Result<usize> {
            self.send_calls += 1;
            self.sends.pop_front().unwrap_or(Ok(datagram.len()))
        }

        fn recv_from(
            &mut self,
            buf: &mut [u8],
            flags: RecvFlags,
        ) -> io::Result<(usize, SenderAddr)> {
            self.recv_calls += 1;
            self.last_flags = Some(flags);
            let (bytes, sender) = self
                .recvs
                .pop_front()
                .unwrap_or_else(|| Err(io::Error::from(ErrorKind::WouldBlock)))?;
            buf[..bytes.len()].copy_from_slice(&bytes);
            Ok((bytes.len(), sender))
        }
    }

    fn interrupted<T>() -> io::Result<T> {
        Err(io::Error::from(ErrorKind::Interrupted))
    }

    #[test]
    fn negative_descriptor_is_rejected_without_io() {
        let mut io = ScriptedIo {
            fd: -1,
            ..ScriptedIo::default()
        };
        let result = send_datagram(&mut io, b"abcd");
        assert!(matches!(result, Err(TransportError::InvalidDescriptor(-1))));
        let mut buf = [0u8; 16];
        let result = recv_datagram(&mut io, &mut buf, RecvMode::Blocking, false);
        assert!(matches!(result, Err(TransportError::InvalidDescriptor(-1))));
        assert_eq!(io.send_calls, 0);
        assert_eq!(io.recv_calls, 0);
    }

    #[test]
    fn send_retries_through_interrupts() {
        let mut io = ScriptedIo {
            fd: 3,
            sends: VecDeque::from([interrupted(), interrupted(), Ok(4)]),
            ..ScriptedIo::default()
        };
        send_datagram(&mut io, b"abcd").unwrap();
        assert_eq!(io.send_calls, 3);
    }

    #[test]
    fn short_write_is_protocol_fault() {
        let mut io = ScriptedIo {
            fd: 3,
            sends: VecDeque::from([Ok(2)]),
            ..ScriptedIo::default()
        };
        let err = send_datagram(&mut io, b"abcd").unwrap_err();
        assert!(matches!(
            err,
            TransportError::ShortWrite {
                written: 2,
                expected: 4
            }
        ));
        assert!(err.is_protocol_fault());
        assert_eq!(err.errno(), libc::EPROTO);
    }

    #[test]
    fn send_error_is_protocol_fault_with_source() {
        let mut io = ScriptedIo {
            fd: 3,
            sends: VecDeque::from([Err(io::Error::from_raw_os_error(libc::ENOBUFS))]),
            ..ScriptedIo::default()
        };
        let err = send_datagram(&mut io, b"abcd").unwrap_err();
        assert!(err.is_protocol_fault());
        match err {
            TransportError::SendFailed(source) => {
                assert_eq!(source.raw_os_error(), Some(libc::ENOBUFS))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn recv_retries_through_interrupts() {
        let mut io = ScriptedIo {
            fd: 3,
            recvs: VecDeque::from([
                interrupted(),
                Ok((b"hello".to_vec(), SenderAddr::kernel())),
            ]),
            ..ScriptedIo::default()
        };
        let mut buf = [0u8; 16];
        let len = recv_datagram(&mut io, &mut buf, RecvMode::Blocking, true)
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..len], b"hello");
        assert_eq!(io.recv_calls, 2);
        assert_eq!(
            io.last_flags,
            Some(RecvFlags {
                dont_wait: false,
                peek: true
            })
        );
    }

    #[test]
    fn nonblocking_would_block_is_empty() {
        let mut io = ScriptedIo {
            fd: 3,
            ..ScriptedIo::default()
        };
        let mut buf = [0u8; 16];
        let result = recv_datagram(&mut io, &mut buf, RecvMode::NonBlocking, false).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn blocking_would_block_is_an_error() {
        let mut io = ScriptedIo {
            fd: 3,
            ..ScriptedIo::default()
        };
        let mut buf = [0u8; 16];
        let result = recv_datagram(&mut io, &mut buf, RecvMode::Blocking, false);
        assert!(matches!(result, Err(TransportError::Io(_))));
    }

    #[test]
    fn wrong_address_length_is_protocol_fault() {
        let mut io = ScriptedIo {
            fd: 3,
            recvs: VecDeque::from([Ok((
                b"x".to_vec(),
                SenderAddr {
                    len: 16,
                    pid: KERNEL_PORT_ID,
                },
            ))]),
            ..ScriptedIo::default()
        };
        let mut buf = [0u8; 16];
        let err = recv_datagram(&mut io, &mut buf, RecvMode::Blocking, false).unwrap_err();
        assert!(matches!(
            err,
            TransportError::BadSenderAddress {
                len: 16,
                expected: SOCKADDR_NL_LEN
            }
        ));
        assert!(err.is_protocol_fault());
    }

    #[test]
    fn user_space_sender_is_rejected() {
        let mut io = ScriptedIo {
            fd: 3,
            recvs: VecDeque::from([Ok((
                b"x".to_vec(),
                SenderAddr {
                    len: SOCKADDR_NL_LEN,
                    pid: 4242,
                },
            ))]),
            ..ScriptedIo::default()
        };
        let mut buf = [0u8; 16];
        let err = recv_datagram(&mut io, &mut buf, RecvMode::Blocking, false).unwrap_err();
        assert!(matches!(err, TransportError::SpoofedSender { pid: 4242 }));
        assert_eq!(err.errno(), libc::EINVAL);
    }
}
