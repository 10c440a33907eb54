use std::os::fd::{FromRawFd, IntoRawFd, OwnedFd};
use std::os::raw::c_int;
use std::sync::{Mutex, PoisonError};

use auditprims_client::{AuditSession, RecvMode, SequenceTracker, SessionConfig, WaitMode};
use auditprims_transport::{AuditSocket, BorrowedAuditSocket, TransportError};

use crate::args;
use crate::error;
use crate::types::{AuditprimsReply, AUDITPRIMS_GET_REPLY_NONBLOCKING, AUDITPRIMS_WAIT_NO};

/// Sequence counter shared by every descriptor in the process.
static SEQUENCE: Mutex<SequenceTracker> = Mutex::new(SequenceTracker::new());

/// Run `f` on a session over `fd`, holding the sequence lock for the whole
/// exchange so concurrent callers cannot interleave send and ack.
fn with_session<T>(fd: c_int, f: impl FnOnce(&mut AuditSession<BorrowedAuditSocket>) -> T) -> T {
    let mut tracker = SEQUENCE.lock().unwrap_or_else(PoisonError::into_inner);
    let mut session = AuditSession::from_parts(
        BorrowedAuditSocket::new(fd),
        *tracker,
        SessionConfig::default(),
    );
    let result = f(&mut session);
    *tracker = session.sequence();
    result
}

/// Run `f` on a session over `fd` without touching the shared counter.
///
/// Plain receives never assign a sequence, and a blocking one may wait
/// indefinitely, so they must not hold the sequence lock.
fn with_receive_session<T>(
    fd: c_int,
    f: impl FnOnce(&mut AuditSession<BorrowedAuditSocket>) -> T,
) -> T {
    let mut session = AuditSession::new(BorrowedAuditSocket::new(fd));
    f(&mut session)
}

fn wait_mode(wmode: c_int) -> WaitMode {
    if wmode == AUDITPRIMS_WAIT_NO {
        WaitMode::NoWait
    } else {
        WaitMode::Wait
    }
}

fn write_reply_out(out: &mut AuditprimsReply, reply: Option<auditprims_client::Reply<'_>>) {
    crate::reply::release(out);

    let Some(reply) = reply else {
        return;
    };

    let body: Box<[u8]> = reply.body_bytes().to_vec().into_boxed_slice();
    let data_len = body.len();
    let data = if data_len == 0 {
        std::ptr::null_mut()
    } else {
        Box::into_raw(body) as *mut u8
    };

    *out = AuditprimsReply {
        msg_type: reply.msg_type(),
        len: reply.header().len,
        seq: reply.header().seq,
        error: reply.error_code().unwrap_or(0),
        data,
        data_len,
    };
}

/// Open a netlink audit socket.
///
/// Returns the descriptor, or a negative errno.
#[no_mangle]
pub extern "C" fn auditprims_open() -> c_int {
    crate::ffi_boundary(-libc::EIO, || {
        error::clear_error_state();
        match AuditSocket::open() {
            Ok(sock) => OwnedFd::from(sock).into_raw_fd(),
            Err(err) => {
                error::set_error_message(err.to_string());
                -err.errno()
            }
        }
    })
}

/// Close a descriptor returned by `auditprims_open`. Failures are recorded
/// in the last-error string.
#[no_mangle]
pub extern "C" fn auditprims_close(fd: c_int) {
    crate::ffi_boundary((), || {
        error::clear_error_state();
        if fd < 0 {
            error::set_error_message(TransportError::InvalidDescriptor(fd).to_string());
            return;
        }

        // SAFETY: The caller hands over ownership of `fd`, which came from auditprims_open.
        let sock = AuditSocket::from(unsafe { OwnedFd::from_raw_fd(fd) });
        if let Err(err) = sock.close() {
            error::set_error_message(err.to_string());
        }
    })
}

/// Send a request and wait for the kernel's acknowledgement.
///
/// Returns the sequence number used, or a negative errno. The sequence is
/// positive except right after the counter rolls over, when 0 is a valid
/// success value.
///
/// # Safety
/// If `size > 0`, `data` must be non-null and readable for `size` bytes.
#[no_mangle]
pub unsafe extern "C" fn auditprims_send(
    fd: c_int,
    msg_type: c_int,
    data: *const u8,
    size: usize,
) -> c_int {
    crate::ffi_boundary(-libc::EIO, || {
        error::clear_error_state();

        let Some(msg_type) = args::msg_type_arg(msg_type) else {
            return -libc::EINVAL;
        };
        let payload = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe { args::bytes_arg(data, size, "data") } {
                Some(v) => v,
                None => return -libc::EINVAL,
            }
        };

        with_session(fd, |session| match session.send(msg_type, payload) {
            Ok(seq) => c_int::from(seq),
            Err(err) => error::map_client_error(&err),
        })
    })
}

/// Register `pid` as the audit event consumer.
///
/// Returns 0 on success, or a negative errno.
#[no_mangle]
pub extern "C" fn auditprims_set_pid(fd: c_int, pid: u32, wmode: c_int) -> c_int {
    crate::ffi_boundary(-libc::EIO, || {
        error::clear_error_state();
        with_session(fd, |session| {
            match session.set_registrant_pid(pid, wait_mode(wmode)) {
                Ok(()) => 0,
                Err(err) => error::map_client_error(&err),
            }
        })
    })
}

/// Turn log splitting on (1) or off (0).
///
/// Returns 0 on success, `-EINVAL` for any other `enabled`, or a negative errno.
#[no_mangle]
pub extern "C" fn auditprims_set_logsplit(fd: c_int, enabled: c_int, wmode: c_int) -> c_int {
    crate::ffi_boundary(-libc::EIO, || {
        error::clear_error_state();
        with_session(fd, |session| {
            match session.set_log_split(enabled, wait_mode(wmode)) {
                Ok(()) => 0,
                Err(err) => error::map_client_error(&err),
            }
        })
    })
}

/// Receive one reply into `reply`.
///
/// Returns 0 on success, or a negative errno. A non-blocking receive with
/// nothing queued also returns 0 and leaves `reply->msg_type` at 0. A
/// non-zero `peek` leaves the datagram queued.
///
/// # Safety
/// `reply` must be a valid pointer to an `AuditprimsReply`. If its `data`
/// is non-null it must have been populated by this library.
#[no_mangle]
pub unsafe extern "C" fn auditprims_get_reply(
    fd: c_int,
    reply: *mut AuditprimsReply,
    block: c_int,
    peek: c_int,
) -> c_int {
    crate::ffi_boundary(-libc::EIO, || {
        error::clear_error_state();
        if reply.is_null() {
            return error::set_invalid_argument("reply cannot be null");
        }

        let out = {
            // SAFETY: Pointer validity is guaranteed by the caller.
            unsafe { &mut *reply }
        };

        let mode = if block == AUDITPRIMS_GET_REPLY_NONBLOCKING {
            RecvMode::NonBlocking
        } else {
            RecvMode::Blocking
        };

        with_receive_session(fd, |session| match session.receive(mode, peek != 0) {
            Ok(received) => {
                write_reply_out(out, received);
                0
            }
            Err(err) => error::map_client_error(&err),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_descriptor_reports_ebadf() {
        assert_eq!(auditprims_set_pid(-1, 1, AUDITPRIMS_WAIT_NO), -libc::EBADF);
        assert_eq!(
            // SAFETY: empty payload, null data is allowed.
            unsafe { auditprims_send(-1, 1001, std::ptr::null(), 0) },
            -libc::EBADF
        );
    }

    #[test]
    fn invalid_logsplit_is_einval_before_descriptor_check() {
        assert_eq!(auditprims_set_logsplit(-1, 7, AUDITPRIMS_WAIT_NO), -libc::EINVAL);
    }

    #[test]
    fn send_rejects_null_data_with_size() {
        // SAFETY: the null pointer is rejected before use.
        let rc = unsafe { auditprims_send(3, 1001, std::ptr::null(), 8) };
        assert_eq!(rc, -libc::EINVAL);
    }

    #[test]
    fn get_reply_rejects_null_out() {
        // SAFETY: null is rejected before dereference.
        let rc = unsafe { auditprims_get_reply(3, std::ptr::null_mut(), 0, 0) };
        assert_eq!(rc, -libc::EINVAL);
    }

    #[test]
    fn blocking_get_reply_does_not_stall_other_calls() {
        use std::sync::mpsc;
        use std::time::Duration;

        let mut fds = [0 as c_int; 2];
        // SAFETY: `fds` has room for the two descriptors socketpair writes.
        let rc = unsafe { libc::socketpair(libc::AF_UNIX, libc::SOCK_DGRAM, 0, fds.as_mut_ptr()) };
        assert_eq!(rc, 0, "socketpair should succeed");
        let (reader, writer) = (fds[0], fds[1]);

        let receiver = std::thread::spawn(move || {
            let mut out = AuditprimsReply::default();
            // SAFETY: `out` is a valid, default-initialized reply.
            let rc = unsafe { auditprims_get_reply(reader, &mut out, 0, 0) };
            crate::reply::release(&mut out);
            rc
        });
        std::thread::sleep(Duration::from_millis(100));

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(auditprims_set_pid(-1, 1, AUDITPRIMS_WAIT_NO));
        });
        let rc = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("set_pid must not wait behind a blocking receive");
        assert_eq!(rc, -libc::EBADF);

        // Wake the receiver. A socketpair peer is not the kernel, so it errors.
        // SAFETY: `writer` is open and the buffer is valid for 4 bytes.
        let sent = unsafe { libc::send(writer, b"wake".as_ptr().cast(), 4, 0) };
        assert_eq!(sent, 4);
        let rc = receiver.join().expect("receiver thread should finish");
        assert!(rc < 0);

        // SAFETY: both descriptors came from socketpair above.
        unsafe {
            libc::close(reader);
            libc::close(writer);
        }
    }

    #[test]
    fn write_reply_out_copies_body_and_reuse_is_safe() {
        let mut buf = vec![0u8; auditprims_frame::RECV_BUFFER_SIZE];
        let mut wire = bytes::BytesMut::new();
        auditprims_frame::encode_message(1300, 0, 4, b"audit", &mut wire).unwrap();
        buf[..wire.len()].copy_from_slice(&wire);
        let reply = auditprims_frame::decode_reply(&buf, wire.len()).unwrap();

        let mut out = AuditprimsReply::default();
        write_reply_out(&mut out, Some(reply));
        assert_eq!(out.msg_type, 1300);
        assert_eq!(out.seq, 4);
        assert_eq!(out.data_len, 8);
        assert!(!out.data.is_null());

        write_reply_out(&mut out, None);
        assert_eq!(out.msg_type, 0);
        assert!(out.data.is_null());
    }
}
