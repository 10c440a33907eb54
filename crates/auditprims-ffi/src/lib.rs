//! auditprims-ffi: C-ABI exports for the audit control session.
//!
//! Functions return 0 or a positive value on success and a negative errno
//! on failure; `auditprims_last_error` describes the most recent failure on
//! the calling thread. All descriptors share one process-wide sequence
//! counter, locked across each send and its acknowledgement.

mod args;
mod error;
mod reply;
#[cfg(target_os = "linux")]
mod session;
mod types;

use std::panic::AssertUnwindSafe;

pub use reply::auditprims_reply_free;
#[cfg(target_os = "linux")]
pub use session::{
    auditprims_close, auditprims_get_reply, auditprims_open, auditprims_send,
    auditprims_set_logsplit, auditprims_set_pid,
};
pub use types::{
    AuditprimsReply, AUDITPRIMS_GET_REPLY_BLOCKING, AUDITPRIMS_GET_REPLY_NONBLOCKING,
    AUDITPRIMS_LOGSPLIT_OFF, AUDITPRIMS_LOGSPLIT_ON, AUDITPRIMS_WAIT_NO, AUDITPRIMS_WAIT_YES,
};

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

#[no_mangle]
pub extern "C" fn auditprims_last_error() -> *const std::os::raw::c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}
