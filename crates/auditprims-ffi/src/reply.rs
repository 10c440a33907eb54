use std::ptr;

use crate::types::AuditprimsReply;

/// Free body memory held by an [`AuditprimsReply`] populated by `auditprims_get_reply`.
///
/// # Safety
/// `reply` must be either null or a valid pointer to an `AuditprimsReply`.
/// If `reply->data` is non-null, it must have originated from this library.
#[no_mangle]
pub unsafe extern "C" fn auditprims_reply_free(reply: *mut AuditprimsReply) {
    crate::ffi_boundary((), || {
        if reply.is_null() {
            return;
        }

        let reply_ref = {
            // SAFETY: Pointer validity is guaranteed by the caller.
            unsafe { &mut *reply }
        };
        release(reply_ref);
    });
}

/// Drop any library-owned body and reset `reply` to its empty state.
pub(crate) fn release(reply: &mut AuditprimsReply) {
    if !reply.data.is_null() {
        let slice_ptr = ptr::slice_from_raw_parts_mut(reply.data, reply.data_len);
        // SAFETY: `data` was allocated as a `Box<[u8]>` of `data_len` bytes by this library.
        unsafe {
            drop(Box::from_raw(slice_ptr));
        }
    }
    *reply = AuditprimsReply::default();
}
