use crate::error;

/// Convert an optional byte pointer + length into a slice.
///
/// # Safety
/// If `len > 0`, `data` must be non-null and readable for `len` bytes.
pub(crate) unsafe fn bytes_arg<'a>(data: *const u8, len: usize, name: &str) -> Option<&'a [u8]> {
    if len == 0 || data.is_null() {
        if len > 0 {
            let _ = error::set_invalid_argument(format!("{name} cannot be null when len > 0"));
            return None;
        }
        return Some(&[]);
    }

    // SAFETY: Pointer and length are validated above and owned by caller for the call duration.
    Some(unsafe { std::slice::from_raw_parts(data, len) })
}

/// Convert a C message type into the 16-bit wire tag.
pub(crate) fn msg_type_arg(msg_type: i32) -> Option<u16> {
    match u16::try_from(msg_type) {
        Ok(v) => Some(v),
        Err(_) => {
            let _ = error::set_invalid_argument(format!("message type {msg_type} out of range"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bytes_accept_null() {
        // SAFETY: zero length never dereferences the pointer.
        let bytes = unsafe { bytes_arg(std::ptr::null(), 0, "data") };
        assert_eq!(bytes, Some(&[][..]));
    }

    #[test]
    fn null_bytes_with_length_rejected() {
        // SAFETY: the null pointer is rejected before use.
        let bytes = unsafe { bytes_arg(std::ptr::null(), 4, "data") };
        assert!(bytes.is_none());
    }

    #[test]
    fn msg_type_range() {
        assert_eq!(msg_type_arg(1001), Some(1001));
        assert_eq!(msg_type_arg(-1), None);
        assert_eq!(msg_type_arg(70_000), None);
    }
}
