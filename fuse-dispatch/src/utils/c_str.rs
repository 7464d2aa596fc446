use super::c_bytes::{check_bytes, NulError};
use crate::decode::DecodeError;

use std::ffi::{CStr, CString, OsStr};
use std::os::raw::c_char;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr;

/// Converts bytes into a [`CString`]
/// # Errors
/// Returns [`NulError`] when `bytes` contain an interior nul byte
#[inline]
pub fn to_c_string(bytes: &[u8]) -> Result<CString, NulError> {
    check_bytes(bytes)?;
    // SAFETY: checked above
    Ok(unsafe { CString::from_vec_unchecked(Vec::from(bytes)) })
}

/// Borrows a native string as an [`OsStr`]
///
/// # Safety
/// `ptr` must be null or point to a nul-terminated string that outlives `'a`
#[inline]
pub unsafe fn os_str<'a>(ptr: *const c_char) -> Result<&'a OsStr, DecodeError> {
    if ptr.is_null() {
        return Err(DecodeError::NullPointer);
    }
    Ok(OsStr::from_bytes(CStr::from_ptr(ptr).to_bytes()))
}

/// Borrows a native string as a [`Path`]
///
/// # Safety
/// See [`os_str`]
#[inline]
pub unsafe fn path<'a>(ptr: *const c_char) -> Result<&'a Path, DecodeError> {
    os_str(ptr).map(Path::new)
}

/// Copies `bytes` followed by a nul byte into a native buffer of `size` bytes
///
/// Returns `false` and writes nothing when the buffer is too small.
///
/// # Safety
/// `buf` must be valid for `size` bytes of writes
#[inline]
pub unsafe fn copy_with_nul(bytes: &[u8], buf: *mut c_char, size: usize) -> bool {
    if bytes.len() >= size {
        return false;
    }
    let dst: *mut u8 = buf.cast();
    ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len());
    dst.add(bytes.len()).write(0);
    true
}
