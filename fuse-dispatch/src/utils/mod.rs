pub mod c_bytes;
pub mod c_str;

use crate::decode::DecodeError;

use std::os::raw::c_char;
use std::slice;

/// Borrows a native buffer
///
/// # Safety
/// `ptr` must be null or valid for `len` bytes of reads during `'a`
#[inline]
pub unsafe fn native_slice<'a>(ptr: *const c_char, len: usize) -> Result<&'a [u8], DecodeError> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(DecodeError::NullPointer);
    }
    Ok(slice::from_raw_parts(ptr.cast(), len))
}

/// Borrows a native buffer mutably
///
/// # Safety
/// `ptr` must be null or valid for `len` bytes of writes during `'a`,
/// and not aliased
#[inline]
pub unsafe fn native_slice_mut<'a>(
    ptr: *mut c_char,
    len: usize,
) -> Result<&'a mut [u8], DecodeError> {
    if len == 0 {
        return Ok(&mut []);
    }
    if ptr.is_null() {
        return Err(DecodeError::NullPointer);
    }
    Ok(slice::from_raw_parts_mut(ptr.cast(), len))
}

/// Borrows a native struct
///
/// # Safety
/// `ptr` must be null or valid for reads during `'a`
#[inline]
pub unsafe fn native_ref<'a, T>(ptr: *const T) -> Result<&'a T, DecodeError> {
    ptr.as_ref().ok_or(DecodeError::NullPointer)
}

/// Borrows a native struct mutably
///
/// # Safety
/// `ptr` must be null or valid for writes during `'a`, and not aliased
#[inline]
pub unsafe fn native_mut<'a, T>(ptr: *mut T) -> Result<&'a mut T, DecodeError> {
    ptr.as_mut().ok_or(DecodeError::NullPointer)
}
