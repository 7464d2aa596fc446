mod sealed {
    pub trait Sealed {}
}

use self::sealed::Sealed;

use crate::kernel::{fuse_context, fuse_file_info, fuse_operations};

use std::mem;

/// Native plain-old-data types for which the all-zero bit pattern is valid
pub unsafe trait NativeData: Sealed + Sized {}

macro_rules! mark_abi_type {
    ($t: ty) => {
        impl Sealed for $t {}
        unsafe impl NativeData for $t {}
    };
}

macro_rules! mark_sized_types {
    ($($t:ty,)+) => {
        $(
            mark_abi_type!($t);
        )+

        #[test]
        fn check_zst(){
            $(
                assert!(std::mem::size_of::<$t>() > 0);
            )+
        }

        #[test]
        fn max(){
            $(
                assert!(std::mem::size_of::<$t>() <= 512);
            )+
        }
    };
}

mark_sized_types!(
    libc::stat,
    libc::statvfs,
    libc::utimbuf,
    libc::flock,
    fuse_file_info,
    fuse_context,
    fuse_operations,
);

/// Returns a zero-filled native value
#[inline]
#[must_use]
pub fn zeroed<T: NativeData>() -> T {
    // SAFETY: `NativeData` is only implemented for C structs made of
    // integers and nullable pointers
    unsafe { mem::zeroed() }
}
