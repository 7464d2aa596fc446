//! libfuse high-level ABI types
//!
//! # Source
//!
//! current: <https://github.com/libfuse/libfuse/blob/fuse_2_6_bugfix/include/fuse.h>
//!
//! <https://github.com/libfuse/libfuse/blob/fuse_2_6_bugfix/include/fuse_common.h>
//!
//! The layout of every type here is fixed by libfuse. Reordering a field or a
//! slot of [`fuse_operations`] changes the meaning of everything after it.

use std::os::raw::{c_char, c_int, c_uint, c_ulong, c_void};

use libc::{dev_t, flock, gid_t, mode_t, off_t, pid_t, stat, statvfs, timespec, uid_t, utimbuf};

/// The libfuse API version the operation table is laid out for
pub const FUSE_USE_VERSION: c_int = 26;

/// Opaque handle of a libfuse filesystem instance
#[repr(C)]
pub struct fuse {
    _private: [u8; 0],
}

/// Opaque handle of a libfuse communication channel
#[repr(C)]
pub struct fuse_chan {
    _private: [u8; 0],
}

/// Connection parameters passed to `init`
#[repr(C)]
pub struct fuse_conn_info {
    _private: [u8; 0],
}

/// Opaque handle of the deprecated `getdir` buffer
#[repr(C)]
pub struct fuse_dirhandle {
    _private: [u8; 0],
}

/// `struct fuse_args`
#[repr(C)]
#[derive(Debug)]
pub struct fuse_args {
    pub argc: c_int,
    pub argv: *mut *mut c_char,
    pub allocated: c_int,
}

/// `struct fuse_context`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct fuse_context {
    pub fuse: *mut fuse,
    pub uid: uid_t,
    pub gid: gid_t,
    pub pid: pid_t,
    pub private_data: *mut c_void,
}

/// `struct fuse_file_info`
///
/// The C struct declares `direct_io`, `keep_cache`, `flush` and
/// `nonseekable` as one-bit fields followed by 28 bits of padding. They are
/// packed into [`fuse_file_info::bits`] here.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct fuse_file_info {
    pub flags: c_int,
    pub fh_old: c_ulong,
    pub writepage: c_int,
    pub bits: c_uint,
    pub fh: u64,
    pub lock_owner: u64,
}

/// `fuse_file_info::direct_io`
pub const FI_DIRECT_IO: c_uint = 1 << 0;
/// `fuse_file_info::keep_cache`
pub const FI_KEEP_CACHE: c_uint = 1 << 1;
/// `fuse_file_info::flush`
pub const FI_FLUSH: c_uint = 1 << 2;
/// `fuse_file_info::nonseekable`
pub const FI_NONSEEKABLE: c_uint = 1 << 3;

/// Adds one directory entry to the buffer of a `readdir` call.
///
/// Returns non-zero when the buffer is full.
pub type fuse_fill_dir_t = unsafe extern "C" fn(
    buf: *mut c_void,
    name: *const c_char,
    stbuf: *const stat,
    off: off_t,
) -> c_int;

/// Deprecated `getdir` filler
pub type fuse_dirfil_t = unsafe extern "C" fn(
    h: *mut fuse_dirhandle,
    name: *const c_char,
    type_: c_int,
    ino: libc::ino_t,
) -> c_int;

/// `struct fuse_operations`
#[allow(clippy::type_complexity)]
#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct fuse_operations {
    pub getattr: Option<unsafe extern "C" fn(*const c_char, *mut stat) -> c_int>,
    pub readlink: Option<unsafe extern "C" fn(*const c_char, *mut c_char, usize) -> c_int>,
    pub getdir:
        Option<unsafe extern "C" fn(*const c_char, *mut fuse_dirhandle, fuse_dirfil_t) -> c_int>,
    pub mknod: Option<unsafe extern "C" fn(*const c_char, mode_t, dev_t) -> c_int>,
    pub mkdir: Option<unsafe extern "C" fn(*const c_char, mode_t) -> c_int>,
    pub unlink: Option<unsafe extern "C" fn(*const c_char) -> c_int>,
    pub rmdir: Option<unsafe extern "C" fn(*const c_char) -> c_int>,
    pub symlink: Option<unsafe extern "C" fn(*const c_char, *const c_char) -> c_int>,
    pub rename: Option<unsafe extern "C" fn(*const c_char, *const c_char) -> c_int>,
    pub link: Option<unsafe extern "C" fn(*const c_char, *const c_char) -> c_int>,
    pub chmod: Option<unsafe extern "C" fn(*const c_char, mode_t) -> c_int>,
    pub chown: Option<unsafe extern "C" fn(*const c_char, uid_t, gid_t) -> c_int>,
    pub truncate: Option<unsafe extern "C" fn(*const c_char, off_t) -> c_int>,
    pub utime: Option<unsafe extern "C" fn(*const c_char, *mut utimbuf) -> c_int>,
    pub open: Option<unsafe extern "C" fn(*const c_char, *mut fuse_file_info) -> c_int>,
    pub read: Option<
        unsafe extern "C" fn(*const c_char, *mut c_char, usize, off_t, *mut fuse_file_info) -> c_int,
    >,
    pub write: Option<
        unsafe extern "C" fn(
            *const c_char,
            *const c_char,
            usize,
            off_t,
            *mut fuse_file_info,
        ) -> c_int,
    >,
    pub statfs: Option<unsafe extern "C" fn(*const c_char, *mut statvfs) -> c_int>,
    pub flush: Option<unsafe extern "C" fn(*const c_char, *mut fuse_file_info) -> c_int>,
    pub release: Option<unsafe extern "C" fn(*const c_char, *mut fuse_file_info) -> c_int>,
    pub fsync: Option<unsafe extern "C" fn(*const c_char, c_int, *mut fuse_file_info) -> c_int>,
    pub setxattr: Option<
        unsafe extern "C" fn(*const c_char, *const c_char, *const c_char, usize, c_int) -> c_int,
    >,
    pub getxattr:
        Option<unsafe extern "C" fn(*const c_char, *const c_char, *mut c_char, usize) -> c_int>,
    pub listxattr: Option<unsafe extern "C" fn(*const c_char, *mut c_char, usize) -> c_int>,
    pub removexattr: Option<unsafe extern "C" fn(*const c_char, *const c_char) -> c_int>,
    pub opendir: Option<unsafe extern "C" fn(*const c_char, *mut fuse_file_info) -> c_int>,
    pub readdir: Option<
        unsafe extern "C" fn(
            *const c_char,
            *mut c_void,
            fuse_fill_dir_t,
            off_t,
            *mut fuse_file_info,
        ) -> c_int,
    >,
    pub releasedir: Option<unsafe extern "C" fn(*const c_char, *mut fuse_file_info) -> c_int>,
    pub fsyncdir:
        Option<unsafe extern "C" fn(*const c_char, c_int, *mut fuse_file_info) -> c_int>,
    pub init: Option<unsafe extern "C" fn(*mut fuse_conn_info) -> *mut c_void>,
    pub destroy: Option<unsafe extern "C" fn(*mut c_void)>,
    pub access: Option<unsafe extern "C" fn(*const c_char, c_int) -> c_int>,
    pub create:
        Option<unsafe extern "C" fn(*const c_char, mode_t, *mut fuse_file_info) -> c_int>,
    pub ftruncate:
        Option<unsafe extern "C" fn(*const c_char, off_t, *mut fuse_file_info) -> c_int>,
    pub fgetattr:
        Option<unsafe extern "C" fn(*const c_char, *mut stat, *mut fuse_file_info) -> c_int>,
    pub lock: Option<
        unsafe extern "C" fn(*const c_char, *mut fuse_file_info, c_int, *mut flock) -> c_int,
    >,
    pub utimens: Option<unsafe extern "C" fn(*const c_char, *const timespec) -> c_int>,
    pub bmap: Option<unsafe extern "C" fn(*const c_char, usize, *mut u64) -> c_int>,
}

impl std::fmt::Debug for fuse_operations {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        macro_rules! slots {
            ($($slot:ident,)+) => {
                f.debug_struct("fuse_operations")
                    $(.field(stringify!($slot), &self.$slot.is_some()))+
                    .finish()
            };
        }
        slots!(
            getattr, readlink, getdir, mknod, mkdir, unlink, rmdir, symlink, rename, link, chmod,
            chown, truncate, utime, open, read, write, statfs, flush, release, fsync, setxattr,
            getxattr, listxattr, removexattr, opendir, readdir, releasedir, fsyncdir, init,
            destroy, access, create, ftruncate, fgetattr, lock, utimens, bmap,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn operations_layout() {
        // 38 function pointer slots, in libfuse 2.6 order
        assert_eq!(
            mem::size_of::<fuse_operations>(),
            38 * mem::size_of::<usize>()
        );

        let ops = fuse_operations::default();
        let base = &ops as *const fuse_operations as usize;
        macro_rules! slot {
            ($f:ident) => {
                (&ops.$f as *const _ as usize - base) / mem::size_of::<usize>()
            };
        }

        assert_eq!(slot!(getattr), 0);
        assert_eq!(slot!(getdir), 2);
        assert_eq!(slot!(utime), 13);
        assert_eq!(slot!(readdir), 26);
        assert_eq!(slot!(init), 29);
        assert_eq!(slot!(fgetattr), 34);
        assert_eq!(slot!(bmap), 37);
    }

    #[test]
    fn file_info_layout() {
        let info_size = mem::size_of::<fuse_file_info>();
        assert_eq!(info_size % 8, 0);
        assert!(info_size >= 32);
    }
}
