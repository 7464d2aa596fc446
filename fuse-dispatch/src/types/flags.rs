use std::os::raw::{c_int, c_ulong};

/// `O_LARGEFILE` as the kernel reports it
///
/// 64-bit glibc targets define the libc constant as zero while the kernel
/// still sets the bit in the flags it passes to `open`.
#[cfg(target_os = "linux")]
const O_LARGEFILE: c_int = if libc::O_LARGEFILE == 0 {
    0o100_000
} else {
    libc::O_LARGEFILE
};

/// The bit `O_SYNC` sets on top of `O_DSYNC` (`__O_SYNC`)
///
/// `O_SYNC` decodes as `SYNC | DATA_SYNC`.
#[cfg(target_os = "linux")]
const O_SYNC_ONLY: c_int = libc::O_SYNC & !libc::O_DSYNC;

#[cfg(not(target_os = "linux"))]
const O_SYNC_ONLY: c_int = libc::O_SYNC;

/// `FMODE_EXEC`: the file is being opened for execution
#[cfg(target_os = "linux")]
const FMODE_EXEC: c_int = 0x20;

native_flags! {
    /// Open flags without the access mode
    pub struct OpenFlags: c_int {
        const APPEND = 1 << 0 => libc::O_APPEND;
        const CREATE = 1 << 1 => libc::O_CREAT;
        const EXCLUSIVE = 1 << 2 => libc::O_EXCL;
        const NO_CTTY = 1 << 3 => libc::O_NOCTTY;
        const NONBLOCK = 1 << 4 => libc::O_NONBLOCK;
        const SYNC = 1 << 5 => O_SYNC_ONLY;
        const TRUNCATE = 1 << 6 => libc::O_TRUNC;
        const DIRECTORY = 1 << 7 => libc::O_DIRECTORY;
        const NO_FOLLOW = 1 << 8 => libc::O_NOFOLLOW;
        const CLOSE_ON_EXEC = 1 << 9 => libc::O_CLOEXEC;
        #[cfg(target_os = "linux")]
        const DATA_SYNC = 1 << 10 => libc::O_DSYNC;
        #[cfg(target_os = "linux")]
        const ASYNC = 1 << 11 => libc::O_ASYNC;
        #[cfg(target_os = "linux")]
        const DIRECT = 1 << 12 => libc::O_DIRECT;
        #[cfg(target_os = "linux")]
        const NO_ATIME = 1 << 13 => libc::O_NOATIME;
        #[cfg(target_os = "linux")]
        const LARGE_FILE = 1 << 14 => O_LARGEFILE;
        #[cfg(target_os = "linux")]
        const EXEC = 1 << 15 => FMODE_EXEC;
    }
}

native_flags! {
    /// Permissions checked by `access`
    ///
    /// The empty set is `F_OK`, an existence check.
    pub struct AccessModes: c_int {
        const READ = 1 << 0 => libc::R_OK;
        const WRITE = 1 << 1 => libc::W_OK;
        const EXECUTE = 1 << 2 => libc::X_OK;
    }
}

native_flags! {
    /// Flags of `setxattr`
    pub struct XattrFlags: c_int {
        const CREATE = 1 << 0 => libc::XATTR_CREATE;
        const REPLACE = 1 << 1 => libc::XATTR_REPLACE;
    }
}

native_flags! {
    /// Mount flags reported by `statfs`
    pub struct MountFlags: c_ulong {
        const READ_ONLY = 1 << 0 => libc::ST_RDONLY;
        const NO_SUID = 1 << 1 => libc::ST_NOSUID;
        #[cfg(target_os = "linux")]
        const NO_DEV = 1 << 2 => libc::ST_NODEV;
        #[cfg(target_os = "linux")]
        const NO_EXEC = 1 << 3 => libc::ST_NOEXEC;
        #[cfg(target_os = "linux")]
        const SYNCHRONOUS = 1 << 4 => libc::ST_SYNCHRONOUS;
        #[cfg(target_os = "linux")]
        const MANDATORY_LOCK = 1 << 5 => libc::ST_MANDLOCK;
        #[cfg(target_os = "linux")]
        const WRITE = 1 << 6 => libc::ST_WRITE;
        #[cfg(target_os = "linux")]
        const APPEND = 1 << 7 => libc::ST_APPEND;
        #[cfg(target_os = "linux")]
        const IMMUTABLE = 1 << 8 => libc::ST_IMMUTABLE;
        #[cfg(target_os = "linux")]
        const NO_ATIME = 1 << 9 => libc::ST_NOATIME;
        #[cfg(target_os = "linux")]
        const NO_DIR_ATIME = 1 << 10 => libc::ST_NODIRATIME;
        #[cfg(target_os = "linux")]
        const RELATIME = 1 << 11 => libc::ST_RELATIME;
    }
}
