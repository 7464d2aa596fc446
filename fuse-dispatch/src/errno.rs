//! Portable error numbers

use std::fmt;
use std::io;
use std::os::raw::c_int;

#[cfg(target_os = "linux")]
const ENOATTR: c_int = libc::ENODATA;

#[cfg(not(target_os = "linux"))]
const ENOATTR: c_int = libc::ENOATTR;

macro_rules! errno_table {
    (
        common { $($variant:ident => $native:expr,)+ }
        linux { $($lvariant:ident => $lnative:ident,)+ }
    ) => {
        /// A portable error number
        ///
        /// Every variant names a POSIX or platform error. Variants that do not
        /// exist on the current platform have no native value and are
        /// reported to the kernel as `EIO`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[non_exhaustive]
        pub enum Errno {
            $($variant,)+
            $($lvariant,)+
        }

        impl Errno {
            /// Returns the positive native error number, if this platform has one
            #[must_use]
            #[inline]
            pub fn into_native(self) -> Option<c_int> {
                match self {
                    $(Self::$variant => Some($native),)+
                    $(
                        #[cfg(target_os = "linux")]
                        Self::$lvariant => Some(libc::$lnative),
                        #[cfg(not(target_os = "linux"))]
                        Self::$lvariant => None,
                    )+
                }
            }

            /// Maps a positive native error number back to its portable variant
            #[must_use]
            #[inline]
            pub fn from_native(errno: c_int) -> Option<Self> {
                $(
                    if errno == $native {
                        return Some(Self::$variant);
                    }
                )+
                $(
                    #[cfg(target_os = "linux")]
                    {
                        if errno == libc::$lnative {
                            return Some(Self::$lvariant);
                        }
                    }
                )+
                None
            }
        }
    };
}

errno_table! {
    common {
        Perm => libc::EPERM,
        NoEnt => libc::ENOENT,
        Srch => libc::ESRCH,
        Intr => libc::EINTR,
        Io => libc::EIO,
        NxIo => libc::ENXIO,
        TooBig => libc::E2BIG,
        NoExec => libc::ENOEXEC,
        BadF => libc::EBADF,
        Child => libc::ECHILD,
        Again => libc::EAGAIN,
        NoMem => libc::ENOMEM,
        Access => libc::EACCES,
        Fault => libc::EFAULT,
        Busy => libc::EBUSY,
        Exist => libc::EEXIST,
        XDev => libc::EXDEV,
        NoDev => libc::ENODEV,
        NotDir => libc::ENOTDIR,
        IsDir => libc::EISDIR,
        Inval => libc::EINVAL,
        NFile => libc::ENFILE,
        MFile => libc::EMFILE,
        NoTty => libc::ENOTTY,
        TxtBsy => libc::ETXTBSY,
        FBig => libc::EFBIG,
        NoSpc => libc::ENOSPC,
        SPipe => libc::ESPIPE,
        RoFs => libc::EROFS,
        MLink => libc::EMLINK,
        Pipe => libc::EPIPE,
        Dom => libc::EDOM,
        Range => libc::ERANGE,
        DeadLk => libc::EDEADLK,
        NameTooLong => libc::ENAMETOOLONG,
        NoLck => libc::ENOLCK,
        NoSys => libc::ENOSYS,
        NotEmpty => libc::ENOTEMPTY,
        Loop => libc::ELOOP,
        NoAttr => ENOATTR,
        NoData => libc::ENODATA,
        NotSup => libc::ENOTSUP,
        OpNotSupp => libc::EOPNOTSUPP,
        Overflow => libc::EOVERFLOW,
        Stale => libc::ESTALE,
        DQuot => libc::EDQUOT,
        TimedOut => libc::ETIMEDOUT,
        Canceled => libc::ECANCELED,
        NotConn => libc::ENOTCONN,
    }
    linux {
        NoMedium => ENOMEDIUM,
        MediumType => EMEDIUMTYPE,
        Comm => ECOMM,
        RemoteIo => EREMOTEIO,
        NoKey => ENOKEY,
    }
}

impl Errno {
    /// Returns the value a libfuse operation returns for this error
    ///
    /// Variants without a native value on this platform become `-EIO`.
    #[must_use]
    #[inline]
    pub fn as_return_value(self) -> c_int {
        self.into_native().unwrap_or(libc::EIO).wrapping_neg()
    }
}

impl fmt::Display for Errno {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.into_native() {
            Some(raw) => write!(f, "{:?} ({})", self, io::Error::from_raw_os_error(raw)),
            None => write!(f, "{:?} (unsupported on this platform)", self),
        }
    }
}

impl std::error::Error for Errno {}

impl From<io::Error> for Errno {
    #[inline]
    fn from(err: io::Error) -> Self {
        if let Some(errno) = err.raw_os_error().and_then(Self::from_native) {
            return errno;
        }
        match err.kind() {
            io::ErrorKind::NotFound => Self::NoEnt,
            io::ErrorKind::PermissionDenied => Self::Access,
            io::ErrorKind::AlreadyExists => Self::Exist,
            io::ErrorKind::InvalidInput => Self::Inval,
            io::ErrorKind::Interrupted => Self::Intr,
            io::ErrorKind::TimedOut => Self::TimedOut,
            io::ErrorKind::WouldBlock => Self::Again,
            _ => Self::Io,
        }
    }
}
