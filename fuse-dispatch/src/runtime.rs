//! The native runtime behind a session

use crate::error::Error;
use crate::kernel::{fuse, fuse_args, fuse_chan, fuse_context, fuse_operations};
use crate::utils::c_str::to_c_string;

use std::convert::TryFrom;
use std::ffi::{CStr, CString};
use std::fmt;
use std::io;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr::{self, NonNull};

use smallvec::SmallVec;

/// The entry points of a libfuse-compatible runtime
///
/// [`LibFuse`] binds the system libfuse. The associated functions without a
/// receiver are called from native threads where no runtime value is at
/// hand.
pub trait Runtime: Send + Sync + 'static {
    /// The context of the call running on this thread (`fuse_get_context`)
    fn context() -> Option<fuse_context>;

    /// Makes the event loop of `fuse` return (`fuse_exit`)
    ///
    /// # Safety
    /// `fuse` must be a live instance created by this runtime
    unsafe fn exit(fuse: NonNull<fuse>);

    /// Mounts a channel at `mount_point` (`fuse_mount`)
    ///
    /// # Errors
    /// Returns [`io::Error`] when the mount fails
    fn mount(&self, mount_point: &CStr, args: &mut fuse_args) -> io::Result<NonNull<fuse_chan>>;

    /// Creates the file system instance on a mounted channel (`fuse_new`)
    ///
    /// # Safety
    /// `chan` must come from [`Runtime::mount`]. `operations` and
    /// `user_data` must stay valid until [`Runtime::destroy`] returns.
    ///
    /// # Errors
    /// Returns [`io::Error`] when the instance cannot be created
    unsafe fn create(
        &self,
        chan: NonNull<fuse_chan>,
        args: &mut fuse_args,
        operations: &fuse_operations,
        user_data: *mut c_void,
    ) -> io::Result<NonNull<fuse>>;

    /// Runs the event loop until unmount or [`Runtime::exit`]
    /// (`fuse_loop` / `fuse_loop_mt`)
    ///
    /// # Safety
    /// `fuse` must be a live instance created by this runtime
    ///
    /// # Errors
    /// Returns [`io::Error`] when the loop fails
    unsafe fn run_loop(&self, fuse: NonNull<fuse>, multithreaded: bool) -> io::Result<()>;

    /// Unmounts the channel (`fuse_unmount`)
    ///
    /// # Safety
    /// `chan` must come from [`Runtime::mount`] and is invalid afterwards
    unsafe fn unmount(&self, mount_point: &CStr, chan: NonNull<fuse_chan>);

    /// Destroys the file system instance (`fuse_destroy`)
    ///
    /// # Safety
    /// `fuse` must be a live instance created by this runtime and is invalid
    /// afterwards
    unsafe fn destroy(&self, fuse: NonNull<fuse>);

    /// Frees what the runtime allocated in `args` (`fuse_opt_free_args`)
    ///
    /// # Safety
    /// `args` must have been passed to this runtime only
    #[inline]
    unsafe fn free_args(&self, args: &mut fuse_args) {
        let _ = args;
    }
}

/// An owned argument vector in the `struct fuse_args` form
pub(crate) struct NativeArgs {
    /// the strings `argv` points to
    strings: SmallVec<[CString; 8]>,
    /// the null-terminated pointer array of `raw`
    #[allow(dead_code)]
    argv: Vec<*mut c_char>,
    raw: fuse_args,
}

impl NativeArgs {
    /// Copies `args` into a native argument vector
    /// # Errors
    /// Returns [`Error::Nul`] when an argument contains a nul byte
    #[inline]
    pub(crate) fn new<I, S>(args: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let strings = args
            .into_iter()
            .map(|arg| to_c_string(arg.as_ref().as_bytes()))
            .collect::<Result<SmallVec<[CString; 8]>, _>>()?;

        let argc = c_int::try_from(strings.len()).map_err(|_| Error::InvalidOption {
            name: String::from("argc"),
            value: Some(strings.len().to_string()),
        })?;

        let mut argv: Vec<*mut c_char> = strings
            .iter()
            .map(|arg| arg.as_ptr() as *mut c_char)
            .collect();
        argv.push(ptr::null_mut());

        let raw = fuse_args {
            argc,
            argv: argv.as_mut_ptr(),
            allocated: 0,
        };
        Ok(Self { strings, argv, raw })
    }

    /// The argument strings
    #[inline]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &CStr> + '_ {
        self.strings.iter().map(CString::as_c_str)
    }

    /// The native form, which the runtime may rewrite
    #[inline]
    pub(crate) fn as_raw_mut(&mut self) -> &mut fuse_args {
        &mut self.raw
    }
}

impl fmt::Debug for NativeArgs {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

// SAFETY: the pointers refer to the owned strings and vector
unsafe impl Send for NativeArgs {}

#[cfg(feature = "libfuse")]
pub use self::libfuse::LibFuse;

#[cfg(feature = "libfuse")]
mod libfuse {
    use super::Runtime;
    use crate::kernel::{fuse, fuse_args, fuse_chan, fuse_context, fuse_operations};

    use std::ffi::CStr;
    use std::io;
    use std::mem;
    use std::os::raw::{c_char, c_int, c_void};
    use std::ptr::NonNull;

    #[link(name = "fuse")]
    extern "C" {
        fn fuse_mount(mountpoint: *const c_char, args: *mut fuse_args) -> *mut fuse_chan;
        fn fuse_unmount(mountpoint: *const c_char, ch: *mut fuse_chan);
        fn fuse_new(
            ch: *mut fuse_chan,
            args: *mut fuse_args,
            op: *const fuse_operations,
            op_size: usize,
            user_data: *mut c_void,
        ) -> *mut fuse;
        fn fuse_destroy(f: *mut fuse);
        fn fuse_loop(f: *mut fuse) -> c_int;
        fn fuse_loop_mt(f: *mut fuse) -> c_int;
        fn fuse_exit(f: *mut fuse);
        fn fuse_get_context() -> *mut fuse_context;
        fn fuse_opt_free_args(args: *mut fuse_args);
    }

    /// The system libfuse, 2.6 high-level API
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LibFuse;

    fn failed(call: &str) -> io::Error {
        let err = io::Error::last_os_error();
        if err.raw_os_error().unwrap_or(0) == 0 {
            io::Error::new(io::ErrorKind::Other, format!("{} failed", call))
        } else {
            err
        }
    }

    impl Runtime for LibFuse {
        #[inline]
        fn context() -> Option<fuse_context> {
            // SAFETY: libfuse returns the context of the calling thread
            unsafe { fuse_get_context().as_ref().copied() }
        }

        #[inline]
        unsafe fn exit(fuse: NonNull<fuse>) {
            fuse_exit(fuse.as_ptr());
        }

        #[inline]
        fn mount(
            &self,
            mount_point: &CStr,
            args: &mut fuse_args,
        ) -> io::Result<NonNull<fuse_chan>> {
            // SAFETY: both pointers are valid for the call
            let chan = unsafe { fuse_mount(mount_point.as_ptr(), args) };
            NonNull::new(chan).ok_or_else(|| failed("fuse_mount"))
        }

        #[inline]
        unsafe fn create(
            &self,
            chan: NonNull<fuse_chan>,
            args: &mut fuse_args,
            operations: &fuse_operations,
            user_data: *mut c_void,
        ) -> io::Result<NonNull<fuse>> {
            let fuse = fuse_new(
                chan.as_ptr(),
                args,
                operations,
                mem::size_of::<fuse_operations>(),
                user_data,
            );
            NonNull::new(fuse).ok_or_else(|| failed("fuse_new"))
        }

        #[inline]
        unsafe fn run_loop(&self, fuse: NonNull<fuse>, multithreaded: bool) -> io::Result<()> {
            let ret = if multithreaded {
                fuse_loop_mt(fuse.as_ptr())
            } else {
                fuse_loop(fuse.as_ptr())
            };
            if ret == 0 {
                Ok(())
            } else {
                Err(failed("fuse_loop"))
            }
        }

        #[inline]
        unsafe fn unmount(&self, mount_point: &CStr, chan: NonNull<fuse_chan>) {
            fuse_unmount(mount_point.as_ptr(), chan.as_ptr());
        }

        #[inline]
        unsafe fn destroy(&self, fuse: NonNull<fuse>) {
            fuse_destroy(fuse.as_ptr());
        }

        #[inline]
        unsafe fn free_args(&self, args: &mut fuse_args) {
            fuse_opt_free_args(args);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_args() {
        let mut args = NativeArgs::new(&["hellofs", "-d", "-oallow_other"]).unwrap();
        let raw = args.as_raw_mut();
        assert_eq!(raw.argc, 3);
        assert_eq!(raw.allocated, 0);

        let argv = unsafe { std::slice::from_raw_parts(raw.argv, 4) };
        let second = unsafe { CStr::from_ptr(argv[1]) };
        assert_eq!(second.to_bytes(), b"-d");
        assert!(argv[3].is_null());

        let strings: Vec<&CStr> = args.iter().collect();
        assert_eq!(strings[2].to_bytes(), b"-oallow_other");

        assert!(matches!(
            NativeArgs::new(&["a\0b"]),
            Err(Error::Nul(_))
        ));
    }

    #[test]
    fn moved_args_stay_valid() {
        let args = NativeArgs::new(vec![String::from("prog"), String::from("-s")]).unwrap();
        let mut moved = Box::new(args);
        let raw = moved.as_raw_mut();
        let first = unsafe { CStr::from_ptr(*raw.argv) };
        assert_eq!(first.to_bytes(), b"prog");
    }
}
