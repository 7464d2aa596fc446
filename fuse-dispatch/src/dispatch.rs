//! Native entry points
//!
//! Every bound slot of the operation table points to one of the trampolines
//! below, monomorphised for the file system type and the runtime. A
//! trampoline decodes the native arguments, runs the handler inside a panic
//! boundary, encodes the results back and returns a negative errno.

use crate::abi_marker::{zeroed, NativeData};
use crate::context::CallContext;
use crate::decode::{widen, Decode, DecodeError};
use crate::dir::{CursorRegistry, Fill};
use crate::encode::{narrow, Encode, EncodeError};
use crate::errno::Errno;
use crate::fs::{FileSystem, Operations};
use crate::kernel::{fuse_conn_info, fuse_fill_dir_t, fuse_file_info};
use crate::runtime::Runtime;
use crate::session::SessionHandle;
use crate::types::{
    AccessModes, DirectoryEntry, FileTimes, LockCommand, Mode, OpenedHandleInfo, RecordLock,
    XattrFlags,
};
use crate::utils::c_bytes::join_with_nul;
use crate::utils::c_str::{self, copy_with_nul};
use crate::utils::{native_mut, native_ref, native_slice, native_slice_mut};

use std::any::Any;
use std::convert::TryFrom;
use std::os::raw::{c_char, c_int, c_void};
use std::os::unix::ffi::OsStrExt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};

use libc::{dev_t, flock, gid_t, mode_t, off_t, stat, statvfs, uid_t, utimbuf};
use memchr::memchr;
use tracing::{debug, error, trace, trace_span, warn};
use tracing_error::SpanTrace;

/// Why a dispatched call did not succeed
#[derive(Debug)]
pub(crate) enum Failure {
    /// reported by the handler or by a native argument check
    Errno(Errno),
    /// a native argument could not be decoded
    Decode(DecodeError),
    /// a handler result could not be encoded
    Encode(EncodeError),
    /// the handler broke a contract of the call
    Internal(&'static str),
}

impl From<Errno> for Failure {
    #[inline]
    fn from(errno: Errno) -> Self {
        Self::Errno(errno)
    }
}

impl From<DecodeError> for Failure {
    #[inline]
    fn from(err: DecodeError) -> Self {
        Self::Decode(err)
    }
}

impl From<EncodeError> for Failure {
    #[inline]
    fn from(err: EncodeError) -> Self {
        Self::Encode(err)
    }
}

impl Failure {
    /// Converts into the negative errno returned to libfuse
    fn into_return_value(self, op: &'static str) -> c_int {
        match self {
            Self::Errno(errno) => {
                if let Some(code) = errno.into_native() {
                    return code.wrapping_neg();
                }
                error!(op, errno = ?errno, "errno has no native value on this platform");
                -libc::EIO
            }
            Self::Decode(err) => {
                warn!(op, %err, "rejected native argument");
                -libc::EINVAL
            }
            Self::Encode(err) => {
                error!(op, %err, "failed to encode the reply");
                -libc::EIO
            }
            Self::Internal(reason) => {
                error!(op, reason, "internal failure");
                -libc::EIO
            }
        }
    }
}

/// The state shared by every native call of a mounted file system
///
/// libfuse hands the address of the instance back to each call as
/// `fuse_context::private_data`.
#[derive(Debug)]
pub(crate) struct Instance<F> {
    fs: F,
    operations: Operations,
    cursors: CursorRegistry,
    torn_down: AtomicBool,
    destroyed: AtomicBool,
    session: SessionHandle,
}

impl<F: FileSystem> Instance<F> {
    pub(crate) fn new(fs: F, session: SessionHandle) -> Self {
        let operations = fs.operations();
        Self {
            fs,
            operations,
            cursors: CursorRegistry::default(),
            torn_down: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
            session,
        }
    }

    /// Refuses every later call
    pub(crate) fn tear_down(&self) {
        self.torn_down.store(true, Ordering::SeqCst);
    }

    fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Tears down, then runs [`FileSystem::destroy`] once
    pub(crate) fn finish(&self) {
        self.tear_down();
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("destroying file system");
        let _ = contain("destroy", Path::new(""), || self.fs.destroy());
        self.cursors.clear();
    }

    pub(crate) fn as_user_data(&self) -> *mut c_void {
        let ptr: *const Self = self;
        ptr as *mut c_void
    }

    pub(crate) fn into_fs(self) -> F {
        self.fs
    }

    #[cfg(test)]
    pub(crate) fn fs(&self) -> &F {
        &self.fs
    }

    #[cfg(test)]
    pub(crate) fn cursors(&self) -> &CursorRegistry {
        &self.cursors
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        return msg;
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.as_str();
    }
    "Box<dyn Any>"
}

/// Runs `f`, turning a panic into `None`
fn contain<T>(op: &'static str, path: &Path, f: impl FnOnce() -> T) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(ret) => Some(ret),
        Err(payload) => {
            error!(
                op,
                path = %path.display(),
                panic = panic_message(&*payload),
                span_trace = %SpanTrace::capture(),
                "file system operation panicked"
            );
            None
        }
    }
}

/// Resolves the instance of the current call and runs `body` on it
///
/// # Safety
/// `private_data` of the current context must be null or point to a live
/// `Instance<F>`, and `path` must be null or a valid C string
unsafe fn enter<F, R, B>(op: &'static str, path: *const c_char, body: B) -> c_int
where
    F: FileSystem,
    R: Runtime,
    B: FnOnce(&Instance<F>, &Path) -> Result<c_int, Failure>,
{
    let cx = match R::context() {
        Some(cx) => cx,
        None => {
            error!(op, "called without a fuse context");
            return -libc::EIO;
        }
    };
    let instance = match cx.private_data.cast::<Instance<F>>().as_ref() {
        Some(instance) => instance,
        None => {
            error!(op, "called without file system instance");
            return -libc::EIO;
        }
    };
    if instance.is_torn_down() {
        debug!(op, "called after teardown");
        return -libc::EIO;
    }
    let path = match c_str::path(path) {
        Ok(path) => path,
        Err(err) => {
            warn!(op, %err, "invalid path");
            return -libc::EINVAL;
        }
    };

    let span = trace_span!("fuse_op", op, path = %path.display());
    let _span = span.enter();
    let _cx = CallContext::new(cx.uid, cx.gid, cx.pid, instance.session.clone()).enter();
    trace!("dispatch");

    match contain(op, path, || body(instance, path)) {
        Some(Ok(ret)) => ret,
        Some(Err(failure)) => failure.into_return_value(op),
        None => -libc::EIO,
    }
}

/// Encodes `value` into `*out`, leaving it untouched on failure
unsafe fn write_out<T>(value: &T, out: *mut T::Native) -> Result<(), Failure>
where
    T: Encode,
    T::Native: NativeData,
{
    let out = native_mut(out)?;
    let mut raw = zeroed::<T::Native>();
    value.encode(&mut raw)?;
    *out = raw;
    Ok(())
}

/// Replies with a variable-sized value in the xattr convention
unsafe fn reply_sized(data: &[u8], buf: *mut c_char, size: usize) -> Result<c_int, Failure> {
    let len = c_int::try_from(data.len())
        .map_err(|_| Failure::Internal("reply size overflows the return value"))?;
    if size == 0 {
        return Ok(len);
    }
    if data.len() > size {
        return Err(Errno::Range.into());
    }
    native_slice_mut(buf, data.len())?.copy_from_slice(data);
    Ok(len)
}

fn byte_count(count: usize, limit: usize) -> Result<c_int, Failure> {
    if count > limit {
        return Err(Failure::Internal("byte count exceeds the buffer"));
    }
    c_int::try_from(count).map_err(|_| Failure::Internal("byte count overflows the return value"))
}

/// Decodes, hands to the handler and writes back handle info
unsafe fn with_handle_info<H>(fi: *mut fuse_file_info, handler: H) -> Result<c_int, Failure>
where
    H: FnOnce(&mut OpenedHandleInfo) -> Result<(), Errno>,
{
    let raw = native_mut(fi)?;
    let mut info = OpenedHandleInfo::decode(raw)?;
    handler(&mut info)?;
    let mut out = *raw;
    info.encode(&mut out)?;
    *raw = out;
    Ok(0)
}

unsafe fn handle_info(fi: *const fuse_file_info) -> Result<OpenedHandleInfo, Failure> {
    Ok(OpenedHandleInfo::decode(native_ref(fi)?)?)
}

/// Decodes the handle info of an opened directory
///
/// Returns the issued handle and the info carrying the handle chosen by the
/// file system.
unsafe fn directory_info<F>(
    instance: &Instance<F>,
    fi: *const fuse_file_info,
) -> Result<(u64, OpenedHandleInfo), Failure> {
    let raw = native_ref(fi)?;
    let mut info = OpenedHandleInfo::decode(raw)?;
    if let Some(handle) = instance.cursors.directory(raw.fh) {
        info.handle = handle;
    }
    Ok((raw.fh, info))
}

unsafe fn fill_entry(
    filler: fuse_fill_dir_t,
    buf: *mut c_void,
    entry: &DirectoryEntry,
    off: i64,
) -> Result<Fill, EncodeError> {
    let off: off_t = narrow(off, "off")?;
    let raw = match entry.stat() {
        Some(stat) => {
            let mut raw = zeroed::<stat>();
            stat.encode(&mut raw)?;
            Some(raw)
        }
        None => None,
    };
    let stbuf = raw.as_ref().map_or(ptr::null(), |raw| raw as *const stat);
    if filler(buf, entry.c_name().as_ptr(), stbuf, off) == 0 {
        Ok(Fill::Accepted)
    } else {
        Ok(Fill::Full)
    }
}

pub(crate) unsafe extern "C" fn getattr<F: FileSystem, R: Runtime>(
    path: *const c_char,
    stbuf: *mut stat,
) -> c_int {
    enter::<F, R, _>("getattr", path, |instance, path| {
        let stat = instance.fs.getattr(path)?;
        write_out(&stat, stbuf)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn readlink<F: FileSystem, R: Runtime>(
    path: *const c_char,
    buf: *mut c_char,
    size: usize,
) -> c_int {
    enter::<F, R, _>("readlink", path, |instance, path| {
        if size <= 1 {
            return Err(Errno::Inval.into());
        }
        let target = instance.fs.readlink(path)?;
        let bytes = target.as_os_str().as_bytes();
        if memchr(0, bytes).is_some() || !copy_with_nul(bytes, buf, size) {
            return Err(Errno::Inval.into());
        }
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn mknod<F: FileSystem, R: Runtime>(
    path: *const c_char,
    mode: mode_t,
    rdev: dev_t,
) -> c_int {
    enter::<F, R, _>("mknod", path, |instance, path| {
        let mode = Mode::decode(&mode)?;
        instance.fs.mknod(path, mode, widen(rdev, "rdev")?)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn mkdir<F: FileSystem, R: Runtime>(
    path: *const c_char,
    mode: mode_t,
) -> c_int {
    enter::<F, R, _>("mkdir", path, |instance, path| {
        instance.fs.mkdir(path, Mode::decode(&mode)?)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn unlink<F: FileSystem, R: Runtime>(path: *const c_char) -> c_int {
    enter::<F, R, _>("unlink", path, |instance, path| {
        instance.fs.unlink(path)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn rmdir<F: FileSystem, R: Runtime>(path: *const c_char) -> c_int {
    enter::<F, R, _>("rmdir", path, |instance, path| {
        instance.fs.rmdir(path)?;
        Ok(0)
    })
}

/// `from` is the link target, `to` the link being created
pub(crate) unsafe extern "C" fn symlink<F: FileSystem, R: Runtime>(
    from: *const c_char,
    to: *const c_char,
) -> c_int {
    enter::<F, R, _>("symlink", to, |instance, link| {
        let target = c_str::path(from)?;
        instance.fs.symlink(target, link)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn rename<F: FileSystem, R: Runtime>(
    from: *const c_char,
    to: *const c_char,
) -> c_int {
    enter::<F, R, _>("rename", from, |instance, from| {
        instance.fs.rename(from, c_str::path(to)?)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn link<F: FileSystem, R: Runtime>(
    from: *const c_char,
    to: *const c_char,
) -> c_int {
    enter::<F, R, _>("link", from, |instance, from| {
        instance.fs.link(from, c_str::path(to)?)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn chmod<F: FileSystem, R: Runtime>(
    path: *const c_char,
    mode: mode_t,
) -> c_int {
    enter::<F, R, _>("chmod", path, |instance, path| {
        instance.fs.chmod(path, Mode::decode(&mode)?)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn chown<F: FileSystem, R: Runtime>(
    path: *const c_char,
    uid: uid_t,
    gid: gid_t,
) -> c_int {
    enter::<F, R, _>("chown", path, |instance, path| {
        // (uid_t)-1 and (gid_t)-1 leave the id unchanged
        let uid = if uid == uid_t::MAX { None } else { Some(uid) };
        let gid = if gid == gid_t::MAX { None } else { Some(gid) };
        instance.fs.chown(path, uid, gid)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn truncate<F: FileSystem, R: Runtime>(
    path: *const c_char,
    size: off_t,
) -> c_int {
    enter::<F, R, _>("truncate", path, |instance, path| {
        instance.fs.truncate(path, widen(size, "size")?)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn utime<F: FileSystem, R: Runtime>(
    path: *const c_char,
    buf: *mut utimbuf,
) -> c_int {
    enter::<F, R, _>("utime", path, |instance, path| {
        let times = if buf.is_null() {
            None
        } else {
            Some(FileTimes::decode(native_ref(buf)?)?)
        };
        instance.fs.utime(path, times)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn open<F: FileSystem, R: Runtime>(
    path: *const c_char,
    fi: *mut fuse_file_info,
) -> c_int {
    enter::<F, R, _>("open", path, |instance, path| {
        with_handle_info(fi, |info| instance.fs.open(path, info))
    })
}

pub(crate) unsafe extern "C" fn read<F: FileSystem, R: Runtime>(
    path: *const c_char,
    buf: *mut c_char,
    size: usize,
    offset: off_t,
    fi: *mut fuse_file_info,
) -> c_int {
    enter::<F, R, _>("read", path, |instance, path| {
        let info = handle_info(fi)?;
        let buf = native_slice_mut(buf, size)?;
        let count = instance.fs.read(path, buf, widen(offset, "offset")?, &info)?;
        byte_count(count, size)
    })
}

pub(crate) unsafe extern "C" fn write<F: FileSystem, R: Runtime>(
    path: *const c_char,
    buf: *const c_char,
    size: usize,
    offset: off_t,
    fi: *mut fuse_file_info,
) -> c_int {
    enter::<F, R, _>("write", path, |instance, path| {
        let info = handle_info(fi)?;
        let buf = native_slice(buf, size)?;
        let count = instance.fs.write(path, buf, widen(offset, "offset")?, &info)?;
        byte_count(count, size)
    })
}

pub(crate) unsafe extern "C" fn statfs<F: FileSystem, R: Runtime>(
    path: *const c_char,
    stbuf: *mut statvfs,
) -> c_int {
    enter::<F, R, _>("statfs", path, |instance, path| {
        let stat = instance.fs.statfs(path)?;
        write_out(&stat, stbuf)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn flush<F: FileSystem, R: Runtime>(
    path: *const c_char,
    fi: *mut fuse_file_info,
) -> c_int {
    enter::<F, R, _>("flush", path, |instance, path| {
        instance.fs.flush(path, &handle_info(fi)?)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn release<F: FileSystem, R: Runtime>(
    path: *const c_char,
    fi: *mut fuse_file_info,
) -> c_int {
    enter::<F, R, _>("release", path, |instance, path| {
        instance.fs.release(path, &handle_info(fi)?)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn fsync<F: FileSystem, R: Runtime>(
    path: *const c_char,
    datasync: c_int,
    fi: *mut fuse_file_info,
) -> c_int {
    enter::<F, R, _>("fsync", path, |instance, path| {
        instance.fs.fsync(path, datasync != 0, &handle_info(fi)?)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn setxattr<F: FileSystem, R: Runtime>(
    path: *const c_char,
    name: *const c_char,
    value: *const c_char,
    size: usize,
    flags: c_int,
) -> c_int {
    enter::<F, R, _>("setxattr", path, |instance, path| {
        let name = c_str::os_str(name)?;
        let value = native_slice(value, size)?;
        let flags = XattrFlags::decode(&flags)?;
        instance.fs.setxattr(path, name, value, flags)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn getxattr<F: FileSystem, R: Runtime>(
    path: *const c_char,
    name: *const c_char,
    value: *mut c_char,
    size: usize,
) -> c_int {
    enter::<F, R, _>("getxattr", path, |instance, path| {
        let name = c_str::os_str(name)?;
        let data = instance.fs.getxattr(path, name)?;
        reply_sized(&data, value, size)
    })
}

pub(crate) unsafe extern "C" fn listxattr<F: FileSystem, R: Runtime>(
    path: *const c_char,
    list: *mut c_char,
    size: usize,
) -> c_int {
    enter::<F, R, _>("listxattr", path, |instance, path| {
        let names = instance.fs.listxattr(path)?;
        let data = join_with_nul(names.iter().map(|name| name.as_bytes()))
            .map_err(|_| Failure::Internal("xattr name contains a nul byte"))?;
        reply_sized(&data, list, size)
    })
}

pub(crate) unsafe extern "C" fn removexattr<F: FileSystem, R: Runtime>(
    path: *const c_char,
    name: *const c_char,
) -> c_int {
    enter::<F, R, _>("removexattr", path, |instance, path| {
        instance.fs.removexattr(path, c_str::os_str(name)?)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn opendir<F: FileSystem, R: Runtime>(
    path: *const c_char,
    fi: *mut fuse_file_info,
) -> c_int {
    enter::<F, R, _>("opendir", path, |instance, path| {
        if instance.operations.contains(Operations::OPENDIR) {
            let _ = with_handle_info(fi, |info| instance.fs.opendir(path, info))?;
        }
        let raw = native_mut(fi)?;
        raw.fh = instance.cursors.open_directory(raw.fh);
        trace!(handle = raw.fh, "directory opened");
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn readdir<F: FileSystem, R: Runtime>(
    path: *const c_char,
    buf: *mut c_void,
    filler: fuse_fill_dir_t,
    offset: off_t,
    fi: *mut fuse_file_info,
) -> c_int {
    enter::<F, R, _>("readdir", path, |instance, path| {
        let (handle, info) = directory_info(instance, fi)?;
        let filled = instance.cursors.stream(
            widen(offset, "offset")?,
            handle,
            || instance.fs.readdir(path, &info),
            |entry, off| fill_entry(filler, buf, entry, off),
        )?;
        trace!(filled, "directory entries filled");
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn releasedir<F: FileSystem, R: Runtime>(
    path: *const c_char,
    fi: *mut fuse_file_info,
) -> c_int {
    enter::<F, R, _>("releasedir", path, |instance, path| {
        let raw = native_ref(fi)?;
        let (fs_handle, released) = instance.cursors.close_directory(raw.fh);
        if released != 0 {
            trace!(released, "released unfinished directory cursors");
        }
        if instance.operations.contains(Operations::RELEASEDIR) {
            let mut info = OpenedHandleInfo::decode(raw)?;
            info.handle = fs_handle.unwrap_or(raw.fh);
            instance.fs.releasedir(path, &info)?;
        }
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn fsyncdir<F: FileSystem, R: Runtime>(
    path: *const c_char,
    datasync: c_int,
    fi: *mut fuse_file_info,
) -> c_int {
    enter::<F, R, _>("fsyncdir", path, |instance, path| {
        let (_, info) = directory_info(instance, fi)?;
        instance.fs.fsyncdir(path, datasync != 0, &info)?;
        Ok(0)
    })
}

/// Runs [`FileSystem::init`]
///
/// libfuse replaces `private_data` with the return value, so the instance
/// pointer is handed back unchanged.
pub(crate) unsafe extern "C" fn init<F: FileSystem, R: Runtime>(
    _conn: *mut fuse_conn_info,
) -> *mut c_void {
    let cx = match R::context() {
        Some(cx) => cx,
        None => {
            error!("init called without a fuse context");
            return ptr::null_mut();
        }
    };
    if let Some(instance) = cx.private_data.cast::<Instance<F>>().as_ref() {
        if !instance.is_torn_down() {
            let _cx = CallContext::new(cx.uid, cx.gid, cx.pid, instance.session.clone()).enter();
            debug!("initializing file system");
            let _ = contain("init", Path::new(""), || instance.fs.init());
        }
    }
    cx.private_data
}

pub(crate) unsafe extern "C" fn destroy<F: FileSystem>(private_data: *mut c_void) {
    if let Some(instance) = private_data.cast::<Instance<F>>().as_ref() {
        instance.finish();
    }
}

pub(crate) unsafe extern "C" fn access<F: FileSystem, R: Runtime>(
    path: *const c_char,
    mask: c_int,
) -> c_int {
    enter::<F, R, _>("access", path, |instance, path| {
        instance.fs.access(path, AccessModes::decode(&mask)?)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn create<F: FileSystem, R: Runtime>(
    path: *const c_char,
    mode: mode_t,
    fi: *mut fuse_file_info,
) -> c_int {
    enter::<F, R, _>("create", path, |instance, path| {
        let mode = Mode::decode(&mode)?;
        with_handle_info(fi, |info| instance.fs.create(path, mode, info))
    })
}

pub(crate) unsafe extern "C" fn ftruncate<F: FileSystem, R: Runtime>(
    path: *const c_char,
    size: off_t,
    fi: *mut fuse_file_info,
) -> c_int {
    enter::<F, R, _>("ftruncate", path, |instance, path| {
        let info = handle_info(fi)?;
        instance.fs.ftruncate(path, widen(size, "size")?, &info)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn fgetattr<F: FileSystem, R: Runtime>(
    path: *const c_char,
    stbuf: *mut stat,
    fi: *mut fuse_file_info,
) -> c_int {
    enter::<F, R, _>("fgetattr", path, |instance, path| {
        let stat = instance.fs.fgetattr(path, &handle_info(fi)?)?;
        write_out(&stat, stbuf)?;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn lock<F: FileSystem, R: Runtime>(
    path: *const c_char,
    fi: *mut fuse_file_info,
    cmd: c_int,
    lock: *mut flock,
) -> c_int {
    enter::<F, R, _>("lock", path, |instance, path| {
        let info = handle_info(fi)?;
        let cmd = LockCommand::decode(&cmd)?;
        let raw = native_mut(lock)?;
        let mut record = RecordLock::decode(raw)?;
        instance.fs.lock(path, &info, cmd, &mut record)?;
        let mut out = *raw;
        record.encode(&mut out)?;
        *raw = out;
        Ok(0)
    })
}

pub(crate) unsafe extern "C" fn bmap<F: FileSystem, R: Runtime>(
    path: *const c_char,
    block_size: usize,
    idx: *mut u64,
) -> c_int {
    enter::<F, R, _>("bmap", path, |instance, path| {
        let idx = native_mut(idx)?;
        *idx = instance.fs.bmap(path, block_size, *idx)?;
        Ok(0)
    })
}
