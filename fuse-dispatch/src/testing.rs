//! A scripted stand-in for libfuse
//!
//! [`MockRuntime`] records the life cycle calls of a session and drives the
//! operation table the way libfuse does. [`Harness`] drives a table without
//! a session.

use crate::abi_marker::zeroed;
use crate::dispatch::Instance;
use crate::fs::FileSystem;
use crate::kernel::{fuse, fuse_args, fuse_chan, fuse_context, fuse_file_info, fuse_operations};
use crate::ops::OperationTable;
use crate::runtime::Runtime;
use crate::session::SessionHandle;

use std::cell::Cell;
use std::convert::TryFrom;
use std::ffi::{CStr, CString};
use std::io;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use libc::off_t;

thread_local! {
    static CONTEXT: Cell<Option<fuse_context>> = Cell::new(None);
}

/// Sets the context returned by [`MockRuntime::context`] on this thread
pub(crate) fn set_context(cx: Option<fuse_context>) {
    CONTEXT.with(|slot| slot.set(cx));
}

/// A recorded runtime call
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Mount(String),
    Create(Vec<String>),
    Loop { multithreaded: bool },
    Exit,
    Unmount(String),
    Destroy,
    FreeArgs,
}

type Script = Box<dyn FnOnce(&Driver) + Send>;

#[derive(Default)]
struct MockState {
    calls: Mutex<Vec<Call>>,
    fail_mount: AtomicBool,
    fail_create: AtomicBool,
    script: Mutex<Option<Script>>,
    /// the table and user data passed to `create`
    created: Mutex<Option<(fuse_operations, usize)>>,
}

impl MockState {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn driver(&self) -> Option<Driver> {
        let created = *self.created.lock().unwrap();
        created.map(|(ops, user_data)| Driver {
            ops,
            user_data: user_data as *mut c_void,
        })
    }
}

#[derive(Clone, Default)]
pub(crate) struct MockRuntime {
    state: Arc<MockState>,
}

impl MockRuntime {
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.calls.lock().unwrap().clone()
    }

    pub(crate) fn fail_mount(&self, fail: bool) {
        self.state.fail_mount.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_create(&self, fail: bool) {
        self.state.fail_create.store(fail, Ordering::SeqCst);
    }

    /// Runs `script` inside the next event loop, after `init`
    pub(crate) fn script(&self, script: impl FnOnce(&Driver) + Send + 'static) {
        *self.state.script.lock().unwrap() = Some(Box::new(script));
    }

    /// The native handles are the address of the shared state
    fn fake<T>(&self) -> NonNull<T> {
        NonNull::from(&*self.state).cast()
    }
}

unsafe fn read_args(args: &fuse_args) -> Vec<String> {
    let argc = usize::try_from(args.argc).unwrap();
    (0..argc)
        .map(|i| {
            CStr::from_ptr(*args.argv.add(i))
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

impl Runtime for MockRuntime {
    fn context() -> Option<fuse_context> {
        CONTEXT.with(Cell::get)
    }

    unsafe fn exit(fuse: NonNull<fuse>) {
        let state = &*fuse.as_ptr().cast::<MockState>();
        state.record(Call::Exit);
    }

    fn mount(&self, mount_point: &CStr, _: &mut fuse_args) -> io::Result<NonNull<fuse_chan>> {
        self.state
            .record(Call::Mount(mount_point.to_string_lossy().into_owned()));
        if self.state.fail_mount.load(Ordering::SeqCst) {
            return Err(io::Error::from_raw_os_error(libc::ENOENT));
        }
        Ok(self.fake())
    }

    unsafe fn create(
        &self,
        _: NonNull<fuse_chan>,
        args: &mut fuse_args,
        operations: &fuse_operations,
        user_data: *mut c_void,
    ) -> io::Result<NonNull<fuse>> {
        self.state.record(Call::Create(read_args(args)));
        if self.state.fail_create.load(Ordering::SeqCst) {
            return Err(io::Error::from_raw_os_error(libc::EIO));
        }
        *self.state.created.lock().unwrap() = Some((*operations, user_data as usize));
        Ok(self.fake())
    }

    unsafe fn run_loop(&self, _: NonNull<fuse>, multithreaded: bool) -> io::Result<()> {
        self.state.record(Call::Loop { multithreaded });
        if let Some(driver) = self.state.driver() {
            let _ = driver.init();
            let script = self.state.script.lock().unwrap().take();
            if let Some(script) = script {
                script(&driver);
            }
        }
        Ok(())
    }

    unsafe fn unmount(&self, mount_point: &CStr, _: NonNull<fuse_chan>) {
        self.state
            .record(Call::Unmount(mount_point.to_string_lossy().into_owned()));
    }

    unsafe fn destroy(&self, _: NonNull<fuse>) {
        self.state.record(Call::Destroy);
        if let Some(driver) = self.state.driver() {
            driver.destroy();
        }
    }

    unsafe fn free_args(&self, _: &mut fuse_args) {
        self.state.record(Call::FreeArgs);
    }
}

/// An instance and its table, driven without a session
pub(crate) struct Harness<F: FileSystem> {
    instance: Box<Instance<F>>,
    table: OperationTable,
}

impl<F: FileSystem> Harness<F> {
    pub(crate) fn new(fs: F) -> Self {
        let table = OperationTable::build::<F, MockRuntime>(fs.operations()).unwrap();
        let instance = Box::new(Instance::new(fs, SessionHandle::detached()));
        Self { instance, table }
    }

    pub(crate) fn instance(&self) -> &Instance<F> {
        &self.instance
    }

    pub(crate) fn driver(&self) -> Driver {
        Driver {
            ops: *self.table.as_raw(),
            user_data: self.instance.as_user_data(),
        }
    }
}

/// An entry added by the fill callback of [`Driver::readdir`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FilledEntry {
    pub(crate) name: String,
    pub(crate) offset: i64,
    pub(crate) mode: Option<libc::mode_t>,
}

struct FillBuffer {
    capacity: usize,
    entries: Vec<FilledEntry>,
}

unsafe extern "C" fn fill(
    buf: *mut c_void,
    name: *const c_char,
    stbuf: *const libc::stat,
    off: off_t,
) -> c_int {
    let buffer = &mut *buf.cast::<FillBuffer>();
    if buffer.entries.len() >= buffer.capacity {
        return 1;
    }
    buffer.entries.push(FilledEntry {
        name: CStr::from_ptr(name).to_string_lossy().into_owned(),
        offset: i64::from(off),
        mode: stbuf.as_ref().map(|st| st.st_mode),
    });
    0
}

/// Calls a slot the way libfuse does, or returns `-ENOSYS` when unbound
macro_rules! call {
    ($driver:expr, $slot:ident($($arg:expr),*)) => {
        match $driver.ops.$slot {
            Some(f) => {
                $driver.enter();
                unsafe { f($($arg),*) }
            }
            None => -libc::ENOSYS,
        }
    };
}

fn c_path(path: &str) -> CString {
    CString::new(path).unwrap()
}

/// Invokes the bound slots of a table as caller uid 1000, gid 1000, pid 42
pub(crate) struct Driver {
    ops: fuse_operations,
    user_data: *mut c_void,
}

unsafe impl Send for Driver {}
unsafe impl Sync for Driver {}

impl Driver {
    fn enter(&self) {
        set_context(Some(fuse_context {
            fuse: ptr::null_mut(),
            uid: 1000,
            gid: 1000,
            pid: 42,
            private_data: self.user_data,
        }));
    }

    pub(crate) fn init(&self) -> *mut c_void {
        match self.ops.init {
            Some(f) => {
                self.enter();
                unsafe { f(ptr::null_mut()) }
            }
            None => ptr::null_mut(),
        }
    }

    pub(crate) fn destroy(&self) {
        if let Some(f) = self.ops.destroy {
            unsafe { f(self.user_data) }
        }
    }

    pub(crate) fn getattr(&self, path: &str) -> (c_int, libc::stat) {
        let path = c_path(path);
        let mut st = zeroed::<libc::stat>();
        let ret = call!(self, getattr(path.as_ptr(), &mut st));
        (ret, st)
    }

    pub(crate) fn unlink(&self, path: &str) -> c_int {
        let path = c_path(path);
        call!(self, unlink(path.as_ptr()))
    }

    pub(crate) fn chown(&self, path: &str, uid: libc::uid_t, gid: libc::gid_t) -> c_int {
        let path = c_path(path);
        call!(self, chown(path.as_ptr(), uid, gid))
    }

    /// The buffer starts filled with `0xff`
    pub(crate) fn readlink(&self, path: &str, size: usize) -> (c_int, Vec<u8>) {
        let path = c_path(path);
        let mut buf = vec![0xff_u8; size];
        let ret = call!(self, readlink(path.as_ptr(), buf.as_mut_ptr().cast(), size));
        (ret, buf)
    }

    pub(crate) fn open(&self, path: &str, flags: c_int) -> (c_int, fuse_file_info) {
        let path = c_path(path);
        let mut fi = zeroed::<fuse_file_info>();
        fi.flags = flags;
        let ret = call!(self, open(path.as_ptr(), &mut fi));
        (ret, fi)
    }

    pub(crate) fn read(
        &self,
        path: &str,
        size: usize,
        offset: off_t,
        fi: &fuse_file_info,
    ) -> (c_int, Vec<u8>) {
        let path = c_path(path);
        let mut buf = vec![0_u8; size];
        let mut fi = *fi;
        let ret = call!(
            self,
            read(path.as_ptr(), buf.as_mut_ptr().cast(), size, offset, &mut fi)
        );
        (ret, buf)
    }

    /// The buffer starts filled with `0xff`
    pub(crate) fn getxattr(&self, path: &str, name: &str, size: usize) -> (c_int, Vec<u8>) {
        let path = c_path(path);
        let name = c_path(name);
        let mut buf = vec![0xff_u8; size];
        let ret = call!(
            self,
            getxattr(path.as_ptr(), name.as_ptr(), buf.as_mut_ptr().cast(), size)
        );
        (ret, buf)
    }

    pub(crate) fn listxattr(&self, path: &str, size: usize) -> (c_int, Vec<u8>) {
        let path = c_path(path);
        let mut buf = vec![0xff_u8; size];
        let ret = call!(self, listxattr(path.as_ptr(), buf.as_mut_ptr().cast(), size));
        (ret, buf)
    }

    pub(crate) fn opendir(&self, path: &str) -> (c_int, fuse_file_info) {
        let path = c_path(path);
        let mut fi = zeroed::<fuse_file_info>();
        fi.flags = libc::O_RDONLY | libc::O_DIRECTORY;
        let ret = call!(self, opendir(path.as_ptr(), &mut fi));
        (ret, fi)
    }

    /// Reads with a buffer of `capacity` entries
    pub(crate) fn readdir(
        &self,
        path: &str,
        offset: i64,
        capacity: usize,
        fi: &fuse_file_info,
    ) -> (c_int, Vec<FilledEntry>) {
        let path = c_path(path);
        let mut buffer = FillBuffer {
            capacity,
            entries: Vec::new(),
        };
        let mut fi = *fi;
        let buf: *mut FillBuffer = &mut buffer;
        let ret = call!(
            self,
            readdir(path.as_ptr(), buf.cast(), fill, offset as off_t, &mut fi)
        );
        (ret, buffer.entries)
    }

    pub(crate) fn releasedir(&self, path: &str, fi: &fuse_file_info) -> c_int {
        let path = c_path(path);
        let mut fi = *fi;
        call!(self, releasedir(path.as_ptr(), &mut fi))
    }
}
