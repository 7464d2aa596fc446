//! Mounting and running a file system

use crate::dispatch::Instance;
use crate::error::Error;
use crate::fs::FileSystem;
use crate::kernel::{fuse, fuse_chan};
use crate::ops::OperationTable;
use crate::options::MountOptions;
use crate::runtime::{NativeArgs, Runtime};
use crate::utils::c_str::to_c_string;

use std::ffi::CString;
use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use blocking::unblock;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct FusePtr(NonNull<fuse>);

// SAFETY: libfuse allows `fuse_exit` from any thread
unsafe impl Send for FusePtr {}

struct HandleState {
    fuse: Mutex<Option<FusePtr>>,
    exit: Option<unsafe fn(NonNull<fuse>)>,
    stop_requested: AtomicBool,
}

/// A handle to request the unmount of a running session
///
/// Handed to operations through [`CallContext::session`](crate::CallContext::session).
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<HandleState>,
}

impl fmt::Debug for SessionHandle {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("stop_requested", &self.is_stop_requested())
            .finish()
    }
}

impl SessionHandle {
    pub(crate) fn new<R: Runtime>() -> Self {
        Self::with_exit(Some(R::exit))
    }

    /// A handle of no runtime, for driving an instance directly
    pub(crate) fn detached() -> Self {
        Self::with_exit(None)
    }

    fn with_exit(exit: Option<unsafe fn(NonNull<fuse>)>) -> Self {
        Self {
            state: Arc::new(HandleState {
                fuse: Mutex::new(None),
                exit,
                stop_requested: AtomicBool::new(false),
            }),
        }
    }

    /// Asks the event loop to return
    ///
    /// Returns `false` when the session has already been asked to stop. A
    /// stop requested before the loop starts ends it right away.
    #[inline]
    pub fn stop(&self) -> bool {
        if self.state.stop_requested.swap(true, Ordering::SeqCst) {
            return false;
        }
        debug!("stop requested");
        let fuse = self
            .state
            .fuse
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let (Some(fuse), Some(exit)) = (*fuse, self.state.exit) {
            // SAFETY: attached pointers stay live until detached, which
            // takes the same lock
            unsafe { exit(fuse.0) };
        }
        true
    }

    /// Whether [`SessionHandle::stop`] was called
    #[must_use]
    #[inline]
    pub fn is_stop_requested(&self) -> bool {
        self.state.stop_requested.load(Ordering::SeqCst)
    }

    fn attach(&self, fuse: NonNull<fuse>) {
        let mut slot = self
            .state
            .fuse
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(FusePtr(fuse));
        if self.is_stop_requested() {
            if let Some(exit) = self.state.exit {
                // SAFETY: `fuse` was just created
                unsafe { exit(fuse) };
            }
        }
    }

    fn detach(&self) {
        let mut slot = self
            .state
            .fuse
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }
}

struct Mounted<F> {
    instance: Box<Instance<F>>,
    table: Box<OperationTable>,
    mount_point: CString,
    chan: NonNull<fuse_chan>,
    fuse: NonNull<fuse>,
    args: NativeArgs,
}

/// A file system session on a libfuse runtime
///
/// The life cycle is [`Session::new`], [`Session::start`] (blocks until the
/// file system is unmounted or stopped) and [`Session::dispose`], which also
/// runs on drop.
pub struct Session<F: FileSystem, R: Runtime> {
    mount_point: PathBuf,
    options: MountOptions,
    multithreaded: bool,
    runtime: R,
    fs: Option<F>,
    handle: SessionHandle,
    mounted: Option<Mounted<F>>,
    disposed: bool,
}

// SAFETY: the native pointers are only used by the thread owning the session
unsafe impl<F: FileSystem, R: Runtime> Send for Session<F, R> {}

impl<F: FileSystem, R: Runtime> fmt::Debug for Session<F, R> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("mount_point", &self.mount_point)
            .field("options", &self.options)
            .field("multithreaded", &self.multithreaded)
            .field("mounted", &self.mounted.is_some())
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl<F: FileSystem, R: Runtime> Session<F, R> {
    /// Creates a session serving `fs` at `mount_point`
    #[inline]
    pub fn new(mount_point: impl Into<PathBuf>, fs: F, runtime: R) -> Self {
        Self {
            mount_point: mount_point.into(),
            options: MountOptions::new(),
            multithreaded: true,
            runtime,
            fs: Some(fs),
            handle: SessionHandle::new::<R>(),
            mounted: None,
            disposed: false,
        }
    }

    /// The mount point
    #[must_use]
    #[inline]
    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    /// The mount options
    #[must_use]
    #[inline]
    pub fn options(&self) -> &MountOptions {
        &self.options
    }

    /// The mount options, to be changed before [`Session::start`]
    #[inline]
    pub fn options_mut(&mut self) -> &mut MountOptions {
        &mut self.options
    }

    /// Replaces the mount options
    #[inline]
    pub fn set_options(&mut self, options: MountOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Chooses between `fuse_loop_mt` (default) and `fuse_loop`
    #[inline]
    pub fn set_multithreaded(&mut self, multithreaded: bool) -> &mut Self {
        self.multithreaded = multithreaded;
        self
    }

    /// A handle to stop the session from another thread
    #[must_use]
    #[inline]
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Asks the event loop to return
    #[inline]
    pub fn stop(&self) -> bool {
        self.handle.stop()
    }

    /// Mounts the file system and runs the event loop until it returns
    ///
    /// # Errors
    /// + [`Error::AlreadyStarted`] when called twice
    /// + [`Error::InvalidOperations`] when the declared operations are
    ///   inconsistent; nothing is mounted then
    /// + [`Error::Mount`], [`Error::Register`] or [`Error::Loop`] when the
    ///   runtime fails
    #[inline]
    pub fn start(&mut self) -> Result<(), Error> {
        if self.disposed || self.mounted.is_some() {
            return Err(Error::AlreadyStarted);
        }
        let operations = match self.fs {
            Some(ref fs) => fs.operations(),
            None => return Err(Error::AlreadyStarted),
        };

        let table = Box::new(OperationTable::build::<F, R>(operations)?);
        let mount_point = to_c_string(self.mount_point.as_os_str().as_bytes())?;
        let program = env!("CARGO_PKG_NAME");
        let mut args = NativeArgs::new(self.options.to_argv(program))?;
        debug!(?args, mount_point = %self.mount_point.display(), "mounting");

        let chan = self
            .runtime
            .mount(&mount_point, args.as_raw_mut())
            .map_err(|source| Error::Mount {
                mount_point: self.mount_point.clone(),
                source,
            })?;

        let fs = match self.fs.take() {
            Some(fs) => fs,
            None => return Err(Error::AlreadyStarted),
        };
        let instance = Box::new(Instance::new(fs, self.handle.clone()));

        // SAFETY: the table and the instance are boxed and outlive the
        // native instance, which is destroyed in `dispose`
        let created = unsafe {
            self.runtime.create(
                chan,
                args.as_raw_mut(),
                table.as_raw(),
                instance.as_user_data(),
            )
        };
        let fuse = match created {
            Ok(fuse) => fuse,
            Err(err) => {
                // SAFETY: `chan` is mounted and not used afterwards
                unsafe {
                    self.runtime.unmount(&mount_point, chan);
                    self.runtime.free_args(args.as_raw_mut());
                }
                self.fs = Some(instance.into_fs());
                return Err(Error::Register(err));
            }
        };

        self.handle.attach(fuse);
        self.mounted = Some(Mounted {
            instance,
            table,
            mount_point,
            chan,
            fuse,
            args,
        });

        debug!(multithreaded = self.multithreaded, "entering event loop");
        // SAFETY: `fuse` stays live until `dispose`
        let ret = unsafe { self.runtime.run_loop(fuse, self.multithreaded) };
        debug!("event loop returned");
        ret.map_err(Error::Loop)
    }

    /// Runs [`Session::start`] on the blocking thread pool
    ///
    /// The session is handed back for [`Session::dispose`].
    #[inline]
    pub async fn start_async(mut self) -> (Self, Result<(), Error>) {
        unblock(move || {
            let ret = self.start();
            (self, ret)
        })
        .await
    }

    /// Unmounts and releases every native resource
    ///
    /// Calling it again does nothing.
    #[inline]
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        if let Some(mut mounted) = self.mounted.take() {
            debug!(mount_point = %self.mount_point.display(), "disposing session");
            self.handle.detach();
            mounted.instance.tear_down();
            // SAFETY: created by this runtime in `start` and released once
            unsafe {
                self.runtime.unmount(&mounted.mount_point, mounted.chan);
                self.runtime.destroy(mounted.fuse);
                self.runtime.free_args(mounted.args.as_raw_mut());
            }
            mounted.instance.finish();
            drop(mounted.table);
        }
    }
}

impl<F: FileSystem, R: Runtime> Drop for Session<F, R> {
    #[inline]
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CallContext;
    use crate::errno::Errno;
    use crate::fs::Operations;
    use crate::testing::{Call, MockRuntime};
    use crate::types::{FileStat, Permissions};

    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counting {
        inits: AtomicUsize,
        destroys: Arc<AtomicUsize>,
        operations: Operations,
    }

    impl FileSystem for Counting {
        fn operations(&self) -> Operations {
            self.operations
        }

        fn getattr(&self, _: &Path) -> Result<FileStat, Errno> {
            let _ = CallContext::current().unwrap().session().stop();
            Ok(FileStat::directory(Permissions::from_octal(0o755)))
        }

        fn init(&self) {
            let _ = self.inits.fetch_add(1, Ordering::SeqCst);
        }

        fn destroy(&self) {
            let _ = self.destroys.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting(operations: Operations) -> Counting {
        Counting {
            operations,
            ..Counting::default()
        }
    }

    fn session(fs: Counting, runtime: &MockRuntime) -> Session<Counting, MockRuntime> {
        let mut session = Session::new("/mnt/test", fs, runtime.clone());
        let _ = session.options_mut().set_fsname("test");
        session
    }

    #[test]
    fn lifecycle_order() {
        let runtime = MockRuntime::default();
        let mut session = session(counting(Operations::GETATTR), &runtime);
        let _ = session.set_multithreaded(false);

        session.start().unwrap();
        session.dispose();
        session.dispose();

        assert_eq!(
            runtime.calls(),
            [
                Call::Mount(String::from("/mnt/test")),
                Call::Create(vec![
                    String::from("fuse-dispatch"),
                    String::from("-ofsname=test")
                ]),
                Call::Loop {
                    multithreaded: false
                },
                Call::Unmount(String::from("/mnt/test")),
                Call::Destroy,
                Call::FreeArgs,
            ]
        );
        assert!(matches!(session.start(), Err(Error::AlreadyStarted)));
    }

    #[test]
    fn init_and_destroy_run_once() {
        let runtime = MockRuntime::default();
        let fs = counting(Operations::GETATTR);
        let destroys = Arc::clone(&fs.destroys);
        let mut session = session(fs, &runtime);
        session.start().unwrap();

        let instance = &session.mounted.as_ref().unwrap().instance;
        assert_eq!(instance.fs().inits.load(Ordering::SeqCst), 1);
        assert_eq!(destroys.load(Ordering::SeqCst), 0);

        session.dispose();
        drop(session);
        assert_eq!(destroys.load(Ordering::SeqCst), 1);
        assert_eq!(runtime.calls().last(), Some(&Call::FreeArgs));
    }

    #[test]
    fn invalid_table_is_never_mounted() {
        let runtime = MockRuntime::default();
        let mut session = session(counting(Operations::OPENDIR), &runtime);
        assert!(matches!(
            session.start(),
            Err(Error::InvalidOperations {
                operation: "opendir",
                requires: "releasedir"
            })
        ));
        assert!(runtime.calls().is_empty());
    }

    #[test]
    fn mount_failure_keeps_fs() {
        let runtime = MockRuntime::default();
        runtime.fail_mount(true);
        let mut session = session(counting(Operations::GETATTR), &runtime);
        assert!(matches!(session.start(), Err(Error::Mount { .. })));
        assert!(session.fs.is_some());

        runtime.fail_mount(false);
        session.start().unwrap();
        assert!(session.mounted.is_some());
    }

    #[test]
    fn register_failure_unmounts() {
        let runtime = MockRuntime::default();
        runtime.fail_create(true);
        let mut session = session(counting(Operations::GETATTR), &runtime);
        assert!(matches!(session.start(), Err(Error::Register(_))));
        assert!(session.fs.is_some());
        assert_eq!(
            runtime.calls()[2..],
            [Call::Unmount(String::from("/mnt/test")), Call::FreeArgs]
        );
    }

    #[test]
    fn stop_from_handler() {
        let runtime = MockRuntime::default();
        runtime.script(|driver| {
            let (ret, _) = driver.getattr("/");
            assert_eq!(ret, 0);
        });
        let mut session = session(counting(Operations::GETATTR), &runtime);
        let handle = session.handle();
        session.start().unwrap();

        assert!(handle.is_stop_requested());
        assert!(!handle.stop());
        assert!(runtime.calls().contains(&Call::Exit));
    }

    #[test]
    fn stop_before_start() {
        let runtime = MockRuntime::default();
        let mut session = session(counting(Operations::GETATTR), &runtime);
        assert!(session.stop());
        session.start().unwrap();
        assert_eq!(
            runtime.calls()[2..4],
            [
                Call::Exit,
                Call::Loop {
                    multithreaded: true
                }
            ]
        );
    }

    #[test]
    fn drop_disposes() {
        let runtime = MockRuntime::default();
        {
            let mut session = session(counting(Operations::GETATTR), &runtime);
            session.start().unwrap();
        }
        assert!(runtime.calls().contains(&Call::Destroy));
    }

    #[test]
    fn start_on_thread_pool() {
        let runtime = MockRuntime::default();
        let session = session(counting(Operations::GETATTR), &runtime);
        let (mut session, ret) = futures::executor::block_on(session.start_async());
        ret.unwrap();
        session.dispose();
        assert!(runtime.calls().contains(&Call::Loop {
            multithreaded: true
        }));
    }
}
