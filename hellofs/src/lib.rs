#![deny(
    single_use_lifetimes,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    variant_size_differences,

    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    // clippy::cargo
)]
#![allow(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    clippy::missing_docs_in_private_items,
    clippy::missing_errors_doc
)]

use fuse_dispatch::{
    AccessMode, DirectoryEntries, DirectoryEntry, Errno, FileStat, FileSystem, OpenedHandleInfo,
    Operations, Permissions, XattrFlags,
};

use std::collections::HashMap;
use std::convert::TryFrom;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;

const HELLO_PATH: &str = "/hello";
const HELLO_CONTENT: &[u8] = b"Hello World!\n";

const DATA_PATH: &str = "/data";
const DATA_SIZE: u64 = 100_000_000;

static ROOT_ENTRIES: [&str; 4] = [".", "..", "hello", "data"];

/// The byte at `pos` of `/data`
const fn data_byte(pos: u64) -> u8 {
    if pos % 27 == 0 {
        b'\n'
    } else {
        #[allow(clippy::cast_possible_truncation)]
        let letter = (pos % 26) as u8;
        b'a' + letter
    }
}

/// A read-only file system with two files
///
/// `/hello` holds a greeting and carries extended attributes, `/data` is
/// 100 MB of generated text.
pub struct HelloFs {
    uid: u32,
    gid: u32,
    xattrs: Mutex<HashMap<OsString, Vec<u8>>>,
}

impl Default for HelloFs {
    fn default() -> Self {
        Self::new()
    }
}

impl HelloFs {
    /// Creates the file system, owned by the current user
    #[must_use]
    pub fn new() -> Self {
        let mut xattrs = HashMap::new();
        let _ = xattrs.insert(OsString::from("foo"), b"bar".to_vec());
        // SAFETY: always successful
        let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
        Self {
            uid,
            gid,
            xattrs: Mutex::new(xattrs),
        }
    }

    fn xattrs(&self) -> MutexGuard<'_, HashMap<OsString, Vec<u8>>> {
        self.xattrs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn owned(&self, mut stat: FileStat) -> FileStat {
        stat.uid = self.uid;
        stat.gid = self.gid;
        stat
    }

    fn is_file(path: &Path) -> bool {
        path == Path::new(HELLO_PATH) || path == Path::new(DATA_PATH)
    }

    fn check_dir(path: &Path) -> Result<(), Errno> {
        if path == Path::new("/") {
            Ok(())
        } else if Self::is_file(path) {
            Err(Errno::NotDir)
        } else {
            Err(Errno::NoEnt)
        }
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn file_size(len: u64) -> i64 {
    len as i64
}

fn read_hello(buf: &mut [u8], offset: u64) -> usize {
    let start = match usize::try_from(offset) {
        Ok(start) if start < HELLO_CONTENT.len() => start,
        _ => return 0,
    };
    let src = &HELLO_CONTENT[start..];
    let len = src.len().min(buf.len());
    buf[..len].copy_from_slice(&src[..len]);
    len
}

fn read_data(buf: &mut [u8], offset: u64) -> usize {
    let mut len = 0;
    for (slot, pos) in buf.iter_mut().zip(offset..DATA_SIZE) {
        *slot = data_byte(pos);
        len += 1;
    }
    len
}

impl FileSystem for HelloFs {
    fn operations(&self) -> Operations {
        Operations::GETATTR
            | Operations::OPEN
            | Operations::READ
            | Operations::RELEASE
            | Operations::OPENDIR
            | Operations::READDIR
            | Operations::RELEASEDIR
            | Operations::XATTR
    }

    fn getattr(&self, path: &Path) -> Result<FileStat, Errno> {
        let read_only = Permissions::from_octal(0o444);
        let stat = if path == Path::new("/") {
            FileStat::directory(Permissions::from_octal(0o755))
        } else if path == Path::new(HELLO_PATH) {
            FileStat::regular(read_only, file_size(HELLO_CONTENT.len() as u64))
        } else if path == Path::new(DATA_PATH) {
            FileStat::regular(read_only, file_size(DATA_SIZE))
        } else {
            return Err(Errno::NoEnt);
        };
        Ok(self.owned(stat))
    }

    fn open(&self, path: &Path, info: &mut OpenedHandleInfo) -> Result<(), Errno> {
        trace!(path = %path.display(), flags = ?info.flags, "open");
        if !Self::is_file(path) {
            return Err(Errno::NoEnt);
        }
        if info.access != AccessMode::ReadOnly {
            return Err(Errno::Access);
        }
        Ok(())
    }

    fn read(
        &self,
        path: &Path,
        buf: &mut [u8],
        offset: i64,
        _: &OpenedHandleInfo,
    ) -> Result<usize, Errno> {
        let offset = u64::try_from(offset).map_err(|_| Errno::Inval)?;
        if path == Path::new(HELLO_PATH) {
            Ok(read_hello(buf, offset))
        } else if path == Path::new(DATA_PATH) {
            Ok(read_data(buf, offset))
        } else {
            Err(Errno::NoEnt)
        }
    }

    fn release(&self, _: &Path, _: &OpenedHandleInfo) -> Result<(), Errno> {
        Ok(())
    }

    fn opendir(&self, path: &Path, _: &mut OpenedHandleInfo) -> Result<(), Errno> {
        Self::check_dir(path)
    }

    fn readdir(&self, path: &Path, _: &OpenedHandleInfo) -> Result<DirectoryEntries, Errno> {
        Self::check_dir(path)?;
        Ok(Box::new(
            ROOT_ENTRIES
                .iter()
                .filter_map(|&name| DirectoryEntry::new(name).ok()),
        ))
    }

    fn releasedir(&self, _: &Path, _: &OpenedHandleInfo) -> Result<(), Errno> {
        Ok(())
    }

    fn setxattr(
        &self,
        path: &Path,
        name: &OsStr,
        value: &[u8],
        flags: XattrFlags,
    ) -> Result<(), Errno> {
        if path != Path::new(HELLO_PATH) {
            return Err(Errno::NoSpc);
        }
        let mut xattrs = self.xattrs();
        let exists = xattrs.contains_key(name);
        if flags.contains(XattrFlags::CREATE) && exists {
            return Err(Errno::Exist);
        }
        if flags.contains(XattrFlags::REPLACE) && !exists {
            return Err(Errno::NoAttr);
        }
        let _ = xattrs.insert(name.to_owned(), value.to_vec());
        Ok(())
    }

    fn getxattr(&self, path: &Path, name: &OsStr) -> Result<Vec<u8>, Errno> {
        if path != Path::new(HELLO_PATH) {
            return Err(Errno::NoAttr);
        }
        self.xattrs().get(name).cloned().ok_or(Errno::NoAttr)
    }

    fn listxattr(&self, path: &Path) -> Result<Vec<OsString>, Errno> {
        if path != Path::new(HELLO_PATH) {
            return Ok(Vec::new());
        }
        let mut names: Vec<OsString> = self.xattrs().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn removexattr(&self, path: &Path, name: &OsStr) -> Result<(), Errno> {
        if path != Path::new(HELLO_PATH) {
            return Err(Errno::NoAttr);
        }
        self.xattrs().remove(name).map(drop).ok_or(Errno::NoAttr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuse_dispatch::{FileType, OperationTable};

    fn read_only() -> OpenedHandleInfo {
        OpenedHandleInfo::new(AccessMode::ReadOnly)
    }

    #[test]
    fn attributes() {
        let fs = HelloFs::new();

        let root = fs.getattr(Path::new("/")).unwrap();
        assert_eq!(root.mode.file_type, Some(FileType::Directory));
        assert_eq!(root.nlink, 2);

        let hello = fs.getattr(Path::new("/hello")).unwrap();
        assert_eq!(hello.mode.file_type, Some(FileType::Regular));
        assert_eq!(hello.mode.permissions, Permissions::from_octal(0o444));
        assert_eq!(hello.size, 13);

        assert_eq!(fs.getattr(Path::new("/data")).unwrap().size, 100_000_000);
        assert_eq!(fs.getattr(Path::new("/nope")), Err(Errno::NoEnt));
    }

    #[test]
    fn table_is_valid() {
        let fs = HelloFs::new();
        assert!(fs.operations().contains(Operations::XATTR));
        let _ = OperationTable::build::<HelloFs, Unused>(fs.operations()).unwrap();
    }

    #[test]
    fn open_read_only() {
        let fs = HelloFs::new();
        let mut info = read_only();
        assert!(fs.open(Path::new("/hello"), &mut info).is_ok());

        let mut info = OpenedHandleInfo::new(AccessMode::ReadWrite);
        assert_eq!(fs.open(Path::new("/hello"), &mut info), Err(Errno::Access));
        assert_eq!(fs.open(Path::new("/other"), &mut info), Err(Errno::NoEnt));
    }

    #[test]
    fn read_hello() {
        let fs = HelloFs::new();
        let path = Path::new("/hello");
        let mut buf = [0_u8; 64];

        let n = fs.read(path, &mut buf, 0, &read_only()).unwrap();
        assert_eq!(&buf[..n], b"Hello World!\n");

        let n = fs.read(path, &mut buf[..5], 6, &read_only()).unwrap();
        assert_eq!(&buf[..n], b"World");

        assert_eq!(fs.read(path, &mut buf, 13, &read_only()), Ok(0));
        assert_eq!(fs.read(path, &mut buf, -1, &read_only()), Err(Errno::Inval));
    }

    #[test]
    fn read_data() {
        let fs = HelloFs::new();
        let path = Path::new("/data");
        let mut buf = [0_u8; 30];

        let n = fs.read(path, &mut buf, 0, &read_only()).unwrap();
        assert_eq!(n, 30);
        assert_eq!(buf[0], b'\n');
        assert_eq!(buf[1], b'b');
        assert_eq!(buf[25], b'z');
        assert_eq!(buf[26], b'a');
        assert_eq!(buf[27], b'\n');

        let n = fs.read(path, &mut buf, 100_000_000 - 4, &read_only()).unwrap();
        assert_eq!(n, 4);
    }

    #[test]
    fn listing() {
        let fs = HelloFs::new();
        let names: Vec<OsString> = fs
            .readdir(Path::new("/"), &read_only())
            .unwrap()
            .map(|entry| entry.name().to_owned())
            .collect();
        assert_eq!(names, [".", "..", "hello", "data"]);

        assert!(matches!(
            fs.readdir(Path::new("/hello"), &read_only()),
            Err(Errno::NotDir)
        ));
        let mut info = read_only();
        assert_eq!(fs.opendir(Path::new("/x"), &mut info), Err(Errno::NoEnt));
    }

    #[test]
    fn extended_attributes() {
        let fs = HelloFs::new();
        let hello = Path::new("/hello");
        let foo = OsStr::new("foo");

        assert_eq!(fs.getxattr(hello, foo).unwrap(), b"bar");
        assert_eq!(fs.getxattr(hello, OsStr::new("x")), Err(Errno::NoAttr));

        fs.setxattr(hello, OsStr::new("user.a"), b"1", XattrFlags::empty())
            .unwrap();
        assert_eq!(
            fs.setxattr(hello, foo, b"2", XattrFlags::CREATE),
            Err(Errno::Exist)
        );
        assert_eq!(
            fs.setxattr(hello, OsStr::new("b"), b"2", XattrFlags::REPLACE),
            Err(Errno::NoAttr)
        );
        assert_eq!(fs.listxattr(hello).unwrap(), ["foo", "user.a"]);

        fs.removexattr(hello, foo).unwrap();
        assert_eq!(fs.removexattr(hello, foo), Err(Errno::NoAttr));
        assert_eq!(fs.listxattr(hello).unwrap(), ["user.a"]);

        let data = Path::new("/data");
        assert_eq!(
            fs.setxattr(data, foo, b"1", XattrFlags::empty()),
            Err(Errno::NoSpc)
        );
        assert!(fs.listxattr(data).unwrap().is_empty());
    }

    /// A runtime that is never started
    struct Unused;

    impl fuse_dispatch::Runtime for Unused {
        fn context() -> Option<fuse_dispatch::kernel::fuse_context> {
            None
        }

        unsafe fn exit(_: std::ptr::NonNull<fuse_dispatch::kernel::fuse>) {}

        fn mount(
            &self,
            _: &std::ffi::CStr,
            _: &mut fuse_dispatch::kernel::fuse_args,
        ) -> std::io::Result<std::ptr::NonNull<fuse_dispatch::kernel::fuse_chan>> {
            Err(std::io::Error::from_raw_os_error(libc::ENOSYS))
        }

        unsafe fn create(
            &self,
            _: std::ptr::NonNull<fuse_dispatch::kernel::fuse_chan>,
            _: &mut fuse_dispatch::kernel::fuse_args,
            _: &fuse_dispatch::kernel::fuse_operations,
            _: *mut std::os::raw::c_void,
        ) -> std::io::Result<std::ptr::NonNull<fuse_dispatch::kernel::fuse>> {
            Err(std::io::Error::from_raw_os_error(libc::ENOSYS))
        }

        unsafe fn run_loop(
            &self,
            _: std::ptr::NonNull<fuse_dispatch::kernel::fuse>,
            _: bool,
        ) -> std::io::Result<()> {
            Ok(())
        }

        unsafe fn unmount(
            &self,
            _: &std::ffi::CStr,
            _: std::ptr::NonNull<fuse_dispatch::kernel::fuse_chan>,
        ) {
        }

        unsafe fn destroy(&self, _: std::ptr::NonNull<fuse_dispatch::kernel::fuse>) {}
    }
}
