//! The user-facing file system trait

use crate::errno::Errno;
use crate::types::{
    AccessModes, DirectoryEntry, FileStat, FileTimes, FsStat, LockCommand, Mode,
    OpenedHandleInfo, RecordLock, XattrFlags,
};

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use bitflags::bitflags;

/// A lazy directory listing
///
/// The iterator is consumed across several `readdir` calls of the kernel.
pub type DirectoryEntries = Box<dyn Iterator<Item = DirectoryEntry> + Send>;

bitflags! {
    /// The set of operations a file system provides
    ///
    /// Only declared operations are registered with libfuse. An undeclared
    /// operation is answered with `ENOSYS` without reaching the file system.
    #[derive(Default)]
    pub struct Operations: u64 {
        const GETATTR = 1 << 0;
        const READLINK = 1 << 1;
        const MKNOD = 1 << 2;
        const MKDIR = 1 << 3;
        const UNLINK = 1 << 4;
        const RMDIR = 1 << 5;
        const SYMLINK = 1 << 6;
        const RENAME = 1 << 7;
        const LINK = 1 << 8;
        const CHMOD = 1 << 9;
        const CHOWN = 1 << 10;
        const TRUNCATE = 1 << 11;
        const UTIME = 1 << 12;
        const OPEN = 1 << 13;
        const READ = 1 << 14;
        const WRITE = 1 << 15;
        const STATFS = 1 << 16;
        const FLUSH = 1 << 17;
        const RELEASE = 1 << 18;
        const FSYNC = 1 << 19;
        const SETXATTR = 1 << 20;
        const GETXATTR = 1 << 21;
        const LISTXATTR = 1 << 22;
        const REMOVEXATTR = 1 << 23;
        const OPENDIR = 1 << 24;
        const READDIR = 1 << 25;
        const RELEASEDIR = 1 << 26;
        const FSYNCDIR = 1 << 27;
        const ACCESS = 1 << 28;
        const CREATE = 1 << 29;
        const FTRUNCATE = 1 << 30;
        const FGETATTR = 1 << 31;
        const LOCK = 1 << 32;
        const BMAP = 1 << 33;

        /// operations on extended attributes
        const XATTR = Self::SETXATTR.bits
            | Self::GETXATTR.bits
            | Self::LISTXATTR.bits
            | Self::REMOVEXATTR.bits;
    }
}

/// A path-based file system
///
/// Every operation has a default body returning [`Errno::NoSys`]. An
/// implementation overrides the operations it supports and declares them in
/// [`FileSystem::operations`].
///
/// Operations run on the libfuse worker threads, possibly concurrently. A
/// panic inside an operation is contained and reported as `EIO`.
#[allow(unused_variables)]
pub trait FileSystem: Send + Sync + 'static {
    /// The operations this file system provides
    fn operations(&self) -> Operations;

    /// Gets file attributes
    fn getattr(&self, path: &Path) -> Result<FileStat, Errno> {
        Err(Errno::NoSys)
    }

    /// Reads the target of a symbolic link
    fn readlink(&self, path: &Path) -> Result<PathBuf, Errno> {
        Err(Errno::NoSys)
    }

    /// Creates a file node
    fn mknod(&self, path: &Path, mode: Mode, rdev: u64) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Creates a directory
    fn mkdir(&self, path: &Path, mode: Mode) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Removes a file
    fn unlink(&self, path: &Path) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Removes a directory
    fn rmdir(&self, path: &Path) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Creates a symbolic link at `link` pointing to `target`
    fn symlink(&self, target: &Path, link: &Path) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Renames a file
    fn rename(&self, from: &Path, to: &Path) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Creates a hard link `to` referring to `from`
    fn link(&self, from: &Path, to: &Path) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Changes permission bits
    fn chmod(&self, path: &Path, mode: Mode) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Changes the owner and group; `None` leaves the id unchanged
    fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Changes the size of a file
    fn truncate(&self, path: &Path, size: i64) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Changes access and modification times; `None` means "now"
    fn utime(&self, path: &Path, times: Option<FileTimes>) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Opens a file
    ///
    /// Changes to `info` are reported back to the kernel on success.
    fn open(&self, path: &Path, info: &mut OpenedHandleInfo) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Reads data into `buf`, returning the number of bytes read
    fn read(
        &self,
        path: &Path,
        buf: &mut [u8],
        offset: i64,
        info: &OpenedHandleInfo,
    ) -> Result<usize, Errno> {
        Err(Errno::NoSys)
    }

    /// Writes data from `buf`, returning the number of bytes written
    fn write(
        &self,
        path: &Path,
        buf: &[u8],
        offset: i64,
        info: &OpenedHandleInfo,
    ) -> Result<usize, Errno> {
        Err(Errno::NoSys)
    }

    /// Gets file system statistics
    fn statfs(&self, path: &Path) -> Result<FsStat, Errno> {
        Err(Errno::NoSys)
    }

    /// Called on each `close` of an opened file
    fn flush(&self, path: &Path, info: &OpenedHandleInfo) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Releases an opened file
    fn release(&self, path: &Path, info: &OpenedHandleInfo) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Synchronizes file contents
    fn fsync(&self, path: &Path, datasync: bool, info: &OpenedHandleInfo) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Sets an extended attribute
    fn setxattr(
        &self,
        path: &Path,
        name: &OsStr,
        value: &[u8],
        flags: XattrFlags,
    ) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Gets the whole value of an extended attribute
    fn getxattr(&self, path: &Path, name: &OsStr) -> Result<Vec<u8>, Errno> {
        Err(Errno::NoSys)
    }

    /// Lists the names of all extended attributes
    fn listxattr(&self, path: &Path) -> Result<Vec<OsString>, Errno> {
        Err(Errno::NoSys)
    }

    /// Removes an extended attribute
    fn removexattr(&self, path: &Path, name: &OsStr) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Opens a directory
    fn opendir(&self, path: &Path, info: &mut OpenedHandleInfo) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Lists a directory
    ///
    /// Called once per listing; the returned iterator is drained lazily as
    /// the kernel asks for more entries.
    fn readdir(&self, path: &Path, info: &OpenedHandleInfo) -> Result<DirectoryEntries, Errno> {
        Err(Errno::NoSys)
    }

    /// Releases an opened directory
    fn releasedir(&self, path: &Path, info: &OpenedHandleInfo) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Synchronizes directory contents
    fn fsyncdir(&self, path: &Path, datasync: bool, info: &OpenedHandleInfo) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Called once the file system is mounted, before any other operation
    fn init(&self) {}

    /// Called once when the file system is unmounted
    fn destroy(&self) {}

    /// Checks access permissions; an empty `mode` checks existence
    fn access(&self, path: &Path, mode: AccessModes) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Creates and opens a file
    fn create(&self, path: &Path, mode: Mode, info: &mut OpenedHandleInfo) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Changes the size of an opened file
    fn ftruncate(&self, path: &Path, size: i64, info: &OpenedHandleInfo) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Gets attributes of an opened file
    fn fgetattr(&self, path: &Path, info: &OpenedHandleInfo) -> Result<FileStat, Errno> {
        Err(Errno::NoSys)
    }

    /// Performs a POSIX record lock operation
    ///
    /// For [`LockCommand::GetLock`], `lock` is updated to describe the
    /// conflicting lock, or its type set to unlock when there is none.
    fn lock(
        &self,
        path: &Path,
        info: &OpenedHandleInfo,
        cmd: LockCommand,
        lock: &mut RecordLock,
    ) -> Result<(), Errno> {
        Err(Errno::NoSys)
    }

    /// Maps a block index within a file to a device block index
    fn bmap(&self, path: &Path, block_size: usize, index: u64) -> Result<u64, Errno> {
        Err(Errno::NoSys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccessMode;

    struct Empty;

    impl FileSystem for Empty {
        fn operations(&self) -> Operations {
            Operations::empty()
        }
    }

    #[test]
    fn defaults_are_nosys() {
        let fs = Empty;
        let path = Path::new("/");
        assert_eq!(fs.getattr(path), Err(Errno::NoSys));
        assert_eq!(fs.unlink(path), Err(Errno::NoSys));
        let info = OpenedHandleInfo::new(AccessMode::ReadOnly);
        assert!(matches!(fs.readdir(path, &info), Err(Errno::NoSys)));
    }

    #[test]
    fn xattr_group() {
        assert!(Operations::XATTR.contains(Operations::GETXATTR | Operations::REMOVEXATTR));
        assert!(!Operations::XATTR.contains(Operations::GETATTR));
    }
}
