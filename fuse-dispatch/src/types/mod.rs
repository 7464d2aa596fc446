//! Portable forms of the native structures

mod entry;
mod file;
mod flags;
mod handle;
mod lock;
mod stat;

pub use self::entry::{DirectoryEntry, InvalidEntryName};
pub use self::file::{AccessMode, FileType, Mode, Permissions};
pub use self::flags::{AccessModes, MountFlags, OpenFlags, XattrFlags};
pub use self::handle::OpenedHandleInfo;
pub use self::lock::{LockCommand, LockType, LockWhence, RecordLock};
pub use self::stat::{FileStat, FileTimes, FsStat, Timespec};
