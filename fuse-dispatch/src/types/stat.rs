use super::file::{FileType, Mode, Permissions};
use super::flags::MountFlags;
use crate::decode::{widen, Decode, DecodeError};
use crate::encode::{narrow, Encode, EncodeError};

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A point in time, relative to the unix epoch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timespec {
    /// seconds
    pub sec: i64,
    /// nanoseconds
    pub nsec: u32,
}

impl Timespec {
    /// Creates a [`Timespec`]
    #[must_use]
    #[inline]
    pub const fn new(sec: i64, nsec: u32) -> Self {
        Self { sec, nsec }
    }

    /// Returns the current time
    #[must_use]
    #[inline]
    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }
}

impl From<SystemTime> for Timespec {
    #[allow(clippy::cast_possible_wrap)]
    #[inline]
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self::new(d.as_secs() as i64, d.subsec_nanos()),
            Err(err) => {
                let d: Duration = err.duration();
                let neg = (d.as_secs() as i64).wrapping_neg();
                match d.subsec_nanos() {
                    0 => Self::new(neg, 0),
                    nsec => Self::new(neg.wrapping_sub(1), 1_000_000_000 - nsec),
                }
            }
        }
    }
}

/// File attributes, the portable form of `struct stat`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// device containing the file
    pub device: u64,
    /// inode number
    pub inode: u64,
    /// file type and permissions
    pub mode: Mode,
    /// number of hard links
    pub nlink: u64,
    /// owner
    pub uid: u32,
    /// group
    pub gid: u32,
    /// device id of a special file
    pub rdev: u64,
    /// size in bytes
    pub size: i64,
    /// preferred I/O block size
    pub block_size: i64,
    /// number of 512B blocks allocated
    pub blocks: i64,
    /// last access
    pub atime: Timespec,
    /// last modification
    pub mtime: Timespec,
    /// last status change
    pub ctime: Timespec,
}

impl FileStat {
    /// Creates attributes with the given mode and every other field zeroed
    #[must_use]
    #[inline]
    pub const fn new(mode: Mode) -> Self {
        Self {
            device: 0,
            inode: 0,
            mode,
            nlink: 0,
            uid: 0,
            gid: 0,
            rdev: 0,
            size: 0,
            block_size: 0,
            blocks: 0,
            atime: Timespec::new(0, 0),
            mtime: Timespec::new(0, 0),
            ctime: Timespec::new(0, 0),
        }
    }

    /// Attributes of a directory
    #[must_use]
    #[inline]
    pub const fn directory(permissions: Permissions) -> Self {
        let mut stat = Self::new(Mode::new(FileType::Directory, permissions));
        stat.nlink = 2;
        stat
    }

    /// Attributes of a regular file
    #[must_use]
    #[inline]
    pub const fn regular(permissions: Permissions, size: i64) -> Self {
        let mut stat = Self::new(Mode::new(FileType::Regular, permissions));
        stat.nlink = 1;
        stat.size = size;
        stat
    }
}

impl Decode for FileStat {
    type Native = libc::stat;

    #[inline]
    fn decode(raw: &libc::stat) -> Result<Self, DecodeError> {
        Ok(Self {
            device: widen(raw.st_dev, "st_dev")?,
            inode: widen(raw.st_ino, "st_ino")?,
            mode: Mode::decode(&raw.st_mode)?,
            nlink: widen(raw.st_nlink, "st_nlink")?,
            uid: raw.st_uid,
            gid: raw.st_gid,
            rdev: widen(raw.st_rdev, "st_rdev")?,
            size: widen(raw.st_size, "st_size")?,
            block_size: widen(raw.st_blksize, "st_blksize")?,
            blocks: widen(raw.st_blocks, "st_blocks")?,
            atime: Timespec {
                sec: widen(raw.st_atime, "st_atime")?,
                nsec: widen(raw.st_atime_nsec, "st_atime_nsec")?,
            },
            mtime: Timespec {
                sec: widen(raw.st_mtime, "st_mtime")?,
                nsec: widen(raw.st_mtime_nsec, "st_mtime_nsec")?,
            },
            ctime: Timespec {
                sec: widen(raw.st_ctime, "st_ctime")?,
                nsec: widen(raw.st_ctime_nsec, "st_ctime_nsec")?,
            },
        })
    }
}

impl Encode for FileStat {
    type Native = libc::stat;

    #[inline]
    fn encode(&self, raw: &mut libc::stat) -> Result<(), EncodeError> {
        raw.st_dev = narrow(self.device, "st_dev")?;
        raw.st_ino = narrow(self.inode, "st_ino")?;
        self.mode.encode(&mut raw.st_mode)?;
        raw.st_nlink = narrow(self.nlink, "st_nlink")?;
        raw.st_uid = self.uid;
        raw.st_gid = self.gid;
        raw.st_rdev = narrow(self.rdev, "st_rdev")?;
        raw.st_size = narrow(self.size, "st_size")?;
        raw.st_blksize = narrow(self.block_size, "st_blksize")?;
        raw.st_blocks = narrow(self.blocks, "st_blocks")?;
        raw.st_atime = narrow(self.atime.sec, "st_atime")?;
        raw.st_atime_nsec = narrow(self.atime.nsec, "st_atime_nsec")?;
        raw.st_mtime = narrow(self.mtime.sec, "st_mtime")?;
        raw.st_mtime_nsec = narrow(self.mtime.nsec, "st_mtime_nsec")?;
        raw.st_ctime = narrow(self.ctime.sec, "st_ctime")?;
        raw.st_ctime_nsec = narrow(self.ctime.nsec, "st_ctime_nsec")?;
        Ok(())
    }
}

/// File system statistics, the portable form of `struct statvfs`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FsStat {
    /// file system block size
    pub block_size: u64,
    /// fragment size
    pub fragment_size: u64,
    /// size of the file system in fragments
    pub blocks: u64,
    /// free blocks
    pub blocks_free: u64,
    /// free blocks for unprivileged users
    pub blocks_available: u64,
    /// inodes
    pub files: u64,
    /// free inodes
    pub files_free: u64,
    /// free inodes for unprivileged users
    pub files_available: u64,
    /// file system id
    pub fsid: u64,
    /// mount flags
    pub flags: MountFlags,
    /// maximum file name length
    pub max_name_len: u64,
}

impl Decode for FsStat {
    type Native = libc::statvfs;

    #[inline]
    fn decode(raw: &libc::statvfs) -> Result<Self, DecodeError> {
        Ok(Self {
            block_size: widen(raw.f_bsize, "f_bsize")?,
            fragment_size: widen(raw.f_frsize, "f_frsize")?,
            blocks: widen(raw.f_blocks, "f_blocks")?,
            blocks_free: widen(raw.f_bfree, "f_bfree")?,
            blocks_available: widen(raw.f_bavail, "f_bavail")?,
            files: widen(raw.f_files, "f_files")?,
            files_free: widen(raw.f_ffree, "f_ffree")?,
            files_available: widen(raw.f_favail, "f_favail")?,
            fsid: widen(raw.f_fsid, "f_fsid")?,
            flags: MountFlags::decode(&raw.f_flag)?,
            max_name_len: widen(raw.f_namemax, "f_namemax")?,
        })
    }
}

impl Encode for FsStat {
    type Native = libc::statvfs;

    #[inline]
    fn encode(&self, raw: &mut libc::statvfs) -> Result<(), EncodeError> {
        raw.f_bsize = narrow(self.block_size, "f_bsize")?;
        raw.f_frsize = narrow(self.fragment_size, "f_frsize")?;
        raw.f_blocks = narrow(self.blocks, "f_blocks")?;
        raw.f_bfree = narrow(self.blocks_free, "f_bfree")?;
        raw.f_bavail = narrow(self.blocks_available, "f_bavail")?;
        raw.f_files = narrow(self.files, "f_files")?;
        raw.f_ffree = narrow(self.files_free, "f_ffree")?;
        raw.f_favail = narrow(self.files_available, "f_favail")?;
        raw.f_fsid = narrow(self.fsid, "f_fsid")?;
        self.flags.encode(&mut raw.f_flag)?;
        raw.f_namemax = narrow(self.max_name_len, "f_namemax")?;
        Ok(())
    }
}

/// Access and modification times, the portable form of `struct utimbuf`
///
/// `utimbuf` has a resolution of one second; nanoseconds are dropped when
/// encoding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileTimes {
    /// last access
    pub access: Timespec,
    /// last modification
    pub modification: Timespec,
}

impl Decode for FileTimes {
    type Native = libc::utimbuf;

    #[inline]
    fn decode(raw: &libc::utimbuf) -> Result<Self, DecodeError> {
        Ok(Self {
            access: Timespec::new(widen(raw.actime, "actime")?, 0),
            modification: Timespec::new(widen(raw.modtime, "modtime")?, 0),
        })
    }
}

impl Encode for FileTimes {
    type Native = libc::utimbuf;

    #[inline]
    fn encode(&self, raw: &mut libc::utimbuf) -> Result<(), EncodeError> {
        raw.actime = narrow(self.access.sec, "actime")?;
        raw.modtime = narrow(self.modification.sec, "modtime")?;
        Ok(())
    }
}
