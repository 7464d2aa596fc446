use super::file::AccessMode;
use super::flags::OpenFlags;
use crate::decode::{Decode, DecodeError};
use crate::encode::{Encode, EncodeError};
use crate::kernel::{fuse_file_info, FI_DIRECT_IO, FI_KEEP_CACHE};

/// The state of an opened file or directory, the portable form of
/// `struct fuse_file_info`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenedHandleInfo {
    /// access mode requested by `open`
    pub access: AccessMode,
    /// open flags other than the access mode
    pub flags: OpenFlags,
    /// the write was caused by a page writeback
    pub write_page: bool,
    /// bypass the page cache for this handle
    pub direct_io: bool,
    /// keep previously cached data
    pub keep_cache: bool,
    /// handle chosen by the file system in `open`, `create` or `opendir`
    pub handle: u64,
}

impl OpenedHandleInfo {
    /// Creates handle info for the given access mode
    #[must_use]
    #[inline]
    pub fn new(access: AccessMode) -> Self {
        Self {
            access,
            flags: OpenFlags::empty(),
            write_page: false,
            direct_io: false,
            keep_cache: false,
            handle: 0,
        }
    }
}

impl Decode for OpenedHandleInfo {
    type Native = fuse_file_info;

    #[inline]
    fn decode(raw: &fuse_file_info) -> Result<Self, DecodeError> {
        Ok(Self {
            access: AccessMode::from_open_flags(raw.flags)?,
            flags: OpenFlags::decode(&(raw.flags & !libc::O_ACCMODE))?,
            write_page: raw.writepage != 0,
            direct_io: raw.bits & FI_DIRECT_IO != 0,
            keep_cache: raw.bits & FI_KEEP_CACHE != 0,
            handle: raw.fh,
        })
    }
}

impl Encode for OpenedHandleInfo {
    type Native = fuse_file_info;

    #[inline]
    fn encode(&self, raw: &mut fuse_file_info) -> Result<(), EncodeError> {
        let mut access = 0;
        self.access.encode(&mut access)?;
        let mut flags = 0;
        self.flags.encode(&mut flags)?;

        raw.flags = access | flags;
        raw.writepage = i32::from(self.write_page);

        let mut bits = raw.bits & !(FI_DIRECT_IO | FI_KEEP_CACHE);
        if self.direct_io {
            bits |= FI_DIRECT_IO;
        }
        if self.keep_cache {
            bits |= FI_KEEP_CACHE;
        }
        raw.bits = bits;

        raw.fh = self.handle;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi_marker::zeroed;
    use crate::kernel::FI_NONSEEKABLE;

    #[test]
    fn round_trip() {
        let mut raw: fuse_file_info = zeroed();
        raw.flags = libc::O_WRONLY | libc::O_APPEND;
        raw.writepage = 1;
        raw.bits = FI_KEEP_CACHE | FI_NONSEEKABLE;
        raw.fh = 77;
        raw.lock_owner = 5;

        let mut info = OpenedHandleInfo::decode(&raw).unwrap();
        assert_eq!(info.access, AccessMode::WriteOnly);
        assert_eq!(info.flags, OpenFlags::APPEND);
        assert!(info.write_page);
        assert!(info.keep_cache);
        assert!(!info.direct_io);
        assert_eq!(info.handle, 77);

        info.direct_io = true;
        info.keep_cache = false;
        info.handle = 78;
        info.encode(&mut raw).unwrap();

        assert_eq!(raw.bits, FI_DIRECT_IO | FI_NONSEEKABLE);
        assert_eq!(raw.fh, 78);
        assert_eq!(raw.lock_owner, 5);
        assert_eq!(OpenedHandleInfo::decode(&raw).unwrap(), info);
    }

    #[test]
    fn invalid_access_mode() {
        let mut raw: fuse_file_info = zeroed();
        raw.flags = libc::O_ACCMODE;
        assert!(OpenedHandleInfo::decode(&raw).is_err());
    }
}
