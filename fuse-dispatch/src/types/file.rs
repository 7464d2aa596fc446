use crate::decode::{Decode, DecodeError};
use crate::encode::{Encode, EncodeError};

use libc::mode_t;

native_enum! {
    /// The access mode part of open flags
    pub enum AccessMode: libc::c_int {
        ReadOnly => libc::O_RDONLY,
        WriteOnly => libc::O_WRONLY,
        ReadWrite => libc::O_RDWR,
    }
}

impl AccessMode {
    /// Extracts the access mode from raw open flags
    /// # Errors
    /// Returns [`DecodeError`] when the access mode bits are invalid
    #[inline]
    pub fn from_open_flags(o_flags: libc::c_int) -> Result<Self, DecodeError> {
        Self::decode(&(o_flags & libc::O_ACCMODE))
    }

    /// Whether this mode allows reading
    #[must_use]
    #[inline]
    pub const fn is_readable(self) -> bool {
        matches!(self, Self::ReadOnly | Self::ReadWrite)
    }

    /// Whether this mode allows writing
    #[must_use]
    #[inline]
    pub const fn is_writable(self) -> bool {
        matches!(self, Self::WriteOnly | Self::ReadWrite)
    }
}

native_enum! {
    /// The type of a file
    pub enum FileType: mode_t {
        NamedPipe => libc::S_IFIFO,
        CharacterDevice => libc::S_IFCHR,
        Directory => libc::S_IFDIR,
        BlockDevice => libc::S_IFBLK,
        Regular => libc::S_IFREG,
        SymbolicLink => libc::S_IFLNK,
        Socket => libc::S_IFSOCK,
    }
}

native_flags! {
    /// Permission bits of a file mode
    pub struct Permissions: mode_t {
        const SET_UID = 0o4000 => 0o4000;
        const SET_GID = 0o2000 => 0o2000;
        const STICKY = 0o1000 => 0o1000;

        const USER_READ = 0o0400 => 0o0400;
        const USER_WRITE = 0o0200 => 0o0200;
        const USER_EXECUTE = 0o0100 => 0o0100;

        const GROUP_READ = 0o0040 => 0o0040;
        const GROUP_WRITE = 0o0020 => 0o0020;
        const GROUP_EXECUTE = 0o0010 => 0o0010;

        const OTHER_READ = 0o0004 => 0o0004;
        const OTHER_WRITE = 0o0002 => 0o0002;
        const OTHER_EXECUTE = 0o0001 => 0o0001;
    }
}

impl Permissions {
    /// Builds permissions from octal notation, ignoring bits above `0o7777`
    #[must_use]
    #[inline]
    pub const fn from_octal(mode: u32) -> Self {
        Self::from_bits_truncate(mode)
    }
}

/// A file mode: an optional file type and permission bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode {
    /// file type, absent in modes that only carry permissions
    pub file_type: Option<FileType>,
    /// permission bits
    pub permissions: Permissions,
}

impl Mode {
    /// Creates a [`Mode`]
    #[must_use]
    #[inline]
    pub const fn new(file_type: FileType, permissions: Permissions) -> Self {
        Self {
            file_type: Some(file_type),
            permissions,
        }
    }

    /// Creates a [`Mode`] without a file type
    #[must_use]
    #[inline]
    pub const fn permissions(permissions: Permissions) -> Self {
        Self {
            file_type: None,
            permissions,
        }
    }
}

impl Decode for Mode {
    type Native = mode_t;

    #[inline]
    fn decode(raw: &mode_t) -> Result<Self, DecodeError> {
        let fmt = *raw & libc::S_IFMT;
        let file_type = if fmt == 0 {
            None
        } else {
            Some(FileType::decode(&fmt)?)
        };
        let permissions = Permissions::decode(&(*raw & !libc::S_IFMT))?;
        Ok(Self {
            file_type,
            permissions,
        })
    }
}

impl Encode for Mode {
    type Native = mode_t;

    #[inline]
    fn encode(&self, raw: &mut mode_t) -> Result<(), EncodeError> {
        let mut fmt: mode_t = 0;
        if let Some(ref file_type) = self.file_type {
            file_type.encode(&mut fmt)?;
        }
        let mut perm: mode_t = 0;
        self.permissions.encode(&mut perm)?;
        *raw = fmt | perm;
        Ok(())
    }
}
