use super::stat::FileStat;

use std::ffi::{CStr, CString, OsStr, OsString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};

use memchr::memchr2;

/// An invalid directory entry name
#[derive(Debug, thiserror::Error)]
#[error("invalid directory entry name: {name:?}")]
pub struct InvalidEntryName {
    name: OsString,
}

impl InvalidEntryName {
    /// The rejected name
    #[must_use]
    #[inline]
    pub fn name(&self) -> &OsStr {
        &self.name
    }
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    name: CString,
    stat: Option<FileStat>,
}

impl DirectoryEntry {
    /// Creates an entry
    /// # Errors
    /// Returns [`InvalidEntryName`] when `name` is empty or contains `/` or a nul byte
    #[inline]
    pub fn new(name: impl Into<OsString>) -> Result<Self, InvalidEntryName> {
        let name = name.into();
        let bytes = name.as_bytes();
        if bytes.is_empty() || memchr2(b'/', 0, bytes).is_some() {
            return Err(InvalidEntryName { name });
        }
        match CString::new(name.into_vec()) {
            Ok(name) => Ok(Self { name, stat: None }),
            Err(err) => Err(InvalidEntryName {
                name: OsString::from_vec(err.into_vec()),
            }),
        }
    }

    /// Attaches attributes to the entry
    #[must_use]
    #[inline]
    pub fn with_stat(mut self, stat: FileStat) -> Self {
        self.stat = Some(stat);
        self
    }

    /// The entry name
    #[must_use]
    #[inline]
    pub fn name(&self) -> &OsStr {
        OsStr::from_bytes(self.name.as_bytes())
    }

    /// The attributes attached to the entry
    #[must_use]
    #[inline]
    pub fn stat(&self) -> Option<&FileStat> {
        self.stat.as_ref()
    }

    pub(crate) fn c_name(&self) -> &CStr {
        &self.name
    }
}
