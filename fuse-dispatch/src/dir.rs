//! Directory streaming
//!
//! libfuse asks for a directory listing in several `readdir` calls, each
//! filling one reply buffer. A listing produced by the file system is kept in
//! a cursor identified by a token. Every entry is handed to libfuse with the
//! token as its offset, so the next call carries the token back and resumes
//! the same cursor.
//!
//! Directory handles are issued here as well. `opendir` swaps the handle
//! chosen by the file system for a session-unique one, so every cursor is
//! owned by exactly one open directory even when the file system leaves its
//! handles at zero.

use crate::dispatch::Failure;
use crate::encode::EncodeError;
use crate::errno::Errno;
use crate::fs::DirectoryEntries;
use crate::types::DirectoryEntry;

use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

/// Tokens travel as `off_t`
const MAX_TOKEN: u64 = 0x7fff_ffff_ffff_ffff;

/// The answer of the native fill callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fill {
    /// the entry was added to the reply buffer
    Accepted,
    /// the reply buffer is full and the entry was refused
    Full,
}

enum Pumped {
    Full(usize),
    Drained(usize),
}

struct DirectoryCursor {
    token: u64,
    entries: DirectoryEntries,
    /// refused by a full buffer, delivered first on the next call
    pending: Option<DirectoryEntry>,
}

impl DirectoryCursor {
    fn pump<S>(&mut self, fill: &mut S) -> Result<Pumped, EncodeError>
    where
        S: FnMut(&DirectoryEntry, i64) -> Result<Fill, EncodeError>,
    {
        let offset = i64::try_from(self.token).map_err(|_| EncodeError::NumOverflow {
            field: "off",
        })?;
        let mut delivered: usize = 0;
        loop {
            let entry = match self.pending.take() {
                Some(entry) => entry,
                None => match self.entries.next() {
                    Some(entry) => entry,
                    None => return Ok(Pumped::Drained(delivered)),
                },
            };
            match fill(&entry, offset)? {
                Fill::Accepted => delivered = delivered.wrapping_add(1),
                Fill::Full => {
                    self.pending = Some(entry);
                    return Ok(Pumped::Full(delivered));
                }
            }
        }
    }
}

struct Slot {
    /// issued handle of the directory that started the listing
    owner: u64,
    cursor: Arc<Mutex<DirectoryCursor>>,
}

#[derive(Default)]
struct Registry {
    cursors: HashMap<u64, Slot>,
    last: u64,
    /// issued handle to the handle chosen by the file system
    directories: HashMap<u64, u64>,
    last_directory: u64,
}

/// The live directory cursors of a session
#[derive(Default)]
pub(crate) struct CursorRegistry {
    inner: Mutex<Registry>,
}

impl fmt::Debug for CursorRegistry {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl CursorRegistry {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn starting_after(last: u64) -> Self {
        let registry = Self::default();
        registry.lock().last = last;
        registry
    }

    fn insert(&self, owner: u64, entries: DirectoryEntries) -> (u64, Arc<Mutex<DirectoryCursor>>) {
        let mut registry = self.lock();
        let token = loop {
            let next = if registry.last >= MAX_TOKEN {
                1
            } else {
                registry.last.wrapping_add(1)
            };
            registry.last = next;
            if !registry.cursors.contains_key(&next) {
                break next;
            }
        };
        let cursor = Arc::new(Mutex::new(DirectoryCursor {
            token,
            entries,
            pending: None,
        }));
        let slot = Slot {
            owner,
            cursor: Arc::clone(&cursor),
        };
        let _ = registry.cursors.insert(token, slot);
        (token, cursor)
    }

    fn lookup(&self, token: u64) -> Option<Arc<Mutex<DirectoryCursor>>> {
        self.lock()
            .cursors
            .get(&token)
            .map(|slot| Arc::clone(&slot.cursor))
    }

    fn remove(&self, token: u64) -> bool {
        self.lock().cursors.remove(&token).is_some()
    }

    /// Registers an opened directory and returns the handle issued for it
    pub(crate) fn open_directory(&self, fs_handle: u64) -> u64 {
        let mut registry = self.lock();
        let handle = loop {
            let next = registry.last_directory.wrapping_add(1).max(1);
            registry.last_directory = next;
            if !registry.directories.contains_key(&next) {
                break next;
            }
        };
        let _ = registry.directories.insert(handle, fs_handle);
        handle
    }

    /// The handle the file system chose for the issued `handle`
    pub(crate) fn directory(&self, handle: u64) -> Option<u64> {
        self.lock().directories.get(&handle).copied()
    }

    /// Forgets the issued `handle` and removes every cursor it started
    ///
    /// Returns the handle chosen by the file system and the number of
    /// removed cursors.
    pub(crate) fn close_directory(&self, handle: u64) -> (Option<u64>, usize) {
        let mut registry = self.lock();
        let fs_handle = registry.directories.remove(&handle);
        let before = registry.cursors.len();
        registry.cursors.retain(|_, slot| slot.owner != handle);
        (fs_handle, before.wrapping_sub(registry.cursors.len()))
    }

    /// Removes every cursor and directory handle
    pub(crate) fn clear(&self) {
        let mut registry = self.lock();
        registry.cursors.clear();
        registry.directories.clear();
    }

    /// The number of open directories
    #[cfg(test)]
    pub(crate) fn open_directories(&self) -> usize {
        self.lock().directories.len()
    }

    /// The number of live cursors
    pub(crate) fn len(&self) -> usize {
        self.lock().cursors.len()
    }

    /// Serves one native `readdir` call
    ///
    /// At offset 0 `open` is called for a new listing. Any other offset is a
    /// token returned by a previous call; an unknown token means the listing
    /// already ended. Returns the number of entries accepted by `fill`.
    pub(crate) fn stream<O, S>(
        &self,
        offset: i64,
        owner: u64,
        open: O,
        mut fill: S,
    ) -> Result<usize, Failure>
    where
        O: FnOnce() -> Result<DirectoryEntries, Errno>,
        S: FnMut(&DirectoryEntry, i64) -> Result<Fill, EncodeError>,
    {
        let (token, cursor) = if offset == 0 {
            let entries = open()?;
            let (token, cursor) = self.insert(owner, entries);
            trace!(token, owner, "directory cursor created");
            (token, cursor)
        } else {
            let found = u64::try_from(offset)
                .ok()
                .and_then(|token| self.lookup(token).map(|cursor| (token, cursor)));
            match found {
                Some(found) => found,
                None => {
                    trace!(offset, "no directory cursor, listing is over");
                    return Ok(0);
                }
            }
        };

        let pumped = {
            let mut guard = cursor.lock().unwrap_or_else(PoisonError::into_inner);
            panic::catch_unwind(AssertUnwindSafe(|| guard.pump(&mut fill)))
        };

        match pumped {
            Ok(Ok(Pumped::Full(delivered))) => Ok(delivered),
            Ok(Ok(Pumped::Drained(delivered))) => {
                let _ = self.remove(token);
                trace!(token, "directory cursor drained");
                Ok(delivered)
            }
            Ok(Err(err)) => {
                let _ = self.remove(token);
                Err(err.into())
            }
            Err(payload) => {
                let _ = self.remove(token);
                panic::resume_unwind(payload)
            }
        }
    }
}
