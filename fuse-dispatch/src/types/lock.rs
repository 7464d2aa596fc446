use crate::decode::{widen, Decode, DecodeError};
use crate::encode::{narrow, Encode, EncodeError};

use std::os::raw::{c_int, c_short};

native_enum! {
    /// `l_type` of a record lock
    pub enum LockType: c_short {
        Read => libc::F_RDLCK,
        Write => libc::F_WRLCK,
        Unlock => libc::F_UNLCK,
    }
}

native_enum! {
    /// `l_whence` of a record lock
    pub enum LockWhence: c_short {
        Start => libc::SEEK_SET,
        Current => libc::SEEK_CUR,
        End => libc::SEEK_END,
    }
}

native_enum! {
    /// The command of a `lock` call
    pub enum LockCommand: c_int {
        GetLock => libc::F_GETLK,
        SetLock => libc::F_SETLK,
        SetLockWait => libc::F_SETLKW,
    }
}

/// A POSIX record lock, the portable form of `struct flock`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLock {
    /// lock type
    pub lock_type: LockType,
    /// base of `start`
    pub whence: LockWhence,
    /// first byte of the locked range
    pub start: i64,
    /// length of the range, 0 for "until end of file"
    pub len: i64,
    /// process holding the lock, reported by `GetLock`
    pub pid: i32,
}

impl Decode for RecordLock {
    type Native = libc::flock;

    #[inline]
    fn decode(raw: &libc::flock) -> Result<Self, DecodeError> {
        Ok(Self {
            lock_type: LockType::decode(&raw.l_type)?,
            whence: LockWhence::decode(&raw.l_whence)?,
            start: widen(raw.l_start, "l_start")?,
            len: widen(raw.l_len, "l_len")?,
            pid: raw.l_pid,
        })
    }
}

impl Encode for RecordLock {
    type Native = libc::flock;

    #[inline]
    fn encode(&self, raw: &mut libc::flock) -> Result<(), EncodeError> {
        self.lock_type.encode(&mut raw.l_type)?;
        self.whence.encode(&mut raw.l_whence)?;
        raw.l_start = narrow(self.start, "l_start")?;
        raw.l_len = narrow(self.len, "l_len")?;
        raw.l_pid = self.pid;
        Ok(())
    }
}
