//! The native operation table

use crate::dispatch;
use crate::error::Error;
use crate::fs::{FileSystem, Operations};
use crate::kernel::fuse_operations;
use crate::runtime::Runtime;

use tracing::debug;

/// Operations that are useless, or leak handles, without a companion
const REQUIRED_PAIRS: [(Operations, &str, Operations, &str); 3] = [
    (Operations::OPENDIR, "opendir", Operations::RELEASEDIR, "releasedir"),
    (Operations::OPEN, "open", Operations::RELEASE, "release"),
    (Operations::CREATE, "create", Operations::RELEASE, "release"),
];

/// Operations working on an opened directory
const DIRECTORY_OPERATIONS: Operations = Operations::from_bits_truncate(
    Operations::OPENDIR.bits()
        | Operations::READDIR.bits()
        | Operations::RELEASEDIR.bits()
        | Operations::FSYNCDIR.bits(),
);

/// A `struct fuse_operations` filled for one file system type
///
/// Only the slots of declared operations are bound, so libfuse answers every
/// other operation with `ENOSYS` itself. `init` and `destroy` are always
/// bound, and so are `opendir` and `releasedir` once any directory operation
/// is declared: they issue and retire the directory handles.
#[derive(Debug, Clone, Copy)]
pub struct OperationTable {
    operations: Operations,
    raw: fuse_operations,
}

impl OperationTable {
    /// Builds the table of `F` running on `R`
    /// # Errors
    /// Returns [`Error::InvalidOperations`] when an operation is declared
    /// without its companion
    #[inline]
    pub fn build<F: FileSystem, R: Runtime>(operations: Operations) -> Result<Self, Error> {
        for &(declared, operation, companion, requires) in &REQUIRED_PAIRS {
            if operations.contains(declared) && !operations.contains(companion) {
                return Err(Error::InvalidOperations {
                    operation,
                    requires,
                });
            }
        }

        let mut raw = fuse_operations::default();

        macro_rules! bind {
            ($($flag:ident => $slot:ident,)+) => {
                $(
                    if operations.contains(Operations::$flag) {
                        raw.$slot = Some(dispatch::$slot::<F, R>);
                    }
                )+
            };
        }

        bind!(
            GETATTR => getattr,
            READLINK => readlink,
            MKNOD => mknod,
            MKDIR => mkdir,
            UNLINK => unlink,
            RMDIR => rmdir,
            SYMLINK => symlink,
            RENAME => rename,
            LINK => link,
            CHMOD => chmod,
            CHOWN => chown,
            TRUNCATE => truncate,
            UTIME => utime,
            OPEN => open,
            READ => read,
            WRITE => write,
            STATFS => statfs,
            FLUSH => flush,
            RELEASE => release,
            FSYNC => fsync,
            SETXATTR => setxattr,
            GETXATTR => getxattr,
            LISTXATTR => listxattr,
            REMOVEXATTR => removexattr,
            READDIR => readdir,
            FSYNCDIR => fsyncdir,
            ACCESS => access,
            CREATE => create,
            FTRUNCATE => ftruncate,
            FGETATTR => fgetattr,
            LOCK => lock,
            BMAP => bmap,
        );

        if operations.intersects(DIRECTORY_OPERATIONS) {
            raw.opendir = Some(dispatch::opendir::<F, R>);
            raw.releasedir = Some(dispatch::releasedir::<F, R>);
        }
        raw.init = Some(dispatch::init::<F, R>);
        raw.destroy = Some(dispatch::destroy::<F>);

        debug!(?operations, "operation table built");
        Ok(Self { operations, raw })
    }

    /// The declared operations
    #[must_use]
    #[inline]
    pub const fn operations(&self) -> Operations {
        self.operations
    }

    /// The table passed to `fuse_new`
    #[must_use]
    #[inline]
    pub const fn as_raw(&self) -> &fuse_operations {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockRuntime;

    struct Declared(Operations);

    impl FileSystem for Declared {
        fn operations(&self) -> Operations {
            self.0
        }
    }

    fn build(operations: Operations) -> Result<OperationTable, Error> {
        OperationTable::build::<Declared, MockRuntime>(operations)
    }

    #[test]
    fn binds_declared_slots() {
        let table = build(Operations::GETATTR | Operations::READ).unwrap();
        let raw = table.as_raw();
        assert!(raw.getattr.is_some());
        assert!(raw.read.is_some());
        assert!(raw.init.is_some());
        assert!(raw.destroy.is_some());

        assert!(raw.open.is_none());
        assert!(raw.readdir.is_none());
        assert!(raw.getdir.is_none());
        assert!(raw.utimens.is_none());
        assert_eq!(table.operations(), Operations::GETATTR | Operations::READ);
    }

    #[test]
    fn empty_table() {
        let table = build(Operations::empty()).unwrap();
        let raw = table.as_raw();
        assert!(raw.getattr.is_none());
        assert!(raw.bmap.is_none());
        assert!(raw.init.is_some());
    }

    #[test]
    fn companions_are_required() {
        let err = build(Operations::OPENDIR | Operations::READDIR).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidOperations {
                operation: "opendir",
                requires: "releasedir"
            }
        ));

        let err = build(Operations::OPEN).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidOperations {
                operation: "open",
                ..
            }
        ));

        let err = build(Operations::CREATE | Operations::OPENDIR | Operations::RELEASEDIR)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidOperations {
                operation: "create",
                requires: "release"
            }
        ));

        assert!(build(Operations::all()).is_ok());
        assert!(build(Operations::READDIR).is_ok());
    }

    #[test]
    fn listing_binds_directory_handles() {
        let raw = *build(Operations::READDIR).unwrap().as_raw();
        assert!(raw.readdir.is_some());
        assert!(raw.opendir.is_some());
        assert!(raw.releasedir.is_some());
        assert!(raw.fsyncdir.is_none());

        let raw = *build(Operations::GETATTR).unwrap().as_raw();
        assert!(raw.opendir.is_none());
        assert!(raw.releasedir.is_none());
    }
}
