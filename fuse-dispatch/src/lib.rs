//! Path-based file systems on the libfuse high-level API
//!
//! A file system implements [`FileSystem`] and declares the operations it
//! provides. [`Session`] builds the libfuse operation table for exactly those
//! operations, mounts the file system and runs the libfuse event loop.

#![deny(clippy::all)]

#[macro_use]
mod internel_macros;

// unsafe modules
mod abi_marker;
mod decode;
mod dispatch;
mod encode;
mod runtime;
mod utils;

// safe modules
mod context;
mod dir;
mod errno;
mod error;
mod fs;
mod ops;
mod options;
mod session;
mod types;

pub mod kernel;

#[cfg(test)]
mod testing;

pub use self::context::CallContext;
pub use self::decode::{Decode, DecodeError};
pub use self::encode::{Encode, EncodeError};
pub use self::errno::Errno;
pub use self::error::Error;
pub use self::fs::{DirectoryEntries, FileSystem, Operations};
pub use self::ops::OperationTable;
pub use self::options::{parse_args, MountOptions, ParsedArgs};
pub use self::runtime::Runtime;
pub use self::session::{Session, SessionHandle};
pub use self::types::*;
pub use self::utils::c_bytes::NulError;

#[cfg(feature = "libfuse")]
pub use self::runtime::LibFuse;
