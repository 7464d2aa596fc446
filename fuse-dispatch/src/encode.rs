//! Portable to native conversions

use std::convert::TryFrom;

/// Errors raised while encoding a portable value
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The portable flags have no native equivalent on this platform
    #[error("Unsupported: {kind} = {bits:#x}")]
    Unsupported {
        /// encoded type
        kind: &'static str,
        /// the portable bits left over
        bits: u64,
    },

    /// An integer field does not fit the native width
    #[error("NumOverflow: {field}")]
    NumOverflow {
        /// field name
        field: &'static str,
    },
}

/// Converts a portable value into its native representation
pub trait Encode {
    /// The native type
    type Native;

    /// Writes every field this type knows about into `raw`
    ///
    /// Fields of `raw` without a portable counterpart are left untouched.
    /// # Errors
    /// Returns [`EncodeError`] when the value can not be represented natively
    fn encode(&self, raw: &mut Self::Native) -> Result<(), EncodeError>;
}

/// Narrows a portable integer field
#[allow(clippy::useless_conversion)]
#[inline]
pub(crate) fn narrow<T, U>(value: T, field: &'static str) -> Result<U, EncodeError>
where
    U: TryFrom<T>,
{
    U::try_from(value).map_err(|_| EncodeError::NumOverflow { field })
}
