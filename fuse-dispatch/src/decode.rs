//! Native to portable conversions

use std::convert::TryFrom;

/// Errors raised while decoding a native value
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The native value carries bits with no portable meaning
    #[error("UnknownBits: {kind} = {bits:#o}")]
    UnknownBits {
        /// decoded type
        kind: &'static str,
        /// the bits left over
        bits: u64,
    },

    /// The native value is not one of the known constants
    #[error("InvalidValue: {kind} = {value}")]
    InvalidValue {
        /// decoded type
        kind: &'static str,
        /// the raw value
        value: i64,
    },

    /// An integer field does not fit the portable width
    #[error("NumOverflow: {field}")]
    NumOverflow {
        /// field name
        field: &'static str,
    },

    /// A required pointer argument is null
    #[error("NullPointer")]
    NullPointer,
}

/// Converts a native value into its portable representation
pub trait Decode: Sized {
    /// The native type
    type Native;

    /// Decodes `raw`
    /// # Errors
    /// Returns [`DecodeError`] when `raw` has no portable representation
    fn decode(raw: &Self::Native) -> Result<Self, DecodeError>;
}

/// Widens a native integer field
#[allow(clippy::useless_conversion)]
#[inline]
pub(crate) fn widen<T, U>(value: T, field: &'static str) -> Result<U, DecodeError>
where
    U: TryFrom<T>,
{
    U::try_from(value).map_err(|_| DecodeError::NumOverflow { field })
}
