/// Declares a portable flag set together with its translation table.
///
/// Each entry maps one portable flag to the native bit pattern of the current
/// platform. An entry carrying `#[cfg(..)]` only exists where the native
/// constant exists; elsewhere the portable flag is reported as unsupported.
macro_rules! native_flags {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $native:ty {
            $(
                $(#[cfg($cfg:meta)])*
                const $flag:ident = $bit:expr => $raw:expr;
            )+
        }
    ) => {
        bitflags::bitflags! {
            $(#[$meta])*
            #[derive(Default)]
            pub struct $name: u32 {
                $(const $flag = $bit;)+
            }
        }

        impl crate::decode::Decode for $name {
            type Native = $native;

            #[allow(unused_mut, clippy::cast_sign_loss)]
            #[inline]
            fn decode(raw: &$native) -> Result<Self, crate::decode::DecodeError> {
                let mut rest: $native = *raw;
                let mut flags = Self::empty();
                $(
                    $(#[cfg($cfg)])*
                    {
                        let bits: $native = $raw;
                        if bits != 0 && rest & bits == bits {
                            flags.insert(Self::$flag);
                            rest &= !bits;
                        }
                    }
                )+
                if rest != 0 {
                    return Err(crate::decode::DecodeError::UnknownBits {
                        kind: stringify!($name),
                        bits: rest as u64,
                    });
                }
                Ok(flags)
            }
        }

        impl crate::encode::Encode for $name {
            type Native = $native;

            #[allow(unused_mut)]
            #[inline]
            fn encode(&self, raw: &mut $native) -> Result<(), crate::encode::EncodeError> {
                let mut rest = *self;
                let mut bits: $native = 0;
                $(
                    $(#[cfg($cfg)])*
                    {
                        if rest.contains(Self::$flag) {
                            bits |= $raw;
                            rest.remove(Self::$flag);
                        }
                    }
                )+
                if !rest.is_empty() {
                    return Err(crate::encode::EncodeError::Unsupported {
                        kind: stringify!($name),
                        bits: u64::from(rest.bits()),
                    });
                }
                *raw = bits;
                Ok(())
            }
        }
    };
}

/// Declares a portable enum whose variants map one to one onto native
/// constants.
macro_rules! native_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident: $native:ty {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $raw:expr,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl crate::decode::Decode for $name {
            type Native = $native;

            #[allow(clippy::unnecessary_cast)]
            #[inline]
            fn decode(raw: &$native) -> Result<Self, crate::decode::DecodeError> {
                $(
                    if *raw == $raw as $native {
                        return Ok(Self::$variant);
                    }
                )+
                Err(crate::decode::DecodeError::InvalidValue {
                    kind: stringify!($name),
                    value: i64::from(*raw),
                })
            }
        }

        impl crate::encode::Encode for $name {
            type Native = $native;

            #[allow(clippy::unnecessary_cast)]
            #[inline]
            fn encode(&self, raw: &mut $native) -> Result<(), crate::encode::EncodeError> {
                *raw = match *self {
                    $(Self::$variant => $raw as $native,)+
                };
                Ok(())
            }
        }
    };
}

/// Generates boolean accessors for bare mount options.
macro_rules! option_flags {
    ($($(#[$meta:meta])* $get:ident, $set:ident => $key:literal;)+) => {$(
        $(#[$meta])*
        #[must_use]
        #[inline]
        pub fn $get(&self) -> bool {
            self.contains($key)
        }

        #[doc = concat!("Sets or clears the `", $key, "` option")]
        #[inline]
        pub fn $set(&mut self, on: bool) -> &mut Self {
            if on {
                self.set($key, None);
            } else {
                self.remove($key);
            }
            self
        }
    )+};
}
