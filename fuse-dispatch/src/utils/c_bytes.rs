use memchr::memchr;

/// Checks that `bytes` contain no nul byte
#[inline]
pub fn check_bytes(bytes: &[u8]) -> Result<(), NulError> {
    match memchr(0, bytes) {
        None => Ok(()),
        Some(pos) => Err(NulError { pos }),
    }
}

/// An interior nul byte was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("NulError: nul position = {}",.pos)]
pub struct NulError {
    pos: usize,
}

impl NulError {
    /// The position of the nul byte
    #[inline]
    #[must_use]
    pub const fn nul_position(&self) -> usize {
        self.pos
    }
}

/// Concatenates `items` as nul-terminated strings
/// # Errors
/// Returns [`NulError`] when an item contains a nul byte
#[inline]
pub fn join_with_nul<'a, I>(items: I) -> Result<Vec<u8>, NulError>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut buf = Vec::new();
    for item in items {
        check_bytes(item).map_err(|err| NulError {
            pos: buf.len().wrapping_add(err.pos),
        })?;
        buf.extend_from_slice(item);
        buf.push(0);
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nul_position() {
        assert!(check_bytes(b"hello").is_ok());
        assert_eq!(check_bytes(b"he\0llo").unwrap_err().nul_position(), 2);
    }

    #[test]
    fn join() {
        let names: [&[u8]; 2] = [b"user.a", b"user.bc"];
        assert_eq!(join_with_nul(names.iter().copied()).unwrap(), b"user.a\0user.bc\0");

        let names: [&[u8]; 2] = [b"ab", b"c\0d"];
        assert_eq!(
            join_with_nul(names.iter().copied()).unwrap_err().nul_position(),
            4
        );
    }
}
