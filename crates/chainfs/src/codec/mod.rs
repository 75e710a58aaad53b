//! Fixed-width encodings shared by every on-disk field.

#[cfg(test)]
mod codec_tests;

use crate::error::{FsError, FsResult};

/// `write_int` stores `value` big-endian into `dst`, using all of `dst` as the field width.
///
/// # Errors
/// Returns `InvalidArgument` if the value does not fit, or the field is wider than 8 bytes.
pub fn write_int(dst: &mut [u8], value: u64) -> FsResult<()> {
    let width = dst.len();
    if width == 0 || width > 8 {
        return Err(FsError::InvalidArgument);
    }
    if width < 8 && value >> (width * 8) != 0 {
        return Err(FsError::InvalidArgument);
    }
    dst.copy_from_slice(&value.to_be_bytes()[8 - width..]);
    Ok(())
}

/// `encode_int` returns `value` as an unsigned big-endian integer `width` bytes wide.
///
/// # Errors
/// Returns `InvalidArgument` if `value` does not fit in `width` bytes.
pub fn encode_int(value: u64, width: usize) -> FsResult<Vec<u8>> {
    let mut out = vec![0u8; width];
    write_int(&mut out, value)?;
    Ok(out)
}

/// `decode_int` reads an unsigned big-endian integer spanning all of `bytes`.
#[must_use]
pub fn decode_int(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte))
}

/// `encode_name` packs an ASCII path into a zero-padded field of `name_size` bytes.
///
/// An empty path stands for the root.
///
/// # Errors
/// Returns `InvalidArgument` for non-ASCII paths, embedded NUL bytes, or paths longer
/// than `name_size`.
pub fn encode_name(path: &str, name_size: usize) -> FsResult<Vec<u8>> {
    let name = if path.is_empty() { "/" } else { path };
    if !name.is_ascii() || name.bytes().any(|b| b == 0) || name.len() > name_size {
        return Err(FsError::InvalidArgument);
    }
    let mut out = vec![0u8; name_size];
    out[..name.len()].copy_from_slice(name.as_bytes());
    Ok(out)
}

/// `decode_name` reads a name field up to its first zero byte.
#[must_use]
pub fn decode_name(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| char::from(b))
        .collect()
}
