//! Compact length-prefix codec.
//!
//! Byte payloads on the worker wire are framed as `<compact-len><bytes>`.
//! The prefix is the sidechain ecosystem's compact encoding of an unsigned
//! integer: the two low bits of the first byte select the width class, the
//! remaining bits (and any following little-endian bytes) hold the value.
//!
//! ```bytes
//! 0b00  single byte          values 0..=63
//! 0b01  two bytes, LE        values 64..=16383
//! 0b10  four bytes, LE       values 16384..=2^30-1
//! 0b11  (n+4) following LE bytes, count in the upper six bits
//! ```
//!
//! The width table must match the worker bit-for-bit; a mismatch corrupts
//! payload framing silently rather than failing a decode.

use std::convert::TryFrom;

use crate::error::Error;
use crate::Result;

const SINGLE_BYTE_MAX: u64 = 0x3f;
const TWO_BYTE_MAX: u64 = 0x3fff;
const FOUR_BYTE_MAX: u64 = 0x3fff_ffff;

/// Encode an unsigned integer with the minimal-width compact encoding.
pub fn compact_len_encode(len: usize) -> Vec<u8> {
    let len = len as u64;
    match len {
        0..=SINGLE_BYTE_MAX => vec![(len as u8) << 2],
        0x40..=TWO_BYTE_MAX => (((len as u16) << 2) | 0b01).to_le_bytes().to_vec(),
        0x4000..=FOUR_BYTE_MAX => (((len as u32) << 2) | 0b10).to_le_bytes().to_vec(),
        _ => {
            let value_bytes = 8 - len.leading_zeros() as usize / 8;
            let mut encoded = Vec::with_capacity(1 + value_bytes);
            encoded.push(0b11 | (((value_bytes - 4) as u8) << 2));
            let mut remaining = len;
            for _ in 0..value_bytes {
                encoded.push(remaining as u8);
                remaining >>= 8;
            }
            encoded
        }
    }
}

/// Decode a compact unsigned integer from the front of `bytes`.
/// Returns the value and the number of prefix bytes consumed.
pub fn compact_len_decode(bytes: &[u8]) -> Result<(u64, usize)> {
    let first = *bytes.first().ok_or(Error::MalformedLength)?;
    match first & 0b11 {
        0b00 => Ok(((first >> 2) as u64, 1)),
        0b01 => {
            if bytes.len() < 2 {
                return Err(Error::MalformedLength);
            }
            let value = u16::from_le_bytes([bytes[0], bytes[1]]) >> 2;
            Ok((value as u64, 2))
        }
        0b10 => {
            if bytes.len() < 4 {
                return Err(Error::MalformedLength);
            }
            let value = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) >> 2;
            Ok((value as u64, 4))
        }
        _ => {
            let value_bytes = (first >> 2) as usize + 4;
            // Lengths are capped at u64; wider headers are unrepresentable here.
            if value_bytes > 8 {
                return Err(Error::MalformedLength);
            }
            if bytes.len() < 1 + value_bytes {
                return Err(Error::MalformedLength);
            }
            let mut value: u64 = 0;
            for (index, byte) in bytes[1..1 + value_bytes].iter().enumerate() {
                value |= (*byte as u64) << (8 * index);
            }
            Ok((value, 1 + value_bytes))
        }
    }
}

/// Frame `payload` as `<compact-len><bytes>`.
pub fn compact_add_length(payload: &[u8]) -> Vec<u8> {
    let mut framed = compact_len_encode(payload.len());
    framed.extend_from_slice(payload);
    framed
}

/// Strip the length prefix from the front of `bytes` and return the payload
/// plus the total number of bytes consumed (prefix + payload).
///
/// Fails with [`Error::TruncatedInput`] when the declared length exceeds the
/// remaining buffer; never returns a partial payload.
pub fn compact_strip_length(bytes: &[u8]) -> Result<(Vec<u8>, usize)> {
    let (declared, prefix_len) = compact_len_decode(bytes)?;
    let declared = usize::try_from(declared).map_err(|_| Error::MalformedLength)?;
    let end = prefix_len.checked_add(declared).ok_or(Error::MalformedLength)?;
    if bytes.len() < end {
        return Err(Error::TruncatedInput);
    }
    Ok((bytes[prefix_len..end].to_vec(), end))
}
