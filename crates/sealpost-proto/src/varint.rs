//! Unsigned varint codec.
//!
//! Values are written as 7-bit groups, least significant group first. Every
//! byte except the last has the continuation bit (`0x80`) set.
//!
//! ```text
//! 1     -> 01
//! 300   -> ac 02
//! 2^63-1 -> ff ff ff ff ff ff ff ff 7f
//! ```
//!
//! The codec accepts zero and the full `u64` range. Device-id range checks
//! belong to the caller.

use bytes::{Buf, BufMut};

use crate::errors::VarintError;

/// Longest encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

const CONTINUATION: u8 = 0x80;
const GROUP_MASK: u64 = 0x7f;

/// Append the encoding of `value` to `buf`.
pub fn encode(mut value: u64, buf: &mut impl BufMut) {
    while value >= u64::from(CONTINUATION) {
        buf.put_u8(((value & GROUP_MASK) as u8) | CONTINUATION);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Encode `value` into a fresh vector.
pub fn encode_to_vec(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(value));
    encode(value, &mut out);
    out
}

/// Number of bytes `encode` writes for `value`.
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Decode one varint from the front of `buf`, advancing past it.
///
/// Fails with [`VarintError::Truncated`] if the input ends before a
/// terminating byte and [`VarintError::Overflow`] if the value needs more than
/// 64 bits. Non-canonical encodings (redundant trailing zero groups) are
/// accepted.
pub fn decode(buf: &mut impl Buf) -> Result<u64, VarintError> {
    let mut value = 0u64;

    for read in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(VarintError::Truncated { read });
        }

        let byte = buf.get_u8();
        let group = u64::from(byte) & GROUP_MASK;
        let shift = 7 * read as u32;

        // The tenth byte only has room for the top bit of a u64.
        if read == MAX_VARINT_LEN - 1 && group > 1 {
            return Err(VarintError::Overflow);
        }
        value |= group << shift;

        if byte & CONTINUATION == 0 {
            return Ok(value);
        }
    }

    Err(VarintError::Overflow)
}
