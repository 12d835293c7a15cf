//! The protocol's variable-length integer.
//! [Protocol: VarInt](https://wiki.vg/Protocol#VarInt_and_VarLong)
//!
//! Seven data bits per byte, least-significant group first, with the high
//! bit set on every byte except the last.

use thiserror::Error;

/// The most bytes a VarInt may occupy on the wire.
pub const MAX_LEN: usize = 5;

const SEGMENT_BITS: u8 = 0x7f;
const CONTINUE_BIT: u8 = 0x80;

/// Faults raised by the VarInt codec.
///
/// These indicate a caller or compatibility problem, not a network
/// condition, so they are the only errors this crate lets escape.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum VarIntError {
    #[error("value `{0}` is too large for a 5-byte VarInt")]
    EncodeTooLarge(u64),
    #[error("buffer ended before the VarInt was complete")]
    BufferUnderflow,
    #[error("VarInt is malformed: 5 bytes read with the continuation bit still set")]
    Malformed,
}

/// Encodes `value` using the shortest possible representation.
///
/// Values at or above `2^35` would need a sixth byte and are rejected.
///
/// # Errors
/// [`VarIntError::EncodeTooLarge`] if the value does not fit in 5 bytes.
pub fn encode(value: u64) -> Result<Vec<u8>, VarIntError> {
    let mut out = Vec::with_capacity(MAX_LEN);
    let mut rest = value;
    loop {
        #[allow(clippy::cast_possible_truncation)]
        let byte = (rest as u8) & SEGMENT_BITS;
        rest >>= 7;
        if rest == 0 {
            out.push(byte);
            return Ok(out);
        }
        if out.len() + 1 >= MAX_LEN {
            return Err(VarIntError::EncodeTooLarge(value));
        }
        out.push(byte | CONTINUE_BIT);
    }
}

/// Appends the encoding of a `u32` to `buf`. Every `u32` fits in 5 bytes.
pub fn write(buf: &mut Vec<u8>, value: u32) {
    let mut rest = value;
    loop {
        #[allow(clippy::cast_possible_truncation)]
        let byte = (rest as u8) & SEGMENT_BITS;
        rest >>= 7;
        if rest == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | CONTINUE_BIT);
    }
}

/// Decodes a VarInt starting at `offset`.
///
/// Returns the value and the number of bytes it occupied. Never looks at
/// more than [`MAX_LEN`] bytes past `offset`.
///
/// # Errors
/// [`VarIntError::BufferUnderflow`] if the buffer ends first,
/// [`VarIntError::Malformed`] if the fifth byte still has its continuation bit set.
pub fn decode(buf: &[u8], offset: usize) -> Result<(u32, usize), VarIntError> {
    let mut value: u32 = 0;
    for i in 0..MAX_LEN {
        let byte = *buf.get(offset + i).ok_or(VarIntError::BufferUnderflow)?;
        value |= u32::from(byte & SEGMENT_BITS) << (7 * i);
        if byte & CONTINUE_BIT == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(VarIntError::Malformed)
}
