use std::fmt;
use byteorder::{ByteOrder, LittleEndian};
use num_enum::TryFromPrimitive;

use crate::constants::TLV_ALIGN;

/// XOR-fold a buffer into a 32-bit TBF checksum.
///
/// The buffer is treated as a sequence of little-endian `u32` words. A
/// trailing partial word is zero-padded, which is the same as appending
/// zero bytes until the length is a multiple of 4.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut words = data.chunks_exact(4);
    let mut checksum = words
        .by_ref()
        .fold(0u32, |acc, word| acc ^ LittleEndian::read_u32(word));

    let tail = words.remainder();
    if !tail.is_empty() {
        let mut last = [0u8; 4];
        last[..tail.len()].copy_from_slice(tail);
        checksum ^= LittleEndian::read_u32(&last);
    }

    checksum
}

/// Round `len` up to the next TLV alignment boundary.
#[inline]
pub const fn round_up(len: usize) -> usize {
    (len + TLV_ALIGN - 1) & !(TLV_ALIGN - 1)
}

pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}

pub fn fmt_bytes(b: &[u8]) -> String {
    if b.iter().all(|&c| c.is_ascii_graphic() || c == b' ') {
        format!("b\"{}\"", String::from_utf8_lossy(b))
    } else {
        format!("0x{}", hex::encode(b))
    }
}
