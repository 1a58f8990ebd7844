//! headers/tlv.rs
//! Type-length-value blocks of the version 2 header.
//!
//! Layout of one block:
//!
//! ```text
//! [ type (2) ][ length (2) ][ payload (length) ][ zero padding to 4 ]
//! ```
//!
//! `length` is the payload size; the cursor always advances by `length`
//! rounded up to 4. Reads go through an explicit offset that is checked
//! against the end of the TLV area before every access.

use byteorder::{ByteOrder, LittleEndian};
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

use crate::constants::{tlv_ids, TLV_HEADER_LEN};
use crate::headers::types::HeaderError;
use crate::utils::round_up;

/// Block types this codec understands.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive, Serialize, Deserialize)]
pub enum TlvType {
    Main                  = tlv_ids::MAIN,
    WriteableFlashRegions = tlv_ids::WRITEABLE_FLASH_REGIONS,
    PackageName           = tlv_ids::PACKAGE_NAME,
    PicOption1            = tlv_ids::PIC_OPTION_1,
    Permissions           = tlv_ids::PERMISSIONS,
}

/// Borrowed view of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvBlock<'a> {
    pub kind: u16,
    /// Exactly `length` bytes; padding excluded.
    pub payload: &'a [u8],
}

impl TlvBlock<'_> {
    pub fn known_type(&self) -> Option<TlvType> {
        TlvType::try_from(self.kind).ok()
    }

    /// An all-zero word: unused room left inside `header_size`.
    pub fn is_padding(&self) -> bool {
        self.kind == 0 && self.payload.is_empty()
    }

    /// Bytes this block takes in the TLV area, header and padding included.
    pub fn wire_len(&self) -> usize {
        TLV_HEADER_LEN + round_up(self.payload.len())
    }
}

/// Structural problems hit while walking the TLV area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlvError {
    /// Declared payload extends past the end of the TLV area.
    Overrun { kind: u16, length: u16, remaining: usize },
}

/// Cursor over the TLV area `buf[start..end]`.
#[derive(Debug, Clone)]
pub struct TlvReader<'a> {
    buf: &'a [u8],
    off: usize,
    end: usize,
    start: usize,
}

impl<'a> TlvReader<'a> {
    /// `end` is clamped to the buffer so a lying header can never index past it.
    pub fn new(buf: &'a [u8], start: usize, end: usize) -> Self {
        let end = end.min(buf.len());
        let start = start.min(end);
        Self { buf, off: start, end, start }
    }

    /// Bytes of TLV budget not yet consumed.
    pub fn remaining(&self) -> usize {
        self.end - self.off
    }

    /// Bytes consumed so far, block headers and padding included.
    pub fn consumed(&self) -> usize {
        self.off - self.start
    }

    fn read_u16(&self, at: usize) -> Option<u16> {
        self.buf.get(at..at + 2).map(LittleEndian::read_u16)
    }
}

impl<'a> Iterator for TlvReader<'a> {
    type Item = Result<TlvBlock<'a>, TlvError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining() < TLV_HEADER_LEN {
            return None;
        }

        let kind = self.read_u16(self.off)?;
        let length = self.read_u16(self.off + 2)?;
        self.off += TLV_HEADER_LEN;

        let len = length as usize;
        let remaining = self.remaining();
        if len > remaining {
            // Nothing after a bad length can be trusted.
            self.off = self.end;
            return Some(Err(TlvError::Overrun { kind, length, remaining }));
        }

        let payload = &self.buf[self.off..self.off + len];
        // Padding of the final block may be cut short by header_size.
        self.off += round_up(len).min(remaining);

        Some(Ok(TlvBlock { kind, payload }))
    }
}

/// Append one block to `out`, zero-padding the payload to 4 bytes.
pub fn write_block(out: &mut Vec<u8>, kind: u16, payload: &[u8]) -> Result<(), HeaderError> {
    let length = u16::try_from(payload.len()).map_err(|_| HeaderError::BlockTooLarge {
        kind,
        have: payload.len(),
        max: u16::MAX as usize,
    })?;

    let mut head = [0u8; TLV_HEADER_LEN];
    LittleEndian::write_u16(&mut head[0..2], kind);
    LittleEndian::write_u16(&mut head[2..4], length);

    out.extend_from_slice(&head);
    out.extend_from_slice(payload);
    out.resize(out.len() + round_up(payload.len()) - payload.len(), 0);
    Ok(())
}

/// Build a payload out of little-endian words.
pub fn words_le(words: &[u32]) -> Vec<u8> {
    let mut out = vec![0u8; words.len() * 4];
    LittleEndian::write_u32_into(words, &mut out);
    out
}
