//! src/headers/decode.rs
//!
//! Header decoding.
//!
//! Design notes:
//! - Decode is total: every buffer yields a `TbfHeader`. Structural problems
//!   show up as `is_valid() == false` plus diagnostics, never as an error.
//! - The first two bytes select the version; each version has its own reader.
//! - Version 2 checksums cover exactly `header_size` bytes with the checksum
//!   word zeroed, so they are computed on a copy of the original bytes.
//! - Unknown or malformed TLV blocks are skipped (and kept raw) so headers
//!   written by newer tools still decode.
//! - Zero words in the TLV area are padding. They are neither reported nor
//!   kept, so the encoder can reuse that room.

use byteorder::{ByteOrder, LittleEndian};
use std::str;

use crate::constants::{
    block_lens, TBF_VERSION_1, TBF_VERSION_2, V1_CHECKSUM_OFFSET, V1_HEADER_LEN,
    V2_BASE_LEN, V2_CHECKSUM_OFFSET, VERSION_TAG_LEN,
};
use crate::diagnostics::{Diagnostic, DiagnosticSink, LogSink};
use crate::headers::flags::TbfFlags;
use crate::headers::tlv::{TlvBlock, TlvError, TlvReader, TlvType};
use crate::headers::types::{
    MainBlock, PicOption1, RawTlvBlock, TbfHeader, TbfHeaderV1, TbfHeaderV2, UnparsedHeader,
    WriteableFlashRegion,
};
use crate::utils::compute_checksum;

/// Decode a header, reporting diagnostics through the `log` facade.
pub fn decode(buf: &[u8]) -> TbfHeader {
    decode_with(buf, &mut LogSink)
}

/// Decode a header, reporting diagnostics to `sink`.
pub fn decode_with<S: DiagnosticSink + ?Sized>(buf: &[u8], sink: &mut S) -> TbfHeader {
    if buf.len() < VERSION_TAG_LEN {
        return unparsed(sink, None, Diagnostic::BufferTooShort {
            have: buf.len(),
            need: VERSION_TAG_LEN,
        });
    }

    match LittleEndian::read_u16(&buf[0..2]) {
        TBF_VERSION_1 => decode_v1(buf, sink),
        TBF_VERSION_2 => decode_v2(buf, sink),
        raw => unparsed(sink, Some(raw), Diagnostic::UnknownVersion { raw }),
    }
}

fn unparsed<S: DiagnosticSink + ?Sized>(
    sink: &mut S,
    version: Option<u16>,
    reason: Diagnostic,
) -> TbfHeader {
    sink.report(reason.clone());
    TbfHeader::Unparsed(UnparsedHeader { version, reason })
}

/// Version 1: a 4-byte version word followed by 18 little-endian `u32` words.
fn decode_v1<S: DiagnosticSink + ?Sized>(buf: &[u8], sink: &mut S) -> TbfHeader {
    if buf.len() < V1_HEADER_LEN {
        return unparsed(sink, Some(TBF_VERSION_1), Diagnostic::BufferTooShort {
            have: buf.len(),
            need: V1_HEADER_LEN,
        });
    }

    let mut words = [0u32; 18];
    LittleEndian::read_u32_into(&buf[4..V1_HEADER_LEN], &mut words);

    let computed = compute_checksum(&buf[..V1_CHECKSUM_OFFSET]);
    let mut h = TbfHeaderV1 {
        total_size:                 words[0],
        entry_offset:               words[1],
        relocation_data_offset:     words[2],
        relocation_data_size:       words[3],
        text_offset:                words[4],
        text_size:                  words[5],
        got_offset:                 words[6],
        got_size:                   words[7],
        data_offset:                words[8],
        data_size:                  words[9],
        bss_memory_offset:          words[10],
        bss_memory_size:            words[11],
        minimum_stack_length:       words[12],
        minimum_app_heap_length:    words[13],
        minimum_kernel_heap_length: words[14],
        package_name_offset:        words[15],
        package_name_size:          words[16],
        checksum:                   words[17],
        valid: false,
    };

    h.valid = check(sink, h.checksum, computed);
    TbfHeader::V1(h)
}

/// Version 2: 16-byte base, then `header_size - 16` bytes of TLV blocks.
fn decode_v2<S: DiagnosticSink + ?Sized>(buf: &[u8], sink: &mut S) -> TbfHeader {
    if buf.len() < V2_BASE_LEN {
        return unparsed(sink, Some(TBF_VERSION_2), Diagnostic::BufferTooShort {
            have: buf.len(),
            need: V2_BASE_LEN,
        });
    }

    let mut h = TbfHeaderV2 {
        header_size:  LittleEndian::read_u16(&buf[2..4]),   // 2..4
        total_size:   LittleEndian::read_u32(&buf[4..8]),   // 4..8
        flags:        TbfFlags::from_bits_retain(LittleEndian::read_u32(&buf[8..12])), // 8..12
        checksum:     LittleEndian::read_u32(&buf[12..16]), // 12..16
        valid: false,
        is_app: false,
        main: None,
        writeable_flash_regions: None,
        package_name: None,
        pic_option_1: None,
        permissions: None,
        unparsed_blocks: Vec::new(),
    };

    let header_size = h.header_size as usize;
    if header_size < V2_BASE_LEN {
        sink.report(Diagnostic::HeaderSizeTooSmall { have: h.header_size, min: V2_BASE_LEN });
        return TbfHeader::V2(h);
    }
    if buf.len() < header_size {
        sink.report(Diagnostic::BufferTooShort { have: buf.len(), need: header_size });
        return TbfHeader::V2(h);
    }

    let mut copy = buf[..header_size].to_vec();
    copy[V2_CHECKSUM_OFFSET..V2_CHECKSUM_OFFSET + 4].fill(0);
    let computed = compute_checksum(&copy);

    if header_size > V2_BASE_LEN {
        h.is_app = true;
        scan_blocks(&mut h, buf, sink);
    }

    h.valid = check(sink, h.checksum, computed);
    TbfHeader::V2(h)
}

fn check<S: DiagnosticSink + ?Sized>(sink: &mut S, stored: u32, computed: u32) -> bool {
    if stored != computed {
        sink.report(Diagnostic::ChecksumMismatch { stored, computed });
        return false;
    }
    true
}

fn scan_blocks<S: DiagnosticSink + ?Sized>(h: &mut TbfHeaderV2, buf: &[u8], sink: &mut S) {
    let mut reader = TlvReader::new(buf, V2_BASE_LEN, h.header_size as usize);

    for item in reader.by_ref() {
        match item {
            Ok(block) if block.is_padding() => {}
            Ok(block) => apply_block(h, block, sink),
            Err(TlvError::Overrun { kind, length, remaining }) => {
                sink.report(Diagnostic::BlockOverrun { kind, length, remaining });
            }
        }
    }

    let budget = h.header_size as usize - V2_BASE_LEN;
    let leftover = budget - reader.consumed();
    if leftover > 0 {
        sink.report(Diagnostic::TrailingBytes { count: leftover });
    }
}

fn apply_block<S: DiagnosticSink + ?Sized>(h: &mut TbfHeaderV2, block: TlvBlock<'_>, sink: &mut S) {
    let p = block.payload;

    let Some(kind) = block.known_type() else {
        sink.report(Diagnostic::UnknownBlock { kind: block.kind, length: p.len() as u16 });
        keep_raw(h, block);
        return;
    };

    let need = match kind {
        TlvType::Main => Some(block_lens::MAIN),
        TlvType::PicOption1 => Some(block_lens::PIC_OPTION_1),
        TlvType::Permissions => Some(block_lens::PERMISSIONS),
        TlvType::WriteableFlashRegions | TlvType::PackageName => None,
    };
    let fits = match (kind, need) {
        (_, Some(need)) => p.len() == need,
        (TlvType::WriteableFlashRegions, None) => p.len() % block_lens::WRITEABLE_FLASH_REGION == 0,
        _ => true,
    };
    if !fits {
        let need = need.unwrap_or(round_down(p.len(), block_lens::WRITEABLE_FLASH_REGION));
        sink.report(Diagnostic::BlockLengthMismatch { kind: block.kind, have: p.len() as u16, need });
        keep_raw(h, block);
        return;
    }

    match kind {
        TlvType::Main => {
            h.main = Some(MainBlock {
                init_fn_offset:        LittleEndian::read_u32(&p[0..4]),
                protected_region_size: LittleEndian::read_u32(&p[4..8]),
                minimum_ram_size:      LittleEndian::read_u32(&p[8..12]),
            });
        }
        TlvType::WriteableFlashRegions => {
            let regions = h.writeable_flash_regions.get_or_insert_with(Vec::new);
            regions.extend(p.chunks_exact(block_lens::WRITEABLE_FLASH_REGION).map(|e| {
                WriteableFlashRegion {
                    offset: LittleEndian::read_u32(&e[0..4]),
                    length: LittleEndian::read_u32(&e[4..8]),
                }
            }));
        }
        TlvType::PackageName => match str::from_utf8(p) {
            Ok(name) => h.package_name = Some(name.to_string()),
            Err(_) => {
                sink.report(Diagnostic::InvalidPackageName { raw: p.to_vec() });
                keep_raw(h, block);
            }
        },
        TlvType::PicOption1 => {
            let mut w = [0u32; 10];
            LittleEndian::read_u32_into(p, &mut w);
            h.pic_option_1 = Some(PicOption1 {
                text_offset:            w[0],
                data_offset:            w[1],
                data_size:              w[2],
                bss_memory_offset:      w[3],
                bss_size:               w[4],
                relocation_data_offset: w[5],
                relocation_data_size:   w[6],
                got_offset:             w[7],
                got_size:               w[8],
                minimum_stack_length:   w[9],
            });
        }
        TlvType::Permissions => {
            h.permissions = Some(LittleEndian::read_u64(p));
        }
    }
}

fn keep_raw(h: &mut TbfHeaderV2, block: TlvBlock<'_>) {
    h.unparsed_blocks.push(RawTlvBlock { kind: block.kind, payload: block.payload.to_vec() });
}

fn round_down(len: usize, to: usize) -> usize {
    len - len % to
}
