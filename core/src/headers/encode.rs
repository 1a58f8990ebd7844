//! src/headers/encode.rs
//!
//! Header encoding.
//!
//! Design notes:
//! - Bytes are rebuilt from the in-memory header; the stored checksum is
//!   ignored and recomputed over the freshly packed bytes.
//! - Version 2 blocks are written in a fixed order: MAIN, WRITEABLE_FLASH_REGIONS,
//!   PIC_OPTION_1, PACKAGE_NAME, PERMISSIONS, then preserved raw blocks.
//! - `header_size` never shrinks: if the blocks take less room than the stored
//!   size the rest is zero-filled, if they take more the size grows.

use byteorder::{ByteOrder, LittleEndian};

use crate::config::{EncodeOptions, PermissionsBlock, UnparsedBlocks};
use crate::constants::{
    tlv_ids, TBF_VERSION_1, TBF_VERSION_2, V1_CHECKSUM_OFFSET, V1_HEADER_LEN, V2_BASE_LEN,
    V2_CHECKSUM_OFFSET,
};
use crate::headers::tlv::{words_le, write_block};
use crate::headers::types::{HeaderError, TbfHeader, TbfHeaderV1, TbfHeaderV2};
use crate::utils::compute_checksum;

/// Serialize a header with the default (lossless) options.
pub fn encode(h: &TbfHeader) -> Result<Vec<u8>, HeaderError> {
    encode_with(h, &EncodeOptions::default())
}

pub fn encode_with(h: &TbfHeader, opts: &EncodeOptions) -> Result<Vec<u8>, HeaderError> {
    match h {
        TbfHeader::V1(v1) => Ok(encode_v1(v1).to_vec()),
        TbfHeader::V2(v2) => encode_v2(v2, opts),
        TbfHeader::Unparsed(u) => Err(HeaderError::Unencodable { version: u.version }),
    }
}

/// Serialize a version 1 header into its fixed 76-byte layout.
pub fn encode_v1(h: &TbfHeaderV1) -> [u8; V1_HEADER_LEN] {
    let words = [
        TBF_VERSION_1 as u32,          // 0..4   version (upper half reserved)
        h.total_size,                  // 4..8
        h.entry_offset,                // 8..12
        h.relocation_data_offset,      // 12..16
        h.relocation_data_size,        // 16..20
        h.text_offset,                 // 20..24
        h.text_size,                   // 24..28
        h.got_offset,                  // 28..32
        h.got_size,                    // 32..36
        h.data_offset,                 // 36..40
        h.data_size,                   // 40..44
        h.bss_memory_offset,           // 44..48
        h.bss_memory_size,             // 48..52
        h.minimum_stack_length,        // 52..56
        h.minimum_app_heap_length,     // 56..60
        h.minimum_kernel_heap_length,  // 60..64
        h.package_name_offset,         // 64..68
        h.package_name_size,           // 68..72
    ];

    let mut out = [0u8; V1_HEADER_LEN];
    LittleEndian::write_u32_into(&words, &mut out[..V1_CHECKSUM_OFFSET]);

    let checksum = compute_checksum(&out[..V1_CHECKSUM_OFFSET]);
    LittleEndian::write_u32(&mut out[V1_CHECKSUM_OFFSET..], checksum);

    out
}

/// Serialize a version 2 header: base, blocks, padding, then the checksum patch.
pub fn encode_v2(h: &TbfHeaderV2, opts: &EncodeOptions) -> Result<Vec<u8>, HeaderError> {
    let mut out = vec![0u8; V2_BASE_LEN];
    LittleEndian::write_u16(&mut out[0..2], TBF_VERSION_2);
    // 2..4 header_size is patched once the blocks are known
    LittleEndian::write_u32(&mut out[4..8], h.total_size);
    LittleEndian::write_u32(&mut out[8..12], h.flags.bits());
    // 12..16 checksum stays zero until the end

    if h.is_app {
        if let Some(main) = &h.main {
            let payload = words_le(&[
                main.init_fn_offset,
                main.protected_region_size,
                main.minimum_ram_size,
            ]);
            write_block(&mut out, tlv_ids::MAIN, &payload)?;
        }

        if let Some(regions) = &h.writeable_flash_regions {
            let words: Vec<u32> = regions.iter().flat_map(|r| [r.offset, r.length]).collect();
            write_block(&mut out, tlv_ids::WRITEABLE_FLASH_REGIONS, &words_le(&words))?;
        }

        if let Some(pic) = &h.pic_option_1 {
            let payload = words_le(&[
                pic.text_offset,
                pic.data_offset,
                pic.data_size,
                pic.bss_memory_offset,
                pic.bss_size,
                pic.relocation_data_offset,
                pic.relocation_data_size,
                pic.got_offset,
                pic.got_size,
                pic.minimum_stack_length,
            ]);
            write_block(&mut out, tlv_ids::PIC_OPTION_1, &payload)?;
        }

        if let Some(name) = &h.package_name {
            write_block(&mut out, tlv_ids::PACKAGE_NAME, name.as_bytes())?;
        }

        if let (Some(perms), PermissionsBlock::Emit) = (h.permissions, opts.permissions_block) {
            write_block(&mut out, tlv_ids::PERMISSIONS, &perms.to_le_bytes())?;
        }

        if opts.unparsed_blocks == UnparsedBlocks::Preserve {
            for raw in &h.unparsed_blocks {
                write_block(&mut out, raw.kind, &raw.payload)?;
            }
        }
    }

    let header_size = out.len().max(h.header_size as usize);
    let header_size_u16 = u16::try_from(header_size).map_err(|_| HeaderError::HeaderTooLarge {
        have: header_size,
        max: u16::MAX as usize,
    })?;
    out.resize(header_size, 0);
    LittleEndian::write_u16(&mut out[2..4], header_size_u16);

    let checksum = compute_checksum(&out);
    LittleEndian::write_u32(&mut out[V2_CHECKSUM_OFFSET..V2_CHECKSUM_OFFSET + 4], checksum);

    Ok(out)
}
