//! headers/types.rs
//! In-memory TBF header, one record type per format version.
//!
//! Notes:
//! - Little-endian throughout; layouts are a contract with the build toolchain
//!   and the kernel, so field order here mirrors the wire order.
//! - Which fields exist is a type-level fact: version 1 has its 17 fixed words,
//!   version 2 has a small base plus optional TLV-derived members.
//! - A header is only ever produced by decoding. It never keeps a reference to
//!   the bytes it came from; `encode` rebuilds bytes from the current state.

use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{TBF_VERSION_1, TBF_VERSION_2, V1_HEADER_LEN};
use crate::diagnostics::Diagnostic;
use crate::headers::flags::TbfFlags;
use crate::headers::tlv::TlvType;
use crate::utils::{enum_name_or_hex, fmt_bytes};

/// Decoded header of either version, or the reason no version could be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TbfHeader {
    V1(TbfHeaderV1),
    V2(TbfHeaderV2),
    Unparsed(UnparsedHeader),
}

/// Legacy fixed-layout header. Always describes an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TbfHeaderV1 {
    pub total_size: u32,
    pub entry_offset: u32,
    pub relocation_data_offset: u32,
    pub relocation_data_size: u32,
    pub text_offset: u32,
    pub text_size: u32,
    pub got_offset: u32,
    pub got_size: u32,
    pub data_offset: u32,
    pub data_size: u32,
    pub bss_memory_offset: u32,
    pub bss_memory_size: u32,
    pub minimum_stack_length: u32,
    pub minimum_app_heap_length: u32,
    pub minimum_kernel_heap_length: u32,
    pub package_name_offset: u32,
    pub package_name_size: u32,
    /// Value found on the wire; recomputed on encode.
    pub checksum: u32,
    pub valid: bool,
}

/// Version 2 header: fixed base plus TLV blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TbfHeaderV2 {
    /// Bytes taken by the header including TLV area and padding.
    pub header_size: u16,
    /// Bytes taken by header + application image in flash.
    pub total_size: u32,
    pub flags: TbfFlags,
    /// Value found on the wire; recomputed on encode.
    pub checksum: u32,
    pub valid: bool,
    /// False for padding headers (no TLV area).
    pub is_app: bool,
    pub main: Option<MainBlock>,
    pub writeable_flash_regions: Option<Vec<WriteableFlashRegion>>,
    pub package_name: Option<String>,
    pub pic_option_1: Option<PicOption1>,
    pub permissions: Option<u64>,
    /// Unknown or malformed blocks, kept verbatim in wire order.
    pub unparsed_blocks: Vec<RawTlvBlock>,
}

/// Why a buffer could not be decoded as any header version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnparsedHeader {
    /// `None` when the buffer did not even hold a version tag.
    pub version: Option<u16>,
    pub reason: Diagnostic,
}

/// MAIN block (type 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainBlock {
    pub init_fn_offset: u32,
    pub protected_region_size: u32,
    pub minimum_ram_size: u32,
}

/// One entry of a WRITEABLE_FLASH_REGIONS block (type 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteableFlashRegion {
    pub offset: u32,
    pub length: u32,
}

/// Relocation strategy a PIC block describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PicStrategy {
    CStyle,
}

impl fmt::Display for PicStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PicStrategy::CStyle => write!(f, "C Style"),
        }
    }
}

/// PIC_OPTION_1 block (type 4): relocation parameters for C-style PIC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PicOption1 {
    pub text_offset: u32,
    pub data_offset: u32,
    pub data_size: u32,
    pub bss_memory_offset: u32,
    pub bss_size: u32,
    pub relocation_data_offset: u32,
    pub relocation_data_size: u32,
    pub got_offset: u32,
    pub got_size: u32,
    pub minimum_stack_length: u32,
}

impl PicOption1 {
    pub fn strategy(&self) -> PicStrategy {
        PicStrategy::CStyle
    }
}

/// A block carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTlvBlock {
    pub kind: u16,
    pub payload: Vec<u8>,
}

/// What the loader shows as an app's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppName<'a> {
    Name(&'a str),
    /// Version 1 headers only point at the name inside the image.
    Location { offset: u32, size: u32 },
    None,
}

impl TbfHeader {
    /// Version tag, if one could be read.
    pub fn version(&self) -> Option<u16> {
        match self {
            TbfHeader::V1(_) => Some(TBF_VERSION_1),
            TbfHeader::V2(_) => Some(TBF_VERSION_2),
            TbfHeader::Unparsed(u) => u.version,
        }
    }

    /// Whether the checksum and structural checks passed.
    pub fn is_valid(&self) -> bool {
        match self {
            TbfHeader::V1(h) => h.valid,
            TbfHeader::V2(h) => h.valid,
            TbfHeader::Unparsed(_) => false,
        }
    }

    /// Whether the header describes an application rather than padding.
    pub fn is_app(&self) -> bool {
        match self {
            TbfHeader::V1(_) => true,
            TbfHeader::V2(h) => h.is_app,
            TbfHeader::Unparsed(_) => false,
        }
    }

    /// Total bytes the app occupies in flash.
    pub fn app_size(&self) -> Option<u32> {
        match self {
            TbfHeader::V1(h) => Some(h.total_size),
            TbfHeader::V2(h) => Some(h.total_size),
            TbfHeader::Unparsed(_) => None,
        }
    }

    /// Size of the header itself, including trailing alignment padding.
    ///
    /// This is the length on the wire. For version 1 that is the full 76-byte
    /// record, not the 74 the legacy loader reported after the 2-byte tag.
    pub fn header_size(&self) -> Option<usize> {
        match self {
            TbfHeader::V1(_) => Some(V1_HEADER_LEN),
            TbfHeader::V2(h) => Some(h.header_size as usize),
            TbfHeader::Unparsed(_) => None,
        }
    }

    pub fn package_name(&self) -> Option<&str> {
        match self {
            TbfHeader::V2(h) => h.package_name.as_deref(),
            _ => None,
        }
    }

    pub fn app_name(&self) -> AppName<'_> {
        match self {
            TbfHeader::V1(h) => AppName::Location {
                offset: h.package_name_offset,
                size: h.package_name_size,
            },
            TbfHeader::V2(h) => match h.package_name.as_deref() {
                Some(name) => AppName::Name(name),
                None => AppName::None,
            },
            TbfHeader::Unparsed(_) => AppName::None,
        }
    }

    pub fn main(&self) -> Option<&MainBlock> {
        match self {
            TbfHeader::V2(h) => h.main.as_ref(),
            _ => None,
        }
    }

    pub fn writeable_flash_regions(&self) -> Option<&[WriteableFlashRegion]> {
        match self {
            TbfHeader::V2(h) => h.writeable_flash_regions.as_deref(),
            _ => None,
        }
    }

    pub fn pic_parameters(&self) -> Option<&PicOption1> {
        match self {
            TbfHeader::V2(h) => h.pic_option_1.as_ref(),
            _ => None,
        }
    }

    /// Raw 64-bit permissions word, if the header carries one.
    pub fn permissions(&self) -> Option<u64> {
        match self {
            TbfHeader::V2(h) => h.permissions,
            _ => None,
        }
    }
}

impl fmt::Display for TbfHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn field(f: &mut fmt::Formatter<'_>, name: &str, v: impl Into<u64>) -> fmt::Result {
            let v = v.into();
            writeln!(f, "{:<22}: {:>8} {:>#12x}", name, v, v)
        }

        if !self.is_valid() {
            writeln!(f, "INVALID!")?;
        }

        match self {
            TbfHeader::Unparsed(u) => {
                match u.version {
                    Some(v) => writeln!(f, "{:<22}: {:>8}", "version", v)?,
                    None => writeln!(f, "{:<22}: {:>8}", "version", "?")?,
                }
                writeln!(f, "{:<22}: {}", "reason", u.reason)
            }
            TbfHeader::V1(h) => {
                writeln!(f, "{:<22}: {:>8}", "version", TBF_VERSION_1)?;
                field(f, "bss_mem_offset", h.bss_memory_offset)?;
                field(f, "bss_mem_size", h.bss_memory_size)?;
                writeln!(f, "{:<22}:          {:>#12x}", "checksum", h.checksum)?;
                field(f, "data_offset", h.data_offset)?;
                field(f, "data_size", h.data_size)?;
                field(f, "entry_offset", h.entry_offset)?;
                field(f, "got_offset", h.got_offset)?;
                field(f, "got_size", h.got_size)?;
                field(f, "min_app_heap_len", h.minimum_app_heap_length)?;
                field(f, "min_kernel_heap_len", h.minimum_kernel_heap_length)?;
                field(f, "min_stack_len", h.minimum_stack_length)?;
                field(f, "package_name_offset", h.package_name_offset)?;
                field(f, "package_name_size", h.package_name_size)?;
                field(f, "rel_data_offset", h.relocation_data_offset)?;
                field(f, "rel_data_size", h.relocation_data_size)?;
                field(f, "text_offset", h.text_offset)?;
                field(f, "text_size", h.text_size)?;
                field(f, "total_size", h.total_size)
            }
            TbfHeader::V2(h) => {
                if let Some(name) = &h.package_name {
                    writeln!(f, "{:<22}: {}", "package_name", name)?;
                }
                if let Some(pic) = &h.pic_option_1 {
                    writeln!(f, "{:<22}: {}", "PIC", pic.strategy())?;
                }
                writeln!(f, "{:<22}: {:>8}", "version", TBF_VERSION_2)?;
                for (i, wfr) in h.writeable_flash_regions.iter().flatten().enumerate() {
                    writeln!(f, "writeable flash region {}", i)?;
                    writeln!(f, "  {:<20}: {:>8} {:>#12x}", "offset", wfr.offset, wfr.offset)?;
                    writeln!(f, "  {:<20}: {:>8} {:>#12x}", "length", wfr.length, wfr.length)?;
                }

                let mut fields: Vec<(&str, u64)> = vec![
                    ("checksum", h.checksum.into()),
                    ("flags", h.flags.bits().into()),
                    ("header_size", h.header_size.into()),
                    ("total_size", h.total_size.into()),
                ];
                if let Some(main) = &h.main {
                    fields.push(("init_fn_offset", main.init_fn_offset.into()));
                    fields.push(("minimum_ram_size", main.minimum_ram_size.into()));
                    fields.push(("protected_size", main.protected_region_size.into()));
                }
                if let Some(pic) = &h.pic_option_1 {
                    fields.extend([
                        ("text_offset", pic.text_offset.into()),
                        ("data_offset", pic.data_offset.into()),
                        ("data_size", pic.data_size.into()),
                        ("bss_memory_offset", pic.bss_memory_offset.into()),
                        ("bss_size", pic.bss_size.into()),
                        ("relocation_data_offset", pic.relocation_data_offset.into()),
                        ("relocation_data_size", pic.relocation_data_size.into()),
                        ("got_offset", pic.got_offset.into()),
                        ("got_size", pic.got_size.into()),
                        ("minimum_stack_length", pic.minimum_stack_length.into()),
                    ]);
                }
                if let Some(perms) = h.permissions {
                    fields.push(("permissions", perms));
                }
                fields.sort_unstable_by_key(|&(name, _)| name);

                let yes_no = |set: bool| if set { "Yes" } else { "No" };
                for (name, value) in fields {
                    match name {
                        "checksum" => writeln!(f, "{:<22}:          {:>#12x}", name, value)?,
                        "flags" => {
                            field(f, name, value)?;
                            writeln!(f, "  {:<20}: {}", "enabled", yes_no(h.flags.contains(TbfFlags::ENABLED)))?;
                            writeln!(f, "  {:<20}: {}", "sticky", yes_no(h.flags.contains(TbfFlags::STICKY)))?;
                        }
                        _ => field(f, name, value)?,
                    }
                }
                for raw in &h.unparsed_blocks {
                    let label = format!("tlv {}", enum_name_or_hex::<TlvType>(raw.kind));
                    writeln!(f, "{:<22}: {}", label, fmt_bytes(&raw.payload))?;
                }
                Ok(())
            }
        }
    }
}

/// Errors from operations that can be refused outright.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    /// Permission name not present in the kernel's capability registry.
    #[error("permission bit does not exist: {name}")]
    UnknownPermission { name: String },

    /// Flag name other than `enable`/`enabled`/`sticky`.
    #[error("unknown header flag: {name}")]
    UnknownFlag { name: String },

    /// Block payload does not fit the 16-bit length field.
    #[error("TLV block type {kind} payload too large: {have} > {max}")]
    BlockTooLarge { kind: u16, have: usize, max: usize },

    /// Assembled header does not fit the 16-bit header_size field.
    #[error("header too large: {have} > {max}")]
    HeaderTooLarge { have: usize, max: usize },

    /// Nothing was decoded, so there is nothing to encode.
    #[error("cannot encode a header that was never decoded (version {version:?})")]
    Unencodable { version: Option<u16> },
}
