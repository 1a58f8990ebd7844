/// Version tags carried in the first two bytes of every header.
pub const TBF_VERSION_1: u16 = 1;
pub const TBF_VERSION_2: u16 = 2;

/// Bytes needed to read the version tag.
pub const VERSION_TAG_LEN: usize = 2;

/// Version 1: tag word + 17 field words + checksum word.
pub const V1_HEADER_LEN: usize = 76;
/// Version 1 checksum covers everything before the checksum word.
pub const V1_CHECKSUM_OFFSET: usize = 72;

/// Version 2 base: tag (2) + header_size (2) + total_size (4) + flags (4) + checksum (4).
pub const V2_BASE_LEN: usize = 16;
pub const V2_CHECKSUM_OFFSET: usize = 12;

/// Every TLV block starts with a (type: u16, length: u16) pair.
pub const TLV_HEADER_LEN: usize = 4;
/// Block bodies are zero-padded to this alignment.
pub const TLV_ALIGN: usize = 4;

/// TLV block type identifiers (mirrored in the kernel's TBF parser).
pub mod tlv_ids {
    pub const MAIN: u16                    = 0x0001;
    pub const WRITEABLE_FLASH_REGIONS: u16 = 0x0002;
    pub const PACKAGE_NAME: u16            = 0x0003;
    pub const PIC_OPTION_1: u16            = 0x0004;
    pub const PERMISSIONS: u16             = 0x0006;
}

/// Fixed payload sizes for the blocks that have one.
pub mod block_lens {
    pub const MAIN: usize                   = 12;
    pub const WRITEABLE_FLASH_REGION: usize = 8;
    pub const PIC_OPTION_1: usize           = 40;
    pub const PERMISSIONS: usize            = 8;
}

/// Flag bitmask of the version 2 flags word.
pub mod flag_bits {
    pub const ENABLED: u32 = 0x0000_0001;
    pub const STICKY: u32  = 0x0000_0002;
}
