//! config.rs
//! Encoder policy knobs.
//!
//! Defaults give a lossless decode -> encode round trip. The alternatives
//! reproduce the byte output of the legacy loader, which dropped the
//! permissions block and any block it did not understand.

use serde::{Deserialize, Serialize};

/// Whether a PERMISSIONS block is written when the header carries permissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionsBlock {
    #[default]
    Emit,
    /// Legacy behavior: permissions are decoded but never written back.
    Omit,
}

/// What happens to blocks the decoder kept as raw bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnparsedBlocks {
    #[default]
    Preserve,
    Drop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    pub permissions_block: PermissionsBlock,
    pub unparsed_blocks: UnparsedBlocks,
}

impl EncodeOptions {
    /// Byte-for-byte what the legacy loader wrote.
    pub fn legacy() -> Self {
        Self {
            permissions_block: PermissionsBlock::Omit,
            unparsed_blocks: UnparsedBlocks::Drop,
        }
    }
}
