//! tbf-core
//!
//! Codec for the Tock Binary Format header that precedes every application
//! image in flash. Pure, synchronous, no I/O: bytes in, header out, and back.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod config;
pub mod diagnostics;
pub mod utils;

pub mod headers;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::config::{EncodeOptions, PermissionsBlock, UnparsedBlocks};
    pub use crate::diagnostics::{Diagnostic, DiagnosticSink, LogSink, NullSink};
    pub use crate::headers::{
        decode, decode_with, encode, encode_with, AppName, Flag, HeaderError, Mutation,
        Permission, TbfFlags, TbfHeader, TbfHeaderV1, TbfHeaderV2,
    };
    pub use crate::utils::compute_checksum;
}
