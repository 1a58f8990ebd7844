//! headers/mod.rs
//! Tock Binary Format application headers.
//!
//! Notes:
//! - Two incompatible layouts share the 2-byte version tag: a fixed 76-byte
//!   version 1 record, and a version 2 base followed by TLV blocks.
//! - `decode` never fails; `encode` rebuilds bytes and recomputes the checksum.
//! - Flags and permissions are edited on the decoded value only.

pub mod types;
pub mod tlv;
pub mod flags;
pub mod permissions;
pub mod encode;
pub mod decode;

pub use types::*;
pub use flags::{Flag, Mutation, TbfFlags};
pub use permissions::Permission;
pub use tlv::{TlvBlock, TlvReader, TlvType};
pub use encode::*;
pub use decode::*;
