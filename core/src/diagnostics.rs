//! diagnostics.rs
//! Non-fatal findings reported while decoding or mutating a header.
//!
//! Decode never fails. Everything that would otherwise be printed goes through
//! a [`DiagnosticSink`] handed in by the caller, so the codec itself has no
//! output of its own and tests can inspect exactly what was reported.

use std::fmt;
use log::Level;
use serde::{Deserialize, Serialize};

use crate::headers::tlv::TlvType;
use crate::utils::{enum_name_or_hex, fmt_bytes};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// Buffer shorter than the fixed part of the header.
    BufferTooShort { have: usize, need: usize },

    /// Version tag is neither 1 nor 2.
    UnknownVersion { raw: u16 },

    /// `header_size` smaller than the 16-byte version 2 base.
    HeaderSizeTooSmall { have: u16, min: usize },

    /// Stored checksum does not match the recomputed one.
    ChecksumMismatch { stored: u32, computed: u32 },

    /// Block type this decoder does not know; skipped.
    UnknownBlock { kind: u16, length: u16 },

    /// Known block whose declared length differs from its fixed size; ignored.
    BlockLengthMismatch { kind: u16, have: u16, need: usize },

    /// Block payload runs past the end of the header.
    BlockOverrun { kind: u16, length: u16, remaining: usize },

    /// Fewer than 4 bytes left in the TLV area after the last block.
    TrailingBytes { count: usize },

    /// Package name block is not UTF-8; kept as a raw block.
    InvalidPackageName { raw: Vec<u8> },

    /// Flag or permission change requested on a version 1 header.
    UnsupportedVersion { version: u16 },

    /// Flag or permission change requested on a header that failed validation.
    InvalidHeader,
}

impl Diagnostic {
    /// Log level used by [`LogSink`].
    pub fn level(&self) -> Level {
        use Diagnostic::*;
        match self {
            ChecksumMismatch { .. }
            | BlockOverrun { .. }
            | UnknownBlock { .. }
            | InvalidPackageName { .. } => Level::Warn,
            BufferTooShort { .. }
            | UnknownVersion { .. }
            | HeaderSizeTooSmall { .. }
            | BlockLengthMismatch { .. }
            | TrailingBytes { .. } => Level::Info,
            UnsupportedVersion { .. } | InvalidHeader => Level::Debug,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Diagnostic::*;
        match self {
            BufferTooShort { have, need } =>
                write!(f, "header buffer too short: {} < {}", have, need),
            UnknownVersion { raw } =>
                write!(f, "unknown TBF version: {}", raw),
            HeaderSizeTooSmall { have, min } =>
                write!(f, "header_size {} is below the {} byte base", have, min),
            ChecksumMismatch { stored, computed } =>
                write!(f, "checksum mismatch: in header {:#x}, calculated {:#x}", stored, computed),
            UnknownBlock { kind, length } =>
                write!(f, "unknown TLV block in TBF header: type {}, length {}", kind, length),
            BlockLengthMismatch { kind, have, need } =>
                write!(f, "{} block has length {}, expected {}",
                    enum_name_or_hex::<TlvType>(*kind), have, need),
            BlockOverrun { kind, length, remaining } =>
                write!(f, "{} block of length {} overruns header ({} bytes left)",
                    enum_name_or_hex::<TlvType>(*kind), length, remaining),
            TrailingBytes { count } =>
                write!(f, "{} trailing bytes after last TLV block", count),
            InvalidPackageName { raw } =>
                write!(f, "package name is not UTF-8: {}", fmt_bytes(raw)),
            UnsupportedVersion { version } =>
                write!(f, "version {} headers have no flags or permissions", version),
            InvalidHeader =>
                write!(f, "header is not valid; refusing to modify it"),
        }
    }
}

/// Collaborator receiving diagnostics from the codec.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Collects everything; handy for tests and for tools that render a report.
impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Forwards diagnostics to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        log::log!(target: "tbf", diagnostic.level(), "{}", diagnostic);
    }
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}
