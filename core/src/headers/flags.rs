//! headers/flags.rs
//! The version 2 flags word and the named accessors over it.

use std::str::FromStr;

use crate::constants::{flag_bits, TBF_VERSION_1};
use crate::diagnostics::Diagnostic;
use crate::headers::types::{HeaderError, TbfHeader, TbfHeaderV2};

bitflags::bitflags! {
    /// Version 2 flags word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    #[serde(transparent)]
    pub struct TbfFlags: u32 {
        /// App starts when the board boots.
        const ENABLED = flag_bits::ENABLED;

        /// App survives bulk erase.
        const STICKY = flag_bits::STICKY;

        // Bits this decoder does not name must survive a rewrite.
        const _ = !0;
    }
}

/// Named flag, as the loader tool spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Enabled,
    Sticky,
}

impl Flag {
    pub fn bits(self) -> TbfFlags {
        match self {
            Flag::Enabled => TbfFlags::ENABLED,
            Flag::Sticky => TbfFlags::STICKY,
        }
    }
}

impl FromStr for Flag {
    type Err = HeaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "enable" | "enabled" => Ok(Flag::Enabled),
            "sticky" => Ok(Flag::Sticky),
            _ => Err(HeaderError::UnknownFlag { name: s.to_string() }),
        }
    }
}

/// Outcome of a setter.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Applied,
    /// Nothing changed; the header does not support the change.
    Skipped(Diagnostic),
}

impl Mutation {
    pub fn is_applied(&self) -> bool {
        matches!(self, Mutation::Applied)
    }
}

impl TbfHeader {
    /// Mutable view for setters: only valid version 2 headers can change.
    pub(crate) fn writable_v2(&mut self) -> Result<&mut TbfHeaderV2, Diagnostic> {
        match self {
            TbfHeader::V1(_) => Err(Diagnostic::UnsupportedVersion { version: TBF_VERSION_1 }),
            TbfHeader::V2(h) if h.valid => Ok(h),
            _ => Err(Diagnostic::InvalidHeader),
        }
    }

    /// Enabled apps start at boot. Version 1 apps have no flag and always start.
    pub fn is_enabled(&self) -> bool {
        self.flag(Flag::Enabled)
    }

    /// Sticky apps are skipped by bulk erase. Version 1 apps are never sticky.
    pub fn is_sticky(&self) -> bool {
        self.flag(Flag::Sticky)
    }

    pub fn flag(&self, flag: Flag) -> bool {
        if !self.is_valid() {
            return false;
        }
        match self {
            TbfHeader::V1(_) => flag == Flag::Enabled,
            TbfHeader::V2(h) => h.flags.contains(flag.bits()),
            TbfHeader::Unparsed(_) => false,
        }
    }

    pub fn set_flag(&mut self, flag: Flag, value: bool) -> Mutation {
        match self.writable_v2() {
            Ok(h) => {
                h.flags.set(flag.bits(), value);
                Mutation::Applied
            }
            Err(skip) => Mutation::Skipped(skip),
        }
    }

    pub fn set_enabled(&mut self, value: bool) -> Mutation {
        self.set_flag(Flag::Enabled, value)
    }

    pub fn set_sticky(&mut self, value: bool) -> Mutation {
        self.set_flag(Flag::Sticky, value)
    }
}
