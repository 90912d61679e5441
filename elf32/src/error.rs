//! Error types for ELF32 decoding

use core::fmt;

/// Result type for ELF32 decoding
pub type Result<T> = core::result::Result<T, Elf32Error>;

/// Errors that can occur while decoding ELF32 records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elf32Error {
    /// First four bytes are not `\x7fELF`
    BadMagic,

    /// File is ELF but not 32-bit
    NotElf32,

    /// File is ELF but not little-endian
    NotLittleEndian,

    /// Record ends before its fixed layout does
    Truncated,

    /// Table entry stride smaller than the record layout
    BadEntrySize,

    /// Table buffer too small for the declared entry count
    ShortTable,
}

impl fmt::Display for Elf32Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMagic => write!(f, "not an ELF image"),
            Self::NotElf32 => write!(f, "not a 32-bit ELF image"),
            Self::NotLittleEndian => write!(f, "not a little-endian ELF image"),
            Self::Truncated => write!(f, "truncated ELF record"),
            Self::BadEntrySize => write!(f, "table entry size below record layout"),
            Self::ShortTable => write!(f, "table buffer shorter than declared"),
        }
    }
}
