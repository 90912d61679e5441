//! ELF32 file header

use crate::bytes::{le16, le32};
use crate::error::{Elf32Error, Result};

/// `\x7fELF`
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// `e_ident[EI_CLASS]` value for 32-bit objects
pub const ELFCLASS32: u8 = 1;

/// `e_ident[EI_DATA]` value for little-endian objects
pub const ELFDATA2LSB: u8 = 1;

/// Size of the on-disk ELF32 file header
pub const EHDR_SIZE: usize = 52;

/// Decoded ELF32 file header.
///
/// Field names follow the ELF specification so they can be read next to
/// it. Only the fields a loader consumes are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf32Ehdr {
    pub e_type: u16,
    pub e_machine: u16,
    pub e_entry: u32,
    pub e_phoff: u32,
    pub e_shoff: u32,
    pub e_flags: u32,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

impl Elf32Ehdr {
    /// Decode a file header from the first `EHDR_SIZE` bytes of an image.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < EHDR_SIZE {
            return Err(Elf32Error::Truncated);
        }
        if bytes[0..4] != ELF_MAGIC {
            return Err(Elf32Error::BadMagic);
        }
        if bytes[4] != ELFCLASS32 {
            return Err(Elf32Error::NotElf32);
        }
        if bytes[5] != ELFDATA2LSB {
            return Err(Elf32Error::NotLittleEndian);
        }

        Ok(Self {
            e_type: le16(bytes, 16),
            e_machine: le16(bytes, 18),
            e_entry: le32(bytes, 24),
            e_phoff: le32(bytes, 28),
            e_shoff: le32(bytes, 32),
            e_flags: le32(bytes, 36),
            e_phentsize: le16(bytes, 42),
            e_phnum: le16(bytes, 44),
            e_shentsize: le16(bytes, 46),
            e_shnum: le16(bytes, 48),
            e_shstrndx: le16(bytes, 50),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_header() -> [u8; EHDR_SIZE] {
        let mut bytes = [0u8; EHDR_SIZE];
        bytes[0..4].copy_from_slice(&ELF_MAGIC);
        bytes[4] = ELFCLASS32;
        bytes[5] = ELFDATA2LSB;
        bytes[24..28].copy_from_slice(&0x8010u32.to_le_bytes());
        bytes[44..46].copy_from_slice(&2u16.to_le_bytes());
        bytes
    }

    #[test]
    fn parses_entry_and_counts() {
        let ehdr = Elf32Ehdr::parse(&valid_header()).unwrap();
        assert_eq!(ehdr.e_entry, 0x8010);
        assert_eq!(ehdr.e_phnum, 2);
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut bytes = valid_header();
        bytes[0] = 0x7e;
        assert_eq!(Elf32Ehdr::parse(&bytes), Err(Elf32Error::BadMagic));
    }

    #[test]
    fn rejects_sixty_four_bit_images() {
        let mut bytes = valid_header();
        bytes[4] = 2;
        assert_eq!(Elf32Ehdr::parse(&bytes), Err(Elf32Error::NotElf32));
    }

    #[test]
    fn rejects_short_input() {
        assert_eq!(
            Elf32Ehdr::parse(&valid_header()[..40]),
            Err(Elf32Error::Truncated)
        );
    }
}
