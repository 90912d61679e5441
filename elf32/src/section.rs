//! ELF32 section header table

use alloc::vec::Vec;

use crate::bytes::{le32, put_le32};
use crate::error::{Elf32Error, Result};

/// Unused section header entry
pub const SHT_NULL: u32 = 0;

/// Section occupies no file bytes (zero-filled at load time)
pub const SHT_NOBITS: u32 = 8;

/// Section occupies memory at run time
pub const SHF_ALLOC: u32 = 0x2;

/// Size of the on-disk ELF32 section header record
pub const SHDR_SIZE: usize = 40;

/// Byte offset of `sh_addr` within a section header record
const SH_ADDR_OFFSET: usize = 12;

/// Decoded section header record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf32Shdr {
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u32,
    pub sh_addr: u32,
    pub sh_offset: u32,
    pub sh_size: u32,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u32,
    pub sh_entsize: u32,
}

impl Elf32Shdr {
    fn decode(bytes: &[u8]) -> Self {
        Self {
            sh_name: le32(bytes, 0),
            sh_type: le32(bytes, 4),
            sh_flags: le32(bytes, 8),
            sh_addr: le32(bytes, SH_ADDR_OFFSET),
            sh_offset: le32(bytes, 16),
            sh_size: le32(bytes, 20),
            sh_link: le32(bytes, 24),
            sh_info: le32(bytes, 28),
            sh_addralign: le32(bytes, 32),
            sh_entsize: le32(bytes, 36),
        }
    }

    /// True when the section's bytes exist in the file (as opposed to a
    /// zero-filled `SHT_NOBITS` section).
    pub fn has_file_bytes(&self) -> bool {
        self.sh_type != SHT_NOBITS
    }
}

/// A section header table that owns its raw bytes.
///
/// The owning buffer is what a boot loader hands onward to the booted
/// image, so address patching (`set_addr`) writes back into the buffer
/// rather than into decoded copies.
pub struct SectionTable {
    buf: Vec<u8>,
    num: u16,
    entsize: u16,
}

impl SectionTable {
    /// Wrap the raw table bytes. `num` and `entsize` come from the file
    /// header; the buffer must cover `num * entsize` bytes.
    pub fn new(buf: Vec<u8>, num: u16, entsize: u16) -> Result<Self> {
        if (entsize as usize) < SHDR_SIZE {
            return Err(Elf32Error::BadEntrySize);
        }
        if buf.len() < num as usize * entsize as usize {
            return Err(Elf32Error::ShortTable);
        }
        Ok(Self { buf, num, entsize })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.num as usize
    }

    pub fn is_empty(&self) -> bool {
        self.num == 0
    }

    /// Entry stride as declared by the file header.
    pub fn entsize(&self) -> u16 {
        self.entsize
    }

    /// Base address of the raw table bytes.
    pub fn as_ptr(&self) -> *const u8 {
        self.buf.as_ptr()
    }

    /// Decode entry `index`. Panics when `index` is out of bounds.
    pub fn get(&self, index: usize) -> Elf32Shdr {
        assert!(index < self.len());
        let start = index * self.entsize as usize;
        Elf32Shdr::decode(&self.buf[start..start + SHDR_SIZE])
    }

    /// Patch entry `index`'s `sh_addr` in place.
    pub fn set_addr(&mut self, index: usize, addr: u32) {
        assert!(index < self.len());
        let start = index * self.entsize as usize;
        put_le32(&mut self.buf, start + SH_ADDR_OFFSET, addr);
    }

    pub fn iter(&self) -> impl Iterator<Item = Elf32Shdr> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn one_section(flags: u32, addr: u32, size: u32) -> Vec<u8> {
        let mut buf = vec![0u8; SHDR_SIZE];
        buf[8..12].copy_from_slice(&flags.to_le_bytes());
        buf[12..16].copy_from_slice(&addr.to_le_bytes());
        buf[20..24].copy_from_slice(&size.to_le_bytes());
        buf
    }

    #[test]
    fn decodes_flags_address_and_size() {
        let table = SectionTable::new(one_section(SHF_ALLOC, 0x9000, 0x200), 1, 40).unwrap();
        let sh = table.get(0);
        assert_eq!(sh.sh_flags & SHF_ALLOC, SHF_ALLOC);
        assert_eq!(sh.sh_addr, 0x9000);
        assert_eq!(sh.sh_size, 0x200);
    }

    #[test]
    fn set_addr_patches_the_raw_bytes() {
        let mut table = SectionTable::new(one_section(0, 0, 0x80), 1, 40).unwrap();
        table.set_addr(0, 0x0030_0000);
        assert_eq!(table.get(0).sh_addr, 0x0030_0000);
        // And the raw buffer the kernel will see was itself rewritten.
        let raw = unsafe { core::slice::from_raw_parts(table.as_ptr(), SHDR_SIZE) };
        assert_eq!(&raw[12..16], &0x0030_0000u32.to_le_bytes());
    }

    #[test]
    fn nobits_sections_have_no_file_bytes() {
        let mut buf = one_section(SHF_ALLOC, 0x9000, 0x200);
        buf[4..8].copy_from_slice(&SHT_NOBITS.to_le_bytes());
        let table = SectionTable::new(buf, 1, 40).unwrap();
        assert!(!table.get(0).has_file_bytes());
    }
}
