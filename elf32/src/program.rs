//! ELF32 program header table

use alloc::vec::Vec;

use crate::bytes::le32;
use crate::error::{Elf32Error, Result};

/// Unused program header entry
pub const PT_NULL: u32 = 0;

/// Loadable segment
pub const PT_LOAD: u32 = 1;

/// Size of the on-disk ELF32 program header record
pub const PHDR_SIZE: usize = 32;

/// Decoded program header record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf32Phdr {
    pub p_type: u32,
    pub p_offset: u32,
    pub p_vaddr: u32,
    pub p_paddr: u32,
    pub p_filesz: u32,
    pub p_memsz: u32,
    pub p_flags: u32,
    pub p_align: u32,
}

impl Elf32Phdr {
    fn decode(bytes: &[u8]) -> Self {
        Self {
            p_type: le32(bytes, 0),
            p_offset: le32(bytes, 4),
            p_vaddr: le32(bytes, 8),
            p_paddr: le32(bytes, 12),
            p_filesz: le32(bytes, 16),
            p_memsz: le32(bytes, 20),
            p_flags: le32(bytes, 24),
            p_align: le32(bytes, 28),
        }
    }
}

/// A program header table, kept as the raw bytes read from the image and
/// decoded entry by entry with the stride the file header declared.
pub struct ProgramHeaderTable {
    buf: Vec<u8>,
    num: u16,
    entsize: u16,
}

impl ProgramHeaderTable {
    /// Wrap the raw table bytes. `num` and `entsize` come from the file
    /// header; the buffer must cover `num * entsize` bytes.
    pub fn new(buf: Vec<u8>, num: u16, entsize: u16) -> Result<Self> {
        if (entsize as usize) < PHDR_SIZE {
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

    /// Decode entry `index`. Panics when `index` is out of bounds.
    pub fn get(&self, index: usize) -> Elf32Phdr {
        assert!(index < self.len());
        let start = index * self.entsize as usize;
        Elf32Phdr::decode(&self.buf[start..start + PHDR_SIZE])
    }

    pub fn iter(&self) -> impl Iterator<Item = Elf32Phdr> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}
