//! ELF load plumbing
//!
//! Bridges the decoded `elf32` records to the VFS and the physical
//! memory seam: reads header tables out of a file and places segment or
//! section bytes at their physical addresses. The allocator grants are
//! the caller's job; this module only moves bytes.

use alloc::vec;

use elf32::{Elf32Ehdr, Elf32Phdr, Elf32Shdr, ProgramHeaderTable, SectionTable, EHDR_SIZE};
use ember_core::mem::{self, PhysMemory};
use ember_core::vfs::{self, File};
use log::error;

use super::error::BootError;

/// Decode the file header from the start of `file`.
pub fn read_ehdr(file: &mut dyn File) -> Result<Elf32Ehdr, BootError> {
    let mut bytes = [0u8; EHDR_SIZE];
    file.seek(0)?;
    vfs::read_exact(file, &mut bytes)?;
    Ok(Elf32Ehdr::parse(&bytes)?)
}

/// Read the program header table the file header points at.
pub fn read_phdrs(file: &mut dyn File, ehdr: &Elf32Ehdr) -> Result<ProgramHeaderTable, BootError> {
    if ehdr.e_phoff == 0 || ehdr.e_phnum == 0 {
        return Err(BootError::InvalidImage);
    }
    let len = ehdr.e_phnum as usize * ehdr.e_phentsize as usize;
    let mut buf = vec![0u8; len];
    file.seek(ehdr.e_phoff)?;
    vfs::read_exact(file, &mut buf)?;
    Ok(ProgramHeaderTable::new(buf, ehdr.e_phnum, ehdr.e_phentsize)?)
}

/// Read the section header table the file header points at.
pub fn read_shdrs(file: &mut dyn File, ehdr: &Elf32Ehdr) -> Result<SectionTable, BootError> {
    let len = ehdr.e_shnum as usize * ehdr.e_shentsize as usize;
    let mut buf = vec![0u8; len];
    file.seek(ehdr.e_shoff)?;
    vfs::read_exact(file, &mut buf)?;
    Ok(SectionTable::new(buf, ehdr.e_shnum, ehdr.e_shentsize)?)
}

/// Place one loadable segment: copy its file-backed bytes to `p_vaddr`
/// and zero the rest of the memory image (bss within the segment).
pub fn load_segment(
    file: &mut dyn File,
    phdr: &Elf32Phdr,
    memory: &mut dyn PhysMemory,
) -> Result<(), BootError> {
    let copied = mem::load_file(file, phdr.p_offset, phdr.p_filesz, phdr.p_vaddr, memory)?;
    if copied != phdr.p_filesz {
        error!(
            "ELF: segment at {:#010x} needs {} bytes but the file holds {}",
            phdr.p_vaddr, phdr.p_filesz, copied
        );
        return Err(BootError::ShortRead);
    }
    if phdr.p_memsz > phdr.p_filesz {
        memory.zero(phdr.p_vaddr + phdr.p_filesz, phdr.p_memsz - phdr.p_filesz);
    }
    Ok(())
}

/// Place one section at its (possibly relocated) `sh_addr`: copy file
/// bytes for content sections, zero-fill for `SHT_NOBITS` ones.
pub fn load_section(
    file: &mut dyn File,
    shdr: &Elf32Shdr,
    memory: &mut dyn PhysMemory,
) -> Result<(), BootError> {
    if !shdr.has_file_bytes() {
        memory.zero(shdr.sh_addr, shdr.sh_size);
        return Ok(());
    }
    let copied = mem::load_file(file, shdr.sh_offset, shdr.sh_size, shdr.sh_addr, memory)?;
    if copied != shdr.sh_size {
        error!(
            "ELF: section at {:#010x} needs {} bytes but the file holds {}",
            shdr.sh_addr, shdr.sh_size, copied
        );
        return Err(BootError::ShortRead);
    }
    Ok(())
}
