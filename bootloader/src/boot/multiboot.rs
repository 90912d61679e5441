//! Multiboot image loading (`multiboot` method)
//!
//! Finds the multiboot header in the image's first 8 KiB, builds the boot
//! information block (memory map from the firmware boot tags, command
//! line, device, framebuffer) and loads the image either a.out-style or
//! section by section for ELF images.

use alloc::string::String;
use alloc::vec;

use elf32::SHF_ALLOC;
use ember_core::atag::{Atag, AtagStream};
use ember_core::mem::{self, PhysMemory};
use ember_core::memchunk::ChunkAllocator;
use ember_core::vfs::{self, File};
use log::{error, info};

use super::config::split_first_token;
use super::context::BootContext;
use super::elf;
use super::error::BootError;
use super::info::{BootInfo, MMAP_RECORD_SIZE, MMAP_TYPE_AVAILABLE};

/// Magic leading a multiboot header inside the kernel image.
pub const MULTIBOOT_HEADER_MAGIC: u32 = 0x1BAD_B002;

/// Header flag: the image wants memory information.
const HEADER_FLAG_MEM_INFO: u32 = 1 << 1;

/// Header flag: load a.out-style from the kludge fields instead of the
/// ELF section headers.
const HEADER_FLAG_AOUT_KLUDGE: u32 = 1 << 16;

/// How far into the image the header may start.
const SCAN_LEN: usize = 8192;

/// On-disk size of the header, kludge fields included.
const HEADER_LEN: usize = 32;

/// The multiboot header as found in the kernel image.
#[derive(Debug, Clone, Copy)]
struct MultibootHeader {
    magic: u32,
    flags: u32,
    checksum: u32,
    header_addr: u32,
    load_addr: u32,
    load_end_addr: u32,
    bss_end_addr: u32,
    entry_addr: u32,
}

impl MultibootHeader {
    fn parse(bytes: &[u8]) -> Self {
        Self {
            magic: le32(bytes, 0),
            flags: le32(bytes, 4),
            checksum: le32(bytes, 8),
            header_addr: le32(bytes, 12),
            load_addr: le32(bytes, 16),
            load_end_addr: le32(bytes, 20),
            bss_end_addr: le32(bytes, 24),
            entry_addr: le32(bytes, 28),
        }
    }

    fn checksum_ok(&self) -> bool {
        self.magic
            .wrapping_add(self.flags)
            .wrapping_add(self.checksum)
            == 0
    }
}

fn le32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Scan 4-byte-aligned positions for the first header whose magic
/// matches and whose checksum relation holds. A magic hit with a bad
/// checksum does not stop the scan.
fn find_header(buf: &[u8]) -> Option<(MultibootHeader, u32)> {
    let mut offset = 0usize;
    while offset + HEADER_LEN <= buf.len() {
        if le32(buf, offset) == MULTIBOOT_HEADER_MAGIC {
            let header = MultibootHeader::parse(&buf[offset..offset + HEADER_LEN]);
            if header.checksum_ok() {
                return Some((header, offset as u32));
            }
        }
        offset += 4;
    }
    None
}

pub fn method_multiboot(ctx: &mut BootContext, args: &str) -> Result<(), BootError> {
    let (file, _) = split_first_token(args);

    let mut fp = ctx.fs.open(file).map_err(|_| {
        error!("MULTIBOOT: cannot load {}", file);
        BootError::FileOpen
    })?;

    // The header must live in the first 8 KiB.
    let mut first_8k = vec![0u8; SCAN_LEN];
    let scanned = vfs::read_up_to(&mut *fp, &mut first_8k)?;
    first_8k.truncate(scanned);

    let (header, header_offset) = match find_header(&first_8k) {
        Some(found) => found,
        None => {
            error!("MULTIBOOT: no valid multiboot header found in {}", file);
            return Err(BootError::NoMultibootHeader);
        }
    };
    drop(first_8k);

    let mut boot_info = BootInfo::new();

    if header.flags & HEADER_FLAG_MEM_INFO != 0 {
        build_memory_map(&mut boot_info, &ctx.atags);
    }

    let entry = if header.flags & HEADER_FLAG_AOUT_KLUDGE != 0 {
        load_aout(
            &mut *fp,
            &header,
            header_offset,
            &mut *ctx.chunks,
            &mut *ctx.mem,
        )?
    } else {
        load_elf_sections(&mut *fp, &mut boot_info, &mut *ctx.chunks, &mut *ctx.mem, file)?
    };
    ctx.entry_addr = entry;

    // Common tail: command line, boot device, loader identity,
    // framebuffer geometry. The kernel's device becomes the default for
    // subsequent relative lookups.
    boot_info.set_cmdline(args);
    let device = String::from(fp.device_name());
    boot_info.set_boot_device(&device);
    boot_info.set_loader_name();
    boot_info.set_framebuffer(&ctx.fb);
    ctx.fs.set_default_device(&device);
    ctx.boot_info = Some(boot_info);

    info!("MULTIBOOT: loaded kernel {}", file);
    Ok(())
}

/// Two passes over the firmware memory tags: count first (and find
/// `mem_upper`), then fill one 24-byte record per tag. The counting pass
/// sizes the buffer exactly, so the fill pass writes exactly that many
/// bytes.
fn build_memory_map(boot_info: &mut BootInfo, atags: &AtagStream) {
    let mut map_len: u32 = 0;
    let mut mem_upper: u32 = 0;
    atags.visit(|tag| {
        if let Atag::Mem { start, size } = *tag {
            let end = start.wrapping_add(size);
            // mem_upper is the KiB figure for the range crossing 1 MiB.
            if start < 0x0010_0000 && end > 0x0010_0000 {
                mem_upper = end / 1024;
            }
            map_len += MMAP_RECORD_SIZE;
        }
    });

    let mut map = vec![0u8; map_len as usize].into_boxed_slice();
    let mut cursor = 0usize;
    atags.visit(|tag| {
        if let Atag::Mem { start, size } = *tag {
            let words = [
                MMAP_RECORD_SIZE, // record size, kept in the record itself
                start,            // base addr
                0,                // upper 32 bits of base addr
                size,             // length
                0,                // upper 32 bits of length
                MMAP_TYPE_AVAILABLE,
            ];
            for (i, word) in words.iter().enumerate() {
                let at = cursor + i * 4;
                map[at..at + 4].copy_from_slice(&word.to_le_bytes());
            }
            cursor += MMAP_RECORD_SIZE as usize;
        }
    });
    debug_assert_eq!(cursor, map_len as usize);

    boot_info.set_memory_map(map, mem_upper);
}

/// a.out-style load from the header's kludge fields. Symbol tables are
/// not processed, so the matching presence bit stays unset.
fn load_aout(
    fp: &mut dyn File,
    header: &MultibootHeader,
    header_offset: u32,
    chunks: &mut dyn ChunkAllocator,
    memory: &mut dyn PhysMemory,
) -> Result<u32, BootError> {
    if header.load_addr < 0x0010_0000 {
        error!("MULTIBOOT: a.out load below 1 MiB - not supported");
        return Err(BootError::LoadBelowOneMib);
    }

    let file_offset = header_offset
        .wrapping_sub(header.header_addr)
        .wrapping_add(header.load_addr);
    let length = if header.load_end_addr != 0 {
        header.load_end_addr.wrapping_sub(header.load_addr)
    } else {
        fp.len().saturating_sub(file_offset)
    };
    let bss_length = header.bss_end_addr.saturating_sub(header.load_end_addr);

    if !chunks.reserve_at(header.load_addr, length + bss_length) {
        error!(
            "MULTIBOOT: a.out load - unable to allocate a chunk between {:#010x} and {:#010x}",
            header.load_addr,
            header.load_addr.wrapping_add(length + bss_length)
        );
        return Err(BootError::ChunkUnavailable);
    }

    let copied = mem::load_file(fp, file_offset, length, header.load_addr, memory)?;
    if copied != length {
        error!(
            "MULTIBOOT: a.out load error - tried to load {} bytes but could only load {}",
            length, copied
        );
        return Err(BootError::ShortRead);
    }

    if bss_length > 0 {
        memory.zero(header.load_addr.wrapping_add(length), bss_length);
    }

    Ok(header.entry_addr)
}

/// Section placement order: fixed addresses strictly first, so an
/// arbitrary grant can never occupy an address a later section requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadPhase {
    Fixed,
    Floating,
}

const LOAD_PHASES: [LoadPhase; 2] = [LoadPhase::Fixed, LoadPhase::Floating];

/// ELF-style load: every section is placed and loaded (multiboot hands
/// the full section table to the kernel), allocable ones at their
/// declared addresses, the rest wherever the allocator puts them, with
/// the table patched to the granted addresses.
fn load_elf_sections(
    fp: &mut dyn File,
    boot_info: &mut BootInfo,
    chunks: &mut dyn ChunkAllocator,
    memory: &mut dyn PhysMemory,
    file: &str,
) -> Result<u32, BootError> {
    let ehdr = elf::read_ehdr(fp)?;
    if ehdr.e_shoff == 0 || ehdr.e_shnum == 0 {
        error!("MULTIBOOT: {} does not contain a section table", file);
        return Err(BootError::NoSectionTable);
    }

    let mut shdrs = elf::read_shdrs(fp, &ehdr)?;

    for phase in LOAD_PHASES {
        for index in 0..shdrs.len() {
            let shdr = shdrs.get(index);
            let allocable = shdr.sh_flags & SHF_ALLOC != 0;

            match phase {
                LoadPhase::Fixed => {
                    if !allocable {
                        continue;
                    }
                    if shdr.sh_addr == 0 {
                        error!("MULTIBOOT: section {} has no defined load address", index);
                        return Err(BootError::SectionUnplaceable);
                    }
                    if shdr.sh_size == 0 {
                        error!("MULTIBOOT: section {} has no defined size", index);
                        return Err(BootError::SectionUnplaceable);
                    }
                    if !chunks.reserve_at(shdr.sh_addr, shdr.sh_size) {
                        error!(
                            "MULTIBOOT: unable to allocate a chunk between {:#010x} and {:#010x} for section {}",
                            shdr.sh_addr,
                            shdr.sh_addr.wrapping_add(shdr.sh_size),
                            index
                        );
                        return Err(BootError::ChunkUnavailable);
                    }
                    elf::load_section(fp, &shdr, memory)?;
                }
                LoadPhase::Floating => {
                    // Zero-size sections stay wherever they decoded.
                    if allocable || shdr.sh_size == 0 {
                        continue;
                    }
                    let addr = match chunks.reserve_anywhere(shdr.sh_size) {
                        Some(addr) => addr,
                        None => {
                            error!(
                                "MULTIBOOT: unable to allocate chunk of size {} for section {}",
                                shdr.sh_size, index
                            );
                            return Err(BootError::ChunkUnavailable);
                        }
                    };
                    shdrs.set_addr(index, addr);
                    elf::load_section(fp, &shdrs.get(index), memory)?;
                }
            }
        }
    }

    boot_info.set_elf_sections(shdrs, ehdr.e_shstrndx);
    Ok(ehdr.e_entry)
}
