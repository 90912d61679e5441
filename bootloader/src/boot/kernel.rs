//! Plain kernel loading (`kernel` method)
//!
//! Classifies the image by its leading bytes and drives the matching
//! load path. Flat binaries land wherever the allocator (or a previously
//! configured fixed address) puts them and set no entry point; ELF
//! kernels load per program header and take their entry address from the
//! file header; Linux zImages are refused.

use ember_core::mem;
use ember_core::vfs;
use log::error;

use super::config::split_first_token;
use super::context::BootContext;
use super::elf;
use super::error::BootError;

/// 32-bit magic found at offset 0x24 of an ARM Linux zImage.
const LINUX_ZIMAGE_MAGIC: u32 = 0x016F_2818;

/// Byte offset of the zImage magic within the probe buffer.
const LINUX_MAGIC_OFFSET: usize = 0x24;

/// How much of the file the classifier looks at.
const PROBE_LEN: usize = 0x30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KernelKind {
    FlatBinary,
    Elf,
    LinuxImage,
}

fn classify(probe: &[u8]) -> KernelKind {
    if probe.len() >= 4 && probe[0..4] == [0x7f, b'E', b'L', b'F'] {
        return KernelKind::Elf;
    }
    if probe.len() >= PROBE_LEN {
        let magic = u32::from_le_bytes([
            probe[LINUX_MAGIC_OFFSET],
            probe[LINUX_MAGIC_OFFSET + 1],
            probe[LINUX_MAGIC_OFFSET + 2],
            probe[LINUX_MAGIC_OFFSET + 3],
        ]);
        if magic == LINUX_ZIMAGE_MAGIC {
            return KernelKind::LinuxImage;
        }
    }
    KernelKind::FlatBinary
}

pub fn method_kernel(ctx: &mut BootContext, args: &str) -> Result<(), BootError> {
    let (file, _) = split_first_token(args);

    let mut fp = ctx.fs.open(file).map_err(|_| {
        error!("KERNEL: unable to load {}", file);
        BootError::FileOpen
    })?;

    let mut probe = [0u8; PROBE_LEN];
    let probed = vfs::read_up_to(&mut *fp, &mut probe)?;
    if probed == 0 {
        error!("KERNEL: error reading from {}", file);
        return Err(BootError::ShortRead);
    }

    match classify(&probe[..probed]) {
        KernelKind::FlatBinary => load_flat_binary(ctx, &mut *fp, file),
        KernelKind::Elf => load_elf_kernel(ctx, &mut *fp, file),
        KernelKind::LinuxImage => {
            error!("KERNEL: Linux kernels not currently supported");
            Err(BootError::LinuxImage)
        }
    }
}

/// Flat binaries have no embedded entry address under this boot variant,
/// so the entry point is left untouched.
fn load_flat_binary(
    ctx: &mut BootContext,
    fp: &mut dyn vfs::File,
    file: &str,
) -> Result<(), BootError> {
    let length = fp.len();

    let address = if ctx.binary_load_addr != 0 {
        if !ctx.chunks.reserve_at(ctx.binary_load_addr, length) {
            error!(
                "KERNEL: unable to allocate {} bytes at {:#010x} for kernel {}",
                length, ctx.binary_load_addr, file
            );
            return Err(BootError::ChunkUnavailable);
        }
        ctx.binary_load_addr
    } else {
        match ctx.chunks.reserve_anywhere(length) {
            Some(addr) => {
                ctx.binary_load_addr = addr;
                addr
            }
            None => {
                error!(
                    "KERNEL: unable to allocate {} bytes for kernel {}",
                    length, file
                );
                return Err(BootError::ChunkUnavailable);
            }
        }
    };

    let copied = mem::load_file(fp, 0, length, address, ctx.mem)?;
    if copied != length {
        error!(
            "KERNEL: unable to load kernel {} - only {} bytes loaded",
            file, copied
        );
        return Err(BootError::ShortRead);
    }

    Ok(())
}

fn load_elf_kernel(
    ctx: &mut BootContext,
    fp: &mut dyn vfs::File,
    _file: &str,
) -> Result<(), BootError> {
    let ehdr = elf::read_ehdr(fp)?;
    let phdrs = elf::read_phdrs(fp, &ehdr)?;

    for (index, phdr) in phdrs.iter().enumerate() {
        if phdr.p_type != elf32::PT_LOAD {
            continue;
        }

        if !ctx.chunks.reserve_at(phdr.p_vaddr, phdr.p_memsz) {
            error!(
                "KERNEL: unable to allocate a chunk between {:#010x} and {:#010x} for segment {}",
                phdr.p_vaddr,
                phdr.p_vaddr.wrapping_add(phdr.p_memsz),
                index
            );
            return Err(BootError::ChunkUnavailable);
        }

        elf::load_segment(fp, &phdr, ctx.mem)?;
    }

    ctx.entry_addr = ehdr.e_entry;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boot::testutil::{build_elf_kernel, Grant, TestRig};

    #[test]
    fn flat_binary_loads_byte_for_byte() {
        let payload: alloc::vec::Vec<u8> = (0u32..200).map(|i| (i % 251) as u8).collect();
        let mut rig = TestRig::new();
        rig.add_file("k.bin", payload.clone());

        let mut ctx = rig.context();
        method_kernel(&mut ctx, "k.bin").unwrap();
        assert_eq!(ctx.entry_addr, 0, "flat binaries set no entry point");
        let address = ctx.binary_load_addr;
        drop(ctx);

        assert_eq!(
            rig.chunks.grants,
            alloc::vec![Grant::Anywhere {
                len: 200,
                granted: address
            }]
        );
        assert_eq!(rig.mem.read(address, 200), payload);
    }

    #[test]
    fn flat_binary_honors_a_configured_fixed_address() {
        let mut rig = TestRig::new();
        rig.add_file("k.bin", alloc::vec![0xEE; 32]);

        let mut ctx = rig.context();
        ctx.binary_load_addr = 0x0004_0000;
        method_kernel(&mut ctx, "k.bin").unwrap();
        drop(ctx);

        assert_eq!(
            rig.chunks.grants,
            alloc::vec![Grant::Fixed {
                addr: 0x0004_0000,
                len: 32
            }]
        );
    }

    #[test]
    fn flat_binary_allocation_failure_is_fatal() {
        let mut rig = TestRig::new();
        rig.add_file("k.bin", alloc::vec![0u8; 32]);
        rig.chunks.fail_anywhere = true;

        let mut ctx = rig.context();
        let err = method_kernel(&mut ctx, "k.bin").unwrap_err();
        assert_eq!(err, BootError::ChunkUnavailable);
    }

    #[test]
    fn elf_kernel_reserves_one_chunk_per_loadable_segment() {
        let image = build_elf_kernel(
            0x8010,
            &[
                (0x8000, alloc::vec![0xAB; 0x100], 0x1000),
                (0xA000, alloc::vec![0xCD; 0x40], 0x40),
            ],
        );
        let mut rig = TestRig::new();
        rig.add_file("k.elf", image);

        let mut ctx = rig.context();
        method_kernel(&mut ctx, "k.elf").unwrap();
        assert_eq!(ctx.entry_addr, 0x8010);
        drop(ctx);

        assert_eq!(
            rig.chunks.grants,
            alloc::vec![
                Grant::Fixed {
                    addr: 0x8000,
                    len: 0x1000
                },
                Grant::Fixed {
                    addr: 0xA000,
                    len: 0x40
                },
            ]
        );
        // File-backed bytes landed, bss zeroed beyond them.
        assert_eq!(rig.mem.read(0x8000, 4), alloc::vec![0xAB; 4]);
        assert_eq!(rig.mem.read(0x8100, 4), alloc::vec![0x00; 4]);
        assert_eq!(rig.mem.read(0xA000, 4), alloc::vec![0xCD; 4]);
    }

    #[test]
    fn linux_images_are_refused_without_loading() {
        let mut image = alloc::vec![0u8; 0x40];
        image[0x24..0x28].copy_from_slice(&LINUX_ZIMAGE_MAGIC.to_le_bytes());
        let mut rig = TestRig::new();
        rig.add_file("zimage", image);

        let mut ctx = rig.context();
        let err = method_kernel(&mut ctx, "zimage").unwrap_err();
        assert_eq!(err, BootError::LinuxImage);
        drop(ctx);
        assert!(rig.chunks.grants.is_empty());
    }

    #[test]
    fn missing_file_reports_an_open_failure() {
        let mut rig = TestRig::new();
        let mut ctx = rig.context();
        assert_eq!(
            method_kernel(&mut ctx, "missing.bin").unwrap_err(),
            BootError::FileOpen
        );
    }

    #[test]
    fn short_files_still_classify_as_flat_binaries() {
        let mut rig = TestRig::new();
        rig.add_file("tiny.bin", alloc::vec![0x12, 0x34]);
        let mut ctx = rig.context();
        method_kernel(&mut ctx, "tiny.bin").unwrap();
        let address = ctx.binary_load_addr;
        drop(ctx);
        assert_eq!(rig.mem.read(address, 2), alloc::vec![0x12, 0x34]);
    }
}
