// Physical memory access for payload loading
//
// Loaders stream file bytes through this seam instead of writing through
// raw pointers inline, which keeps the load paths testable on a host.

use alloc::vec;

use crate::vfs::{self, File};

/// Destination for loaded payload bytes, addressed by physical address.
pub trait PhysMemory {
    /// Copy `bytes` to physical address `addr`.
    fn write(&mut self, addr: u32, bytes: &[u8]);

    /// Zero `len` bytes starting at physical address `addr`.
    fn zero(&mut self, addr: u32, len: u32);
}

/// Writes straight through identity-mapped physical addresses.
pub struct RawMemory {
    _private: (),
}

impl RawMemory {
    /// # Safety
    ///
    /// Only valid on the boot target: every address handed to `write` or
    /// `zero` must be a chunk-allocator grant that is identity-mapped and
    /// not occupied by this program's own image, stack or heap.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl PhysMemory for RawMemory {
    fn write(&mut self, addr: u32, bytes: &[u8]) {
        unsafe {
            core::ptr::copy_nonoverlapping(bytes.as_ptr(), addr as usize as *mut u8, bytes.len());
        }
    }

    fn zero(&mut self, addr: u32, len: u32) {
        unsafe {
            core::ptr::write_bytes(addr as usize as *mut u8, 0, len as usize);
        }
    }
}

const COPY_CHUNK: usize = 4096;

/// Stream `len` bytes of `file`, starting at `offset`, to physical
/// address `dest`. Returns the number of bytes actually copied, which is
/// less than `len` when the file ends early; the caller decides whether a
/// short copy is fatal.
pub fn load_file(
    file: &mut dyn File,
    offset: u32,
    len: u32,
    dest: u32,
    mem: &mut dyn PhysMemory,
) -> vfs::Result<u32> {
    file.seek(offset)?;

    let mut buf = vec![0u8; COPY_CHUNK];
    let mut copied: u32 = 0;
    while copied < len {
        let want = ((len - copied) as usize).min(COPY_CHUNK);
        let got = vfs::read_up_to(file, &mut buf[..want])?;
        if got == 0 {
            break;
        }
        mem.write(dest + copied, &buf[..got]);
        copied += got as u32;
    }
    Ok(copied)
}
