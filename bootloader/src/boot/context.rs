//! Boot context and the service-capability table
//!
//! All state the script methods share lives in one mutable context that
//! the interpreter threads through every handler: the external
//! collaborators, the entry point of the last successful load, the
//! pending boot information block and the module registry.

use core::ffi::c_void;

use ember_core::atag::AtagStream;
use ember_core::fb::FramebufferInfo;
use ember_core::mem::PhysMemory;
use ember_core::memchunk::ChunkAllocator;
use ember_core::vfs::FileSystem;

use super::info::BootInfo;
use super::modules::ModuleRegistry;

/// Shared state of one boot-script run.
pub struct BootContext<'a> {
    pub fs: &'a mut dyn FileSystem,
    pub chunks: &'a mut dyn ChunkAllocator,
    pub mem: &'a mut dyn PhysMemory,
    pub atags: AtagStream<'a>,
    pub fb: FramebufferInfo,
    /// Firmware machine-type identifier, forwarded to the kernel.
    pub machine_type: u32,
    /// Address of the platform's [`ServiceTable`].
    pub services_addr: u32,
    /// Entry address of the last successful kernel load; zero while no
    /// kernel is loaded. `boot` refuses to run while this is zero.
    pub entry_addr: u32,
    /// Fixed load address for flat binaries. Zero means "place anywhere";
    /// a flat-binary load records its granted address here.
    pub binary_load_addr: u32,
    /// Present once a multiboot image has been recognized and loaded.
    pub boot_info: Option<BootInfo>,
    pub modules: ModuleRegistry,
}

impl<'a> BootContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fs: &'a mut dyn FileSystem,
        chunks: &'a mut dyn ChunkAllocator,
        mem: &'a mut dyn PhysMemory,
        atags: AtagStream<'a>,
        fb: FramebufferInfo,
        machine_type: u32,
        services_addr: u32,
    ) -> Self {
        Self {
            fs,
            chunks,
            mem,
            atags,
            fb,
            machine_type,
            services_addr,
            entry_addr: 0,
            binary_load_addr: 0,
            boot_info: None,
            modules: ModuleRegistry::new(),
        }
    }
}

/// Function-address table handed to the booted image.
///
/// This crosses the boot ABI boundary: field order and signatures are
/// fixed, do not reorder or retype anything here.
#[repr(C)]
pub struct ServiceTable {
    pub print: unsafe extern "C" fn(text: *const u8) -> i32,
    pub clear: unsafe extern "C" fn(),
    pub file_open: unsafe extern "C" fn(path: *const u8, mode: *const u8) -> *mut c_void,
    pub file_read:
        unsafe extern "C" fn(buf: *mut c_void, size: u32, nmemb: u32, handle: *mut c_void) -> u32,
    pub file_close: unsafe extern "C" fn(handle: *mut c_void) -> i32,
    pub file_seek: unsafe extern "C" fn(handle: *mut c_void, offset: i32, whence: i32) -> i32,
    pub dir_open: unsafe extern "C" fn(path: *const u8) -> *mut c_void,
    pub dir_read: unsafe extern "C" fn(dir: *mut c_void) -> *mut c_void,
    pub dir_close: unsafe extern "C" fn(dir: *mut c_void) -> i32,
    pub sleep_us: unsafe extern "C" fn(usec: u32),
}

impl ServiceTable {
    /// Address handed to the kernel in the final register set.
    pub fn address(&'static self) -> u32 {
        self as *const Self as usize as u32
    }
}
