//! Boot heap
//!
//! Static-buffer heap for the loader's transient allocations (header
//! scratch, decoded tables, the boot information block). Installed as the
//! global allocator on bare-metal targets only; host builds (tests) use
//! the host allocator.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::{self, NonNull};

use linked_list_allocator::Heap;
use spin::Mutex;

/// Loader heap size: 4MB
const HEAP_SIZE: usize = 4 * 1024 * 1024;

/// Page-aligned heap buffer
#[repr(C, align(4096))]
struct AlignedHeapBuffer([u8; HEAP_SIZE]);

/// Static heap buffer - lives in .bss, zero-initialized
static mut HEAP_BUFFER: AlignedHeapBuffer = AlignedHeapBuffer([0u8; HEAP_SIZE]);

static HEAP: Mutex<Heap> = Mutex::new(Heap::empty());

/// Hand the static buffer to the heap.
///
/// # Safety
///
/// Must be called exactly once, before the first allocation.
pub unsafe fn init() {
    let start = ptr::addr_of_mut!(HEAP_BUFFER) as *mut u8;
    HEAP.lock().init(start, HEAP_SIZE);
}

pub struct BootAllocator;

unsafe impl GlobalAlloc for BootAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        HEAP.lock()
            .allocate_first_fit(layout)
            .map(|nn| nn.as_ptr())
            .unwrap_or(ptr::null_mut())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if let Some(nn) = NonNull::new(ptr) {
            HEAP.lock().deallocate(nn, layout);
        }
    }
}

#[cfg(target_os = "none")]
#[global_allocator]
static ALLOCATOR: BootAllocator = BootAllocator;
