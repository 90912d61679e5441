//! Ember Stage-2 Boot Loader Core
//!
//! Interprets a boot script and loads the payloads it names:
//! 1. Classify the kernel image (flat binary, ELF, foreign format)
//! 2. Map every loadable region through the chunk allocator
//! 3. Build a multiboot-style boot information block
//! 4. Jump into the loaded image - one way, nothing survives
//!
//! The platform hands over the external collaborators (filesystem, chunk
//! allocator, physical memory, boot tags, framebuffer geometry) inside a
//! [`BootContext`]; everything in here is plain `no_std` + `alloc` logic
//! on top of that seam.

#![no_std]
#![allow(clippy::new_without_default)]

extern crate alloc;

pub mod boot;
pub mod heap;

pub use boot::config::run_script;
pub use boot::context::{BootContext, ServiceTable};
pub use boot::error::BootError;
pub use boot::handoff::{prepare_handoff, Handoff};
pub use boot::info::{BootInfo, MultibootInfo};
pub use boot::modules::{LoadedModule, ModuleRegistry};
