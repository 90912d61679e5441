//! Ember Core Library
//!
//! Shared services consumed by the stage-2 loader: console output and
//! logging, the virtual-filesystem seam, the physical chunk allocator,
//! the firmware boot-tag decoder and raw physical-memory access.
//! Designed to be no_std compatible.

#![no_std]
#![allow(clippy::new_without_default)]

extern crate alloc;

pub mod atag;
pub mod console;
pub mod fb;
pub mod logger;
pub mod mem;
pub mod memchunk;
pub mod vfs;
