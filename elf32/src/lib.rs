//! ELF32 Header Decoding
//!
//! A `no_std` decoder for the three ELF32 record kinds a boot loader
//! needs: the file header, the program header table and the section
//! header table.
//!
//! # Overview
//!
//! This crate only decodes; it never touches storage or memory placement:
//! - File header parsing with identification checks (magic, class,
//!   byte order)
//! - Program header table access for segment-based loading
//! - Section header table access for section-based loading, including
//!   in-place patching of a section's address field (the owning buffer is
//!   handed onward to the booted image, so relocation must happen inside
//!   the buffer rather than in a decoded copy)
//!
//! # Usage
//!
//! ```ignore
//! use elf32::{Elf32Ehdr, SectionTable};
//!
//! let ehdr = Elf32Ehdr::parse(&ehdr_bytes)?;
//! let sections = SectionTable::new(table_bytes, ehdr.e_shnum, ehdr.e_shentsize)?;
//! for section in sections.iter() {
//!     // place `section.sh_addr .. sh_addr + sh_size` and load it
//! }
//! ```

#![no_std]

extern crate alloc;

pub mod error;
pub mod header;
pub mod program;
pub mod section;

mod bytes;

pub use error::{Elf32Error, Result};
pub use header::{Elf32Ehdr, EHDR_SIZE};
pub use program::{Elf32Phdr, ProgramHeaderTable, PHDR_SIZE, PT_LOAD, PT_NULL};
pub use section::{Elf32Shdr, SectionTable, SHDR_SIZE, SHF_ALLOC, SHT_NOBITS, SHT_NULL};
