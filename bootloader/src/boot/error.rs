//! Loader error taxonomy
//!
//! Every loader method reports one of these; the script interpreter
//! prints the numeric code and halts the script on the first failure.

use core::fmt;

use elf32::Elf32Error;
use ember_core::vfs::VfsError;

/// Errors that can abort a boot-script method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    /// Named file could not be opened
    FileOpen,
    /// File ended before the required byte count
    ShortRead,
    /// Seek or device-level read failure
    Io,
    /// No position in the first 8 KiB carries a valid multiboot header
    NoMultibootHeader,
    /// ELF image has no section header table
    NoSectionTable,
    /// Allocable section without a load address or size
    SectionUnplaceable,
    /// Image failed ELF decoding
    InvalidImage,
    /// Chunk allocator could not grant the required range or size
    ChunkUnavailable,
    /// Foreign kernel image format (Linux zImage)
    LinuxImage,
    /// a.out-style load address below 1 MiB
    LoadBelowOneMib,
    /// Script method exists but is not implemented
    NotImplemented,
    /// `boot` issued with no loaded kernel
    NoKernelLoaded,
}

impl BootError {
    /// Stable negative result code, printed by the interpreter when a
    /// method fails.
    pub const fn code(self) -> i32 {
        match self {
            Self::FileOpen => -1,
            Self::ShortRead => -2,
            Self::Io => -3,
            Self::NoMultibootHeader => -4,
            Self::NoSectionTable => -5,
            Self::SectionUnplaceable => -6,
            Self::InvalidImage => -7,
            Self::ChunkUnavailable => -8,
            Self::LinuxImage => -9,
            Self::LoadBelowOneMib => -10,
            Self::NotImplemented => -11,
            Self::NoKernelLoaded => -12,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FileOpen => "cannot open file",
            Self::ShortRead => "short read",
            Self::Io => "I/O error",
            Self::NoMultibootHeader => "no valid multiboot header",
            Self::NoSectionTable => "no section table",
            Self::SectionUnplaceable => "section has no load address or size",
            Self::InvalidImage => "invalid executable image",
            Self::ChunkUnavailable => "memory chunk unavailable",
            Self::LinuxImage => "Linux kernels not supported",
            Self::LoadBelowOneMib => "load below 1 MiB not supported",
            Self::NotImplemented => "not implemented",
            Self::NoKernelLoaded => "no valid kernel loaded",
        }
    }
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<VfsError> for BootError {
    fn from(err: VfsError) -> Self {
        match err {
            VfsError::NotFound => Self::FileOpen,
            VfsError::UnexpectedEof => Self::ShortRead,
            VfsError::IoError | VfsError::BadSeek => Self::Io,
        }
    }
}

impl From<Elf32Error> for BootError {
    fn from(_: Elf32Error) -> Self {
        Self::InvalidImage
    }
}
