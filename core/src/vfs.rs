//! Virtual filesystem seam
//!
//! The loader only ever opens named files, reads, seeks and asks which
//! storage device a file lives on. The concrete filesystem (SD/FAT,
//! network, test fixture) stays behind these two traits. A file handle is
//! released when the `File` value is dropped, so every exit path of a
//! loader method, including error paths, gives the handle back.

use alloc::boxed::Box;
use core::fmt;

/// Result type for VFS operations
pub type Result<T> = core::result::Result<T, VfsError>;

/// Errors that can occur during VFS operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VfsError {
    /// Named file does not exist on the device
    NotFound,
    /// Device-level read failure
    IoError,
    /// Seek past the end of the file
    BadSeek,
    /// File ended before the requested byte count
    UnexpectedEof,
}

impl fmt::Display for VfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "file not found"),
            Self::IoError => write!(f, "device read error"),
            Self::BadSeek => write!(f, "seek out of range"),
            Self::UnexpectedEof => write!(f, "unexpected end of file"),
        }
    }
}

/// An open file handle.
#[allow(clippy::len_without_is_empty)]
pub trait File {
    /// Total file length in bytes.
    fn len(&self) -> u32;

    /// Reposition the read cursor to `pos` bytes from the start.
    fn seek(&mut self, pos: u32) -> Result<()>;

    /// Read into `buf`, returning the number of bytes read. Zero means
    /// end of file.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Name of the storage device this file lives on.
    fn device_name(&self) -> &str;
}

/// A mounted filesystem namespace.
pub trait FileSystem {
    /// Open `name` for reading.
    fn open(&mut self, name: &str) -> Result<Box<dyn File>>;

    /// Make `device` the default for subsequent relative lookups.
    fn set_default_device(&mut self, device: &str);
}

/// Read until `buf` is full or the file ends; returns the bytes read.
pub fn read_up_to(file: &mut dyn File, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Read exactly `buf.len()` bytes or fail with `UnexpectedEof`.
pub fn read_exact(file: &mut dyn File, buf: &mut [u8]) -> Result<()> {
    if read_up_to(file, buf)? != buf.len() {
        return Err(VfsError::UnexpectedEof);
    }
    Ok(())
}
