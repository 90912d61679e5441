//! Module registry (`module` method)
//!
//! Auxiliary files loaded whole into allocator-granted memory and exposed
//! to the booted kernel through the boot information block.

use alloc::boxed::Box;
use alloc::vec::Vec;

use ember_core::mem;
use log::{error, info};

use super::config::split_first_token;
use super::context::BootContext;
use super::error::BootError;

/// One loaded module. The name buffer is NUL-terminated and keeps a
/// stable address because the booted kernel reads it in place.
pub struct LoadedModule {
    pub start: u32,
    pub end: u32,
    name: Box<[u8]>,
}

impl LoadedModule {
    pub fn new(start: u32, end: u32, name: &str) -> Self {
        let mut bytes = Vec::with_capacity(name.len() + 1);
        bytes.extend_from_slice(name.as_bytes());
        bytes.push(0);
        Self {
            start,
            end,
            name: bytes.into_boxed_slice(),
        }
    }

    pub fn name(&self) -> &str {
        core::str::from_utf8(&self.name[..self.name.len() - 1]).unwrap_or("")
    }

    /// Address of the NUL-terminated name, as handed to the kernel.
    pub fn name_addr(&self) -> u32 {
        self.name.as_ptr() as usize as u32
    }
}

/// Ordered module collection. Insertion prepends, so iteration yields the
/// most recently added module first; the descriptor table handed to the
/// kernel keeps that reversed order.
pub struct ModuleRegistry {
    mods: Vec<LoadedModule>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self { mods: Vec::new() }
    }

    pub fn add(&mut self, module: LoadedModule) {
        self.mods.insert(0, module);
    }

    pub fn count(&self) -> u32 {
        self.mods.len() as u32
    }

    /// Most recently added first.
    pub fn iter(&self) -> impl Iterator<Item = &LoadedModule> {
        self.mods.iter()
    }
}

pub fn method_module(ctx: &mut BootContext, args: &str) -> Result<(), BootError> {
    let (file, name) = split_first_token(args);
    let name = if name.is_empty() { file } else { name };

    let mut fp = ctx.fs.open(file).map_err(|_| {
        error!("MODULE: cannot load file {}", name);
        BootError::FileOpen
    })?;

    let length = fp.len();
    let address = match ctx.chunks.reserve_anywhere(length) {
        Some(addr) => addr,
        None => {
            error!(
                "MODULE: unable to allocate a chunk of size {} for {}",
                length, name
            );
            return Err(BootError::ChunkUnavailable);
        }
    };

    let copied = mem::load_file(&mut *fp, 0, length, address, ctx.mem)?;
    if copied != length {
        error!(
            "MODULE: error loading {} only {} out of {} bytes read",
            name, copied, length
        );
        return Err(BootError::ShortRead);
    }

    ctx.modules
        .add(LoadedModule::new(address, address + copied, name));

    info!("MODULE: {} loaded", name);
    Ok(())
}
