//! Kernel handoff (`boot` method)
//!
//! Builds the final argument set and performs the one-way jump. Two
//! mutually exclusive conventions: a multiboot load passes the magic and
//! the boot information block, a native load passes the raw boot-tag
//! stream. Nothing in this loader runs after the transfer.

use log::{error, info};

use super::context::BootContext;
use super::error::BootError;

/// Magic the kernel checks to recognize a multiboot handoff.
pub const MULTIBOOT_BOOTLOADER_MAGIC: u32 = 0x2BAD_B002;

/// The complete argument set of the final jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    /// Multiboot convention: magic, info block, machine type, services.
    Multiboot {
        entry: u32,
        info_addr: u32,
        machine_type: u32,
        services: u32,
    },
    /// Native convention: zero, machine type, boot tags, services.
    Native {
        entry: u32,
        machine_type: u32,
        atags: u32,
        services: u32,
    },
}

impl Handoff {
    pub fn entry(&self) -> u32 {
        match *self {
            Self::Multiboot { entry, .. } | Self::Native { entry, .. } => entry,
        }
    }

    /// The four argument registers (r0-r3) of the entry call.
    pub fn registers(&self) -> [u32; 4] {
        match *self {
            Self::Multiboot {
                info_addr,
                machine_type,
                services,
                ..
            } => [
                MULTIBOOT_BOOTLOADER_MAGIC,
                info_addr,
                machine_type,
                services,
            ],
            Self::Native {
                machine_type,
                atags,
                services,
                ..
            } => [0, machine_type, atags, services],
        }
    }

    /// Transfer control to the loaded image. Does not return; the
    /// loader's state (including everything the boot information block
    /// points at) stays in memory untouched until the kernel reuses it.
    ///
    /// # Safety
    ///
    /// The entry address must point at the loaded image's entry code and
    /// every address in the argument set must remain valid for the
    /// kernel to read.
    pub unsafe fn transfer(self) -> ! {
        let entry = self.entry();
        let regs = self.registers();

        #[cfg(target_arch = "arm")]
        {
            // AAPCS places the four arguments in r0-r3.
            let entry_fn: extern "C" fn(u32, u32, u32, u32) -> ! =
                core::mem::transmute(entry as usize);
            entry_fn(regs[0], regs[1], regs[2], regs[3])
        }

        #[cfg(not(target_arch = "arm"))]
        {
            let _ = (entry, regs);
            panic!("Unsupported architecture for kernel handoff");
        }
    }
}

/// Check the precondition and assemble the argument set. Finalizes the
/// boot information block's module table when one exists. Separate from
/// the jump itself so the argument set stays observable.
pub fn prepare_handoff(ctx: &mut BootContext) -> Result<Handoff, BootError> {
    if ctx.entry_addr == 0 {
        error!("BOOT: no valid kernel loaded");
        return Err(BootError::NoKernelLoaded);
    }

    if let Some(boot_info) = ctx.boot_info.as_mut() {
        boot_info.set_modules(&ctx.modules);
        info!("BOOT: multiboot load");
        Ok(Handoff::Multiboot {
            entry: ctx.entry_addr,
            info_addr: boot_info.address(),
            machine_type: ctx.machine_type,
            services: ctx.services_addr,
        })
    } else {
        info!("BOOT: non-multiboot load");
        Ok(Handoff::Native {
            entry: ctx.entry_addr,
            machine_type: ctx.machine_type,
            atags: ctx.atags.base,
            services: ctx.services_addr,
        })
    }
}

pub fn method_boot(ctx: &mut BootContext, _args: &str) -> Result<(), BootError> {
    let handoff = prepare_handoff(ctx)?;
    unsafe { handoff.transfer() }
}
