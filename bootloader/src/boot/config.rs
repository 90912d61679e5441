//! Boot-script interpreter
//!
//! Line-oriented: `<method> <args>`. Method names are matched
//! case-insensitively against a static table. Unknown methods only warn;
//! a method that fails halts the whole script and its error propagates
//! to the caller.

use log::{error, warn};

use super::context::BootContext;
use super::error::BootError;
use super::{handoff, kernel, modules, multiboot};

/// One entry of the static method table.
pub struct ConfigMethod {
    pub name: &'static str,
    pub handler: fn(&mut BootContext, &str) -> Result<(), BootError>,
}

static METHODS: [ConfigMethod; 6] = [
    ConfigMethod {
        name: "multiboot",
        handler: multiboot::method_multiboot,
    },
    ConfigMethod {
        name: "boot",
        handler: handoff::method_boot,
    },
    ConfigMethod {
        name: "module",
        handler: modules::method_module,
    },
    ConfigMethod {
        name: "kernel",
        handler: kernel::method_kernel,
    },
    ConfigMethod {
        name: "entry_addr",
        handler: method_entry_addr,
    },
    ConfigMethod {
        name: "binary_load_addr",
        handler: method_binary_load_addr,
    },
];

/// Split a line into its method token and the argument remainder: the
/// first non-space run is the method, everything from the next non-space
/// character to the end of the line is the remainder.
pub(crate) fn split_first_token(line: &str) -> (&str, &str) {
    let line = line.trim_start_matches(' ');
    match line.find(' ') {
        None => (line, ""),
        Some(pos) => {
            let (method, rest) = line.split_at(pos);
            (method, rest.trim_start_matches(' '))
        }
    }
}

/// Run a boot script. Stops at the first failing method and returns its
/// error; lines with unknown methods are skipped with a warning.
pub fn run_script(ctx: &mut BootContext, script: &str) -> Result<(), BootError> {
    for line in script.split('\n') {
        let (method, args) = split_first_token(line);
        if method.is_empty() {
            continue;
        }

        match METHODS
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(method))
        {
            None => warn!("cfg_parse: unknown method {}", method),
            Some(entry) => {
                if let Err(err) = (entry.handler)(ctx, args) {
                    error!("cfg_parse: {} failed with {}", line, err.code());
                    return Err(err);
                }
            }
        }
    }

    Ok(())
}

fn method_entry_addr(_ctx: &mut BootContext, _args: &str) -> Result<(), BootError> {
    error!("entry_addr not implemented");
    Err(BootError::NotImplemented)
}

fn method_binary_load_addr(_ctx: &mut BootContext, _args: &str) -> Result<(), BootError> {
    error!("binary_load_addr not implemented");
    Err(BootError::NotImplemented)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boot::testutil::TestRig;
    use alloc::vec;

    #[test]
    fn splits_method_and_remainder() {
        assert_eq!(split_first_token("kernel k.elf"), ("kernel", "k.elf"));
        assert_eq!(
            split_first_token("  multiboot   k.elf root=/dev/sda1  "),
            ("multiboot", "k.elf root=/dev/sda1  ")
        );
        assert_eq!(split_first_token("boot"), ("boot", ""));
        assert_eq!(split_first_token("   "), ("", ""));
        assert_eq!(split_first_token(""), ("", ""));
    }

    #[test]
    fn unknown_methods_do_not_halt_the_script() {
        let mut rig = TestRig::new();
        rig.add_file("k.bin", vec![0u8; 64]);
        let mut ctx = rig.context();
        // The unknown method is skipped, the kernel line still runs.
        run_script(&mut ctx, "frobnicate everything\nkernel k.bin").unwrap();
        drop(ctx);
        assert_eq!(rig.chunks.grants.len(), 1);
    }

    #[test]
    fn method_names_match_case_insensitively() {
        let mut rig = TestRig::new();
        rig.add_file("k.bin", vec![0u8; 64]);
        let mut ctx = rig.context();
        run_script(&mut ctx, "KERNEL k.bin").unwrap();
    }

    #[test]
    fn first_failure_halts_all_later_lines() {
        let mut rig = TestRig::new();
        rig.add_file("k.bin", vec![0u8; 64]);
        let mut ctx = rig.context();
        let err = run_script(&mut ctx, "kernel missing.bin\nkernel k.bin").unwrap_err();
        assert_eq!(err, BootError::FileOpen);
        drop(ctx);
        // The second line never ran: no chunk was ever granted.
        assert!(rig.chunks.grants.is_empty());
    }

    #[test]
    fn blank_and_method_less_lines_are_skipped() {
        let mut rig = TestRig::new();
        let mut ctx = rig.context();
        run_script(&mut ctx, "\n   \n\n").unwrap();
    }

    #[test]
    fn unimplemented_methods_fail_the_script() {
        let mut rig = TestRig::new();
        let mut ctx = rig.context();
        let err = run_script(&mut ctx, "entry_addr 0x8000").unwrap_err();
        assert_eq!(err, BootError::NotImplemented);
        let err = run_script(&mut ctx, "binary_load_addr 0x8000").unwrap_err();
        assert_eq!(err, BootError::NotImplemented);
    }
}
