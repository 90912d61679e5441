// Global logging for EmberBoot
//
// Backs the `log` facade with the console sink. Every diagnostic the
// loader emits goes through here, so the script interpreter and the load
// paths never talk to an output device directly.

use log::{LevelFilter, Log, Metadata, Record};

use crate::console;

struct BootLogger;

static LOGGER: BootLogger = BootLogger;

/// Install the boot logger. Safe to call more than once; only the first
/// call wins (later calls keep the existing logger).
pub fn init(max_level: LevelFilter) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(max_level);
}

impl Log for BootLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        console::write_fmt(format_args!("[{}] {}\n", record.level(), record.args()));
    }

    fn flush(&self) {}
}
