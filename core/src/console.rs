// Console output sink
//
// The platform registers whatever it can print through (UART early on,
// framebuffer console later). Everything above this module talks to the
// sink through `write_fmt`, so swapping the output device is a single
// `set_sink` call.

use core::fmt;

use spin::Mutex;

/// Something the platform can print through.
pub trait ConsoleSink: Sync {
    fn write_str(&self, s: &str);
}

static SINK: Mutex<Option<&'static dyn ConsoleSink>> = Mutex::new(None);

/// Register the active output device. Replaces any previous sink.
pub fn set_sink(sink: &'static dyn ConsoleSink) {
    *SINK.lock() = Some(sink);
}

/// Format `args` into the registered sink. Silently drops output while no
/// sink is registered (nothing useful can be done with it that early).
pub fn write_fmt(args: fmt::Arguments) {
    let sink = *SINK.lock();
    if let Some(sink) = sink {
        let mut writer = SinkWriter(sink);
        let _ = fmt::Write::write_fmt(&mut writer, args);
    }
}

struct SinkWriter(&'static dyn ConsoleSink);

impl fmt::Write for SinkWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_str(s);
        Ok(())
    }
}
