//! In-process `log` sink for asserting what the crate writes.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::sync::Once;

struct CaptureLogger;

static LOGGER: CaptureLogger = CaptureLogger;
static INSTALL: Once = Once::new();

thread_local! {
    // Tests run on separate threads, so each one only sees its own lines
    static LINES: RefCell<Vec<(Level, String)>> = RefCell::new(Vec::new());
}

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with("mongo_facade")
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            LINES.with(|lines| {
                lines
                    .borrow_mut()
                    .push((record.level(), record.args().to_string()))
            });
        }
    }

    fn flush(&self) {}
}

/// Run `f` and return every line it logged on this thread
pub fn capture<F: FnOnce()>(f: F) -> Vec<(Level, String)> {
    INSTALL.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
    LINES.with(|lines| lines.borrow_mut().clear());
    f();
    LINES.with(|lines| lines.borrow_mut().drain(..).collect())
}
