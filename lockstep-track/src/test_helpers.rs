//! Helpers for tests that want simulation logging.

use log::Level;

use crate::logger::init_stdout;

/// Start logging for a test.
///
/// Tests in one binary share the global logger, so repeat initialization is
/// tolerated. Pass `file!()` so failures are attributable.
pub fn start_logging(full_filepath: &str) {
    if init_stdout(Level::Warn).is_err() {
        // Another test in this binary installed the logger already.
        log::trace!(target: "lockstep", "logger already installed ({full_filepath})");
    }
}
