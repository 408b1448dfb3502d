//! A stdout logger for simulation runs.
//!
//! Implements the [log](https://docs.rs/log) `Log` trait so that the
//! entity-scoped macros in the crate root have somewhere to send their
//! messages. Applications call [`init_stdout`] once at startup; tests use
//! [`crate::test_helpers::start_logging`] which tolerates repeat
//! initialization.

use log::{Level, Log, Metadata, Record, SetLoggerError};

/// Logger that writes every enabled record to stdout.
struct StdoutLogger {
    level: Level,
}

impl Log for StdoutLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("{:<5} {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Install a stdout logger at the given level.
///
/// Fails if a logger has already been installed.
pub fn init_stdout(level: Level) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(StdoutLogger { level }))
        .map(|()| log::set_max_level(level.to_level_filter()))
}
