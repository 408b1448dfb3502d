//! Helpers for writing engine tests.

use lockstep_track::test_helpers::start_logging;

use crate::engine::Engine;

/// Create an engine for a test, with logging started.
#[must_use]
pub fn start_test(full_filepath: &str) -> Engine {
    start_logging(full_filepath);
    Engine::default()
}
