//! Entity-scoped logging for lockstep simulations.
//!
//! Every part of a model owns an [`Entity`](crate::entity::Entity) which
//! places it in the simulation hierarchy. The macros in this crate wrap the
//! [log](https://docs.rs/log) facade so that every message is prefixed with
//! the full hierarchical name of the entity that emitted it.

// Enable warnings for missing documentation
#![warn(missing_docs)]

pub use log;

pub mod entity;
pub mod logger;
pub mod test_helpers;

/// Base macro for log messages of all levels.
///
/// Emits through the [log](https://docs.rs/log) facade, prefixing the
/// message with the emitting entity's hierarchical name.
#[macro_export]
macro_rules! log_base {
    ($entity:expr ; $lvl:expr, $($arg:tt)+) => (
        $crate::log::log!(target: "lockstep", $lvl, "{}: {}", $entity, format_args!($($arg)+));
    );
}

/// Entity-scoped wrapper for [`log_base`] at level `log::Level::Trace`.
#[macro_export]
macro_rules! trace {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Trace, $($arg)+);
    );
}

/// Entity-scoped wrapper for [`log_base`] at level `log::Level::Debug`.
#[macro_export]
macro_rules! debug {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Debug, $($arg)+);
    );
}

/// Entity-scoped wrapper for [`log_base`] at level `log::Level::Info`.
#[macro_export]
macro_rules! info {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Info, $($arg)+);
    );
}

/// Entity-scoped wrapper for [`log_base`] at level `log::Level::Warn`.
#[macro_export]
macro_rules! warn {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Warn, $($arg)+);
    );
}

/// Entity-scoped wrapper for [`log_base`] at level `log::Level::Error`.
#[macro_export]
macro_rules! error {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Error, $($arg)+);
    );
}
