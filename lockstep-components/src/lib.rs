#![doc(test(attr(warn(unused))))]

//! Simulation components.
//!
//! The building blocks for models of periodic pipelines over unreliable
//! transports: sequence-numbered [tokens](crate::token) held in a bounded
//! [ring](crate::ring), the reordering [sequenced buffer](crate::sequencer)
//! built on them, consumer-side [substitution policies](crate::policy), a
//! configurable [lossy link](crate::link) and plain
//! [source](crate::source)/[sink](crate::sink) endpoints.

pub mod connect;
pub mod link;
pub mod policy;
pub mod ring;
pub mod sequencer;
pub mod sink;
pub mod source;
pub mod token;
pub mod types;
