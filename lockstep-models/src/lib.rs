#![doc(test(attr(warn(unused))))]

//! Models of periodic pipelines.
//!
//! A pipeline is a [sensor](crate::sensor) feeding one or more compute
//! [stages](crate::stage) through
//! [lossy links](lockstep_components::link). Stages reconstruct an
//! ordered view of each input with a
//! [sequenced buffer](lockstep_components::sequencer) and substitute for
//! values the transport lost, so every iteration completes on cadence no
//! matter what arrived.

pub mod packet;
pub mod sensor;
pub mod stage;
