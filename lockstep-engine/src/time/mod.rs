//! Simulation time.

pub mod clock;
