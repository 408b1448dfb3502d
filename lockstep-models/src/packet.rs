//! The message exchanged between pipeline stages.

use std::fmt;

use lockstep_engine::traits::SimObject;

/// A payload tagged with the iteration that produced it.
#[derive(Clone, Debug)]
pub struct Packet<T>
where
    T: SimObject,
{
    /// Monotonically increasing per-producer sequence number.
    pub seq_n: u64,
    pub payload: T,
}

impl<T> Packet<T>
where
    T: SimObject,
{
    #[must_use]
    pub fn new(seq_n: u64, payload: T) -> Self {
        Self { seq_n, payload }
    }
}

impl<T> fmt::Display for Packet<T>
where
    T: SimObject,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pkt {} = {}", self.seq_n, self.payload)
    }
}

impl<T> SimObject for Packet<T> where T: SimObject {}
