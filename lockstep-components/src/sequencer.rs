//! The sequenced reordering buffer.
//!
//! A [SeqBuffer] accepts `(sequence number, value)` deliveries in arbitrary
//! arrival order and maintains a contiguous window of [tokens](crate::token)
//! covering `[min_seq_n, max_seq_n)`. Gaps left by reordering or loss are
//! filled with empty placeholder tokens so that the consumer can always
//! read by position: index 0 is the oldest not-yet-popped slot.
//!
//! The buffer is passive. Deliveries arrive synchronously from the
//! receive task and the consumer drains it synchronously from its own
//! periodic step, so a single owner mutates it and no operation ever
//! suspends.

use std::fmt;
use std::sync::Arc;

use lockstep_engine::sim_error;
use lockstep_engine::traits::SimObject;
use lockstep_engine::types::{SimError, SimResult};
use lockstep_track::entity::Entity;
use lockstep_track::{debug, trace};

use crate::ring::Ring;
use crate::token::{Token, TokenError};

/// A bounded window of sequence-numbered tokens over a lossy transport.
pub struct SeqBuffer<T>
where
    T: SimObject,
{
    entity: Arc<Entity>,
    ring: Ring<T>,
    /// Sequence number of the slot at position 0.
    min_seq_n: u64,
    /// One past the highest sequence number ever synthesized or pushed.
    max_seq_n: u64,
    num_dropped: u64,
}

impl<T> fmt::Display for SeqBuffer<T>
where
    T: SimObject,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.entity.fmt(f)
    }
}

impl<T> SeqBuffer<T>
where
    T: SimObject,
{
    /// Create an empty buffer holding at most `capacity` tokens.
    pub fn new(parent: &Arc<Entity>, name: &str, capacity: usize) -> Result<Self, SimError> {
        if capacity == 0 {
            return sim_error!(format!("{}::{name}: capacity must be non-zero", parent));
        }
        Ok(Self {
            entity: Arc::new(Entity::new(parent, name)),
            ring: Ring::new(capacity),
            min_seq_n: 0,
            max_seq_n: 0,
            num_dropped: 0,
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// The number of tokens (filled or placeholder) in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Sequence number of the oldest not-yet-popped slot.
    #[must_use]
    pub fn min_seq_n(&self) -> u64 {
        self.min_seq_n
    }

    /// One past the newest slot in the window.
    #[must_use]
    pub fn max_seq_n(&self) -> u64 {
        self.max_seq_n
    }

    /// Deliveries dropped because the window was full.
    #[must_use]
    pub fn num_dropped(&self) -> u64 {
        self.num_dropped
    }

    /// Extend the window with empty placeholders until it holds at least
    /// `min_count` tokens.
    ///
    /// This is how the consumer tolerates "nothing has arrived yet"
    /// without stalling its cadence: it manufactures slots for the values
    /// it is owed rather than waiting for them.
    pub fn provision(&mut self, min_count: usize) -> SimResult {
        if min_count > self.capacity() {
            return sim_error!(format!(
                "{}: cannot provision {min_count} tokens with capacity {}",
                self.entity,
                self.capacity()
            ));
        }
        while self.ring.len() < min_count {
            self.ring.push(Token::empty(self.max_seq_n))?;
            self.max_seq_n += 1;
        }
        Ok(())
    }

    /// Place one inbound `(sequence number, value)` pair.
    ///
    /// Deliveries beyond the window push new slots, synthesizing empty
    /// placeholders for any intermediate sequence numbers; deliveries
    /// inside the window fill the existing slot in place; deliveries
    /// below the window arrive too late and are discarded. Loss,
    /// reordering and duplication are expected transport behaviour, so
    /// none of these paths raises an error.
    pub fn deliver(&mut self, seq_n: u64, value: T) -> SimResult {
        if seq_n >= self.max_seq_n {
            // Forward push. Check the full extension up front so that a
            // drop leaves the window untouched.
            let needed = seq_n - self.min_seq_n + 1;
            if needed > self.capacity() as u64 {
                self.num_dropped += 1;
                debug!(self.entity ;
                    "window [{}, {}) full, dropping seq {seq_n}",
                    self.min_seq_n, self.max_seq_n);
                return Ok(());
            }
            while self.max_seq_n < seq_n {
                self.ring.push(Token::empty(self.max_seq_n))?;
                self.max_seq_n += 1;
            }
            self.ring.push(Token::filled(seq_n, value))?;
            self.max_seq_n = seq_n + 1;
        } else if seq_n >= self.min_seq_n {
            // Late in-place fill of a slot synthesized earlier.
            let index = (seq_n - self.min_seq_n) as usize;
            if let Some(token) = self.ring.peek(index) {
                match token.write(value) {
                    Ok(()) => trace!(self.entity ; "late fill of seq {seq_n}"),
                    Err(TokenError::IllegalWrite) => {
                        trace!(self.entity ; "duplicate of seq {seq_n} ignored");
                    }
                    Err(error) => return Err(error.into()),
                }
            }
        } else {
            trace!(self.entity ;
                "seq {seq_n} arrived after its window closed at {}", self.min_seq_n);
        }
        Ok(())
    }

    /// Borrow the token at `index`, where `0` is the oldest pending slot.
    pub fn read(&self, index: usize) -> Result<&Token<T>, SimError> {
        match self.ring.peek(index) {
            Some(token) => Ok(token),
            None => sim_error!(format!(
                "{}: read of index {index} outside a window of {}",
                self.entity,
                self.len()
            )),
        }
    }

    /// Destroy the `count` oldest tokens, moving the window forward.
    pub fn pop(&mut self, count: usize) -> SimResult {
        self.ring.pop(count)?;
        self.min_seq_n += count as u64;
        Ok(())
    }
}
