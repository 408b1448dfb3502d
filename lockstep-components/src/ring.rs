//! A fixed-capacity circular store of [tokens](crate::token).
//!
//! Slots are pushed at `tail` and popped from `head` in strict FIFO order;
//! there is no random removal and the store never reallocates. One slot is
//! kept free to distinguish a full ring from an empty one, so the backing
//! array holds `capacity + 1` entries.

use lockstep_engine::traits::SimObject;
use lockstep_engine::types::SimError;

use crate::token::Token;

/// Capacity conditions reported to the caller instead of being asserted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RingError {
    /// A push was attempted with no free slot.
    Overflow,
    /// A pop asked for more tokens than the ring holds.
    Underflow,
}

impl std::fmt::Display for RingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overflow => write!(f, "ring overflow"),
            Self::Underflow => write!(f, "ring underflow"),
        }
    }
}

impl std::error::Error for RingError {}

impl From<RingError> for SimError {
    fn from(error: RingError) -> Self {
        SimError(error.to_string())
    }
}

/// A bounded FIFO of tokens with position-relative access.
pub struct Ring<T>
where
    T: SimObject,
{
    slots: Vec<Option<Token<T>>>,
    /// Index of the oldest token.
    head: usize,
    /// Index one past the newest token.
    tail: usize,
}

impl<T> Ring<T>
where
    T: SimObject,
{
    /// Create a ring able to hold `capacity` tokens.
    ///
    /// # Panics
    ///
    /// A zero capacity is a configuration error.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be non-zero");
        let mut slots = Vec::with_capacity(capacity + 1);
        slots.resize_with(capacity + 1, || None);
        Self {
            slots,
            head: 0,
            tail: 0,
        }
    }

    /// The number of tokens the ring can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    /// The number of tokens currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        (self.tail + self.slots.len() - self.head) % self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        (self.tail + 1) % self.slots.len() == self.head
    }

    /// Append a token at the tail.
    pub fn push(&mut self, token: Token<T>) -> Result<(), RingError> {
        if self.is_full() {
            return Err(RingError::Overflow);
        }
        self.slots[self.tail] = Some(token);
        self.tail = (self.tail + 1) % self.slots.len();
        Ok(())
    }

    /// Destroy the `count` oldest tokens.
    pub fn pop(&mut self, count: usize) -> Result<(), RingError> {
        if count > self.len() {
            return Err(RingError::Underflow);
        }
        for _ in 0..count {
            self.slots[self.head] = None;
            self.head = (self.head + 1) % self.slots.len();
        }
        Ok(())
    }

    /// Borrow the token at `index`, where `0` is the oldest.
    #[must_use]
    pub fn peek(&self, index: usize) -> Option<&Token<T>> {
        if index >= self.len() {
            return None;
        }
        self.slots[(self.head + index) % self.slots.len()].as_ref()
    }

    /// Borrow the newest token.
    #[must_use]
    pub fn peek_back(&self) -> Option<&Token<T>> {
        match self.len() {
            0 => None,
            len => self.peek(len - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_come_back_in_fifo_order() {
        let mut ring = Ring::new(3);
        for seq_n in 0..3 {
            ring.push(Token::filled(seq_n, seq_n as i32)).unwrap();
        }
        assert!(ring.is_full());
        assert_eq!(ring.peek(0).unwrap().seq_n(), 0);
        assert_eq!(ring.peek(2).unwrap().seq_n(), 2);
        assert_eq!(ring.peek_back().unwrap().seq_n(), 2);

        ring.pop(2).unwrap();
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.peek(0).unwrap().seq_n(), 2);
    }

    #[test]
    fn the_cursors_wrap_around() {
        let mut ring = Ring::new(2);
        for seq_n in 0..10 {
            ring.push(Token::filled(seq_n, 0)).unwrap();
            assert_eq!(ring.peek(0).unwrap().seq_n(), seq_n);
            ring.pop(1).unwrap();
        }
        assert!(ring.is_empty());
    }

    #[test]
    fn pushing_into_a_full_ring_overflows() {
        let mut ring = Ring::new(1);
        ring.push(Token::filled(0, 0)).unwrap();
        assert_eq!(ring.push(Token::filled(1, 0)), Err(RingError::Overflow));
        // The failed push must not have disturbed the contents.
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.peek(0).unwrap().seq_n(), 0);
    }

    #[test]
    fn popping_more_than_held_underflows() {
        let mut ring = Ring::<i32>::new(4);
        ring.push(Token::empty(0)).unwrap();
        assert_eq!(ring.pop(2), Err(RingError::Underflow));
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn peeking_out_of_range_returns_none() {
        let mut ring = Ring::<i32>::new(4);
        assert!(ring.peek(0).is_none());
        assert!(ring.peek_back().is_none());
        ring.push(Token::empty(0)).unwrap();
        assert!(ring.peek(1).is_none());
    }
}
