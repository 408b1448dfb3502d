//! A single sequence-numbered slot.
//!
//! A [Token] tracks whether a value has been written to it and whether the
//! consumer has read it. The sequence number is assigned when the slot is
//! created and never changes; the value is written at most once. Interior
//! mutability is used so that a consumer holding a shared reference into
//! the [ring](crate::ring) can still mark tokens as read.

use std::cell::{Cell, RefCell};
use std::fmt;

use lockstep_engine::traits::SimObject;
use lockstep_engine::types::SimError;

/// Violations of the token read/write contract.
///
/// These indicate a bookkeeping bug in the caller, not an expected
/// transport condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenError {
    /// A value was requested from a token that was never filled.
    IllegalRead,
    /// A value was written to a token that already holds one.
    IllegalWrite,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalRead => write!(f, "illegal read of an empty token"),
            Self::IllegalWrite => write!(f, "illegal write to a filled token"),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<TokenError> for SimError {
    fn from(error: TokenError) -> Self {
        SimError(error.to_string())
    }
}

/// One slot in a sequenced stream.
#[derive(Debug)]
pub struct Token<T>
where
    T: SimObject,
{
    seq_n: u64,
    consumed: Cell<bool>,
    value: RefCell<Option<T>>,
}

impl<T> fmt::Display for Token<T>
where
    T: SimObject,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token {}", self.seq_n)
    }
}

impl<T> Token<T>
where
    T: SimObject,
{
    /// Create a placeholder for a value that has not arrived yet.
    #[must_use]
    pub fn empty(seq_n: u64) -> Self {
        Self {
            seq_n,
            consumed: Cell::new(false),
            value: RefCell::new(None),
        }
    }

    /// Create a slot whose value was already in hand.
    #[must_use]
    pub fn filled(seq_n: u64, value: T) -> Self {
        Self {
            seq_n,
            consumed: Cell::new(false),
            value: RefCell::new(Some(value)),
        }
    }

    /// The sequence number assigned at creation.
    #[must_use]
    pub fn seq_n(&self) -> u64 {
        self.seq_n
    }

    /// True iff no value has ever been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.borrow().is_none()
    }

    /// Read the value, marking the token as consumed.
    ///
    /// Repeated reads return the same value. Reading an empty token is a
    /// contract violation; callers decide emptiness with
    /// [is_empty](Token::is_empty) before reading.
    pub fn data(&self) -> Result<T, TokenError> {
        match self.value.borrow().as_ref() {
            Some(value) => {
                self.consumed.set(true);
                Ok(value.clone())
            }
            None => Err(TokenError::IllegalRead),
        }
    }

    /// Record that the consumer has made its decision for this slot
    /// without reading a value (it substituted one instead).
    pub fn mark_consumed(&self) {
        self.consumed.set(true);
    }

    /// Fill the token.
    ///
    /// Writing a filled token is a contract violation. A write to a token
    /// that was consumed while still empty is silently dropped: the
    /// consumer already treated that slot as lost, and a late arrival must
    /// not change a decision already made.
    pub fn write(&self, value: T) -> Result<(), TokenError> {
        if !self.is_empty() {
            return Err(TokenError::IllegalWrite);
        }
        if self.consumed.get() {
            return Ok(());
        }
        *self.value.borrow_mut() = Some(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_filled_token_reads_its_value_repeatedly() {
        let token = Token::filled(3, 7);
        assert!(!token.is_empty());
        assert_eq!(token.data(), Ok(7));
        assert_eq!(token.data(), Ok(7));
        assert_eq!(token.seq_n(), 3);
    }

    #[test]
    fn an_empty_token_fails_the_read() {
        let token = Token::<i32>::empty(0);
        assert!(token.is_empty());
        assert_eq!(token.data(), Err(TokenError::IllegalRead));
    }

    #[test]
    fn a_token_fills_exactly_once() {
        let token = Token::empty(1);
        token.write(5).unwrap();
        assert_eq!(token.write(6), Err(TokenError::IllegalWrite));
        assert_eq!(token.data(), Ok(5));
    }

    #[test]
    fn a_late_write_after_substitution_is_dropped() {
        let token = Token::<i32>::empty(2);
        token.mark_consumed();
        token.write(9).unwrap();
        assert!(token.is_empty(), "the lost slot must stay lost");
    }
}
