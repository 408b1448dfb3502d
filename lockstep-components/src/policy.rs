//! Consumer-side value substitution.
//!
//! When a consumer drains its [sequenced buffer](crate::sequencer) and
//! finds a slot still empty, it must produce a usable value without
//! stalling. An [Estimator] tracks the values genuinely received for one
//! input and substitutes for the missing ones according to the configured
//! [SubstitutionPolicy], counting the losses so a run can report an
//! empirical loss rate.

use std::fmt;
use std::str::FromStr;

use lockstep_engine::traits::SimObject;

/// What to substitute for a value that never arrived in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubstitutionPolicy {
    /// Always substitute the configured default.
    Static,
    /// Substitute the most recently received value.
    LastSeen,
    /// Substitute the running average of the values received so far.
    RunningAverage,
}

impl fmt::Display for SubstitutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::LastSeen => write!(f, "last-seen"),
            Self::RunningAverage => write!(f, "running-average"),
        }
    }
}

impl FromStr for SubstitutionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(Self::Static),
            "last-seen" => Ok(Self::LastSeen),
            "running-average" => Ok(Self::RunningAverage),
            _ => Err(format!("unknown substitution policy '{s}'")),
        }
    }
}

/// A value that an [Estimator] can average.
pub trait Sample: SimObject {
    /// The additive identity.
    fn zero() -> Self;

    /// Add `other` into this value element-wise.
    fn accumulate(&mut self, other: &Self);

    /// This value scaled by `factor` element-wise.
    #[must_use]
    fn scaled(&self, factor: f64) -> Self;
}

impl Sample for f64 {
    fn zero() -> Self {
        0.0
    }

    fn accumulate(&mut self, other: &Self) {
        *self += other;
    }

    fn scaled(&self, factor: f64) -> Self {
        self * factor
    }
}

/// Per-input bookkeeping for one substitution policy.
pub struct Estimator<T>
where
    T: Sample,
{
    policy: SubstitutionPolicy,
    default_value: T,
    last_seen: Option<T>,
    running_sum: T,
    num_received: u64,
    num_lost: u64,
}

impl<T> Estimator<T>
where
    T: Sample,
{
    /// Create an estimator. `default_value` is what the `Static` policy
    /// substitutes, and what `LastSeen` falls back to before anything has
    /// been received.
    #[must_use]
    pub fn new(policy: SubstitutionPolicy, default_value: T) -> Self {
        Self {
            policy,
            default_value,
            last_seen: None,
            running_sum: T::zero(),
            num_received: 0,
            num_lost: 0,
        }
    }

    /// Record a genuinely received value.
    pub fn record(&mut self, value: &T) {
        self.last_seen = Some(value.clone());
        self.running_sum.accumulate(value);
        self.num_received += 1;
    }

    /// Produce a substitute for a value that never arrived, counting the
    /// loss.
    pub fn substitute(&mut self) -> T {
        self.num_lost += 1;
        match self.policy {
            SubstitutionPolicy::Static => self.default_value.clone(),
            SubstitutionPolicy::LastSeen => match &self.last_seen {
                Some(value) => value.clone(),
                None => self.default_value.clone(),
            },
            SubstitutionPolicy::RunningAverage => {
                if self.num_received == 0 {
                    T::zero()
                } else {
                    self.running_sum.scaled(1.0 / self.num_received as f64)
                }
            }
        }
    }

    #[must_use]
    pub fn num_received(&self) -> u64 {
        self.num_received
    }

    #[must_use]
    pub fn num_lost(&self) -> u64 {
        self.num_lost
    }

    /// The fraction of consumed positions that had to be substituted.
    #[must_use]
    pub fn loss_rate(&self) -> f64 {
        let total = self.num_received + self.num_lost;
        if total == 0 {
            0.0
        } else {
            self.num_lost as f64 / total as f64
        }
    }
}
