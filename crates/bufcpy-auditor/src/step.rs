// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Buffer-size sweep: how the next size is derived from the current one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::size::{parse_size, SizeError};

/// Smallest additive step; smaller increments are raised to this.
pub const MIN_ADD_STEP: u64 = 32 * 1024;

/// Failure to read a `--step` value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StepError {
    /// Empty step.
    #[error("empty step (expected ^, +SIZE or *N)")]
    Empty,
    /// First character is not `^`, `+` or `*`.
    #[error("unknown step `{0}` (expected ^, +SIZE or *N)")]
    Unknown(String),
    /// `+` with an unreadable size.
    #[error("can't read step amount: {0} (try +64kb)")]
    Amount(#[from] SizeError),
    /// `*` with an unreadable or too small factor.
    #[error("step factor `{0}` must be an integer >= 2 (try *2)")]
    Factor(String),
}

/// Sweep progression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Step {
    /// `size * size`.
    #[default]
    Square,
    /// `size + n` bytes.
    Add(u64),
    /// `size * n`.
    Multiply(u64),
}

impl Step {
    /// Raises an additive step below [`MIN_ADD_STEP`] to the minimum.
    /// Returns the adjusted step and whether it changed.
    pub fn with_minimum(self) -> (Self, bool) {
        match self {
            Self::Add(n) if n < MIN_ADD_STEP => (Self::Add(MIN_ADD_STEP), true),
            other => (other, false),
        }
    }

    /// Size after `size`, or `None` on overflow.
    pub fn next(self, size: u64) -> Option<u64> {
        match self {
            Self::Square => size.checked_mul(size),
            Self::Add(n) => size.checked_add(n),
            Self::Multiply(n) => size.checked_mul(n),
        }
    }

    /// Every size from `min` while it stays `<= max` and keeps growing.
    pub fn sweep(self, min: u64, max: u64) -> Sweep {
        Sweep {
            step: self,
            next: (min <= max).then_some(min),
            max,
        }
    }
}

/// Iterator returned by [`Step::sweep`].
#[derive(Clone, Debug)]
pub struct Sweep {
    step: Step,
    next: Option<u64>,
    max: u64,
}

impl Iterator for Sweep {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let current = self.next?;
        self.next = self
            .step
            .next(current)
            .filter(|&n| n > current && n <= self.max);
        Some(current)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Square => f.write_str("^"),
            Self::Add(n) if n % (1 << 20) == 0 => write!(f, "+{}mb", n >> 20),
            Self::Add(n) if n % 1024 == 0 => write!(f, "+{}kb", n >> 10),
            Self::Add(n) => write!(f, "+{n}"),
            Self::Multiply(n) => write!(f, "*{n}"),
        }
    }
}

impl FromStr for Step {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let action = chars.next().ok_or(StepError::Empty)?;
        let amount = chars.as_str();
        match action {
            '^' if amount.is_empty() => Ok(Self::Square),
            '+' => Ok(Self::Add(parse_size(amount)?)),
            '*' => match amount.trim().parse::<u64>() {
                Ok(n) if n >= 2 => Ok(Self::Multiply(n)),
                _ => Err(StepError::Factor(amount.to_owned())),
            },
            _ => Err(StepError::Unknown(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Step {
    type Error = StepError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Step> for String {
    fn from(step: Step) -> Self {
        step.to_string()
    }
}
