// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Strategy handles: the contract between the engine and a benchmark harness.
//!
//! A [`Strategy`] pairs a partitioning scheme with a primitive. Calling it
//! runs synchronously: it returns only once every task it spawned is done.
//! The single integer parameter is the recursion depth for
//! [`StrategyKind::Recursive`], the part count for
//! [`StrategyKind::Partitioned`], and ignored for [`StrategyKind::Direct`].

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::dispatch::EngineOptions;
use crate::partitioned::{partitioned_compare_with, partitioned_copy_with};
use crate::primitive::{Foreign, Native, Primitive, PrimitiveKind};
use crate::recursive::{recursive_compare_with, recursive_copy_with};

/// Error returned when parsing a strategy, primitive, or engine option name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseStrategyError {
    /// Unknown partitioning scheme.
    #[error("unknown strategy kind `{0}` (expected direct, recursive or partitioned)")]
    UnknownKind(String),
    /// Unknown primitive.
    #[error("unknown primitive `{0}` (expected native or foreign)")]
    UnknownPrimitive(String),
    /// Unknown dispatcher.
    #[error("unknown dispatch `{0}` (expected pool or threads)")]
    UnknownDispatch(String),
    /// Unknown cancellation policy.
    #[error("unknown cancellation `{0}` (expected none or eager)")]
    UnknownCancellation(String),
    /// Unknown operation.
    #[error("unknown operation `{0}` (expected copy or compare)")]
    UnknownOperation(String),
}

/// The two buffer operations the engine performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Operation {
    /// Copy `from` into `to`.
    Copy,
    /// Byte-for-byte equality.
    Compare,
}

impl Operation {
    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Compare => "compare",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "copy" => Ok(Self::Copy),
            "compare" | "equal" => Ok(Self::Compare),
            _ => Err(ParseStrategyError::UnknownOperation(s.to_owned())),
        }
    }
}

/// Partitioning scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StrategyKind {
    /// The primitive over the whole buffer, no concurrency.
    Direct,
    /// Recursive halving to a depth.
    Recursive,
    /// Flat split into N parts.
    Partitioned,
}

impl StrategyKind {
    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Recursive => "recursive",
            Self::Partitioned => "partitioned",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "recursive" | "dac" => Ok(Self::Recursive),
            "partitioned" | "flat" => Ok(Self::Partitioned),
            _ => Err(ParseStrategyError::UnknownKind(s.to_owned())),
        }
    }
}

/// A partitioning scheme paired with a primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Strategy {
    /// Partitioning scheme.
    pub kind: StrategyKind,
    /// Leaf routine.
    pub primitive: PrimitiveKind,
}

impl Strategy {
    /// Every combination, direct strategies first.
    pub const ALL: [Self; 6] = [
        Self::new(StrategyKind::Direct, PrimitiveKind::Native),
        Self::new(StrategyKind::Direct, PrimitiveKind::Foreign),
        Self::new(StrategyKind::Recursive, PrimitiveKind::Native),
        Self::new(StrategyKind::Recursive, PrimitiveKind::Foreign),
        Self::new(StrategyKind::Partitioned, PrimitiveKind::Native),
        Self::new(StrategyKind::Partitioned, PrimitiveKind::Foreign),
    ];

    /// The harness baseline: native primitive, no partitioning.
    pub const BASELINE: Self = Self::new(StrategyKind::Direct, PrimitiveKind::Native);

    /// Pairs a scheme with a primitive.
    pub const fn new(kind: StrategyKind, primitive: PrimitiveKind) -> Self {
        Self { kind, primitive }
    }

    /// True when the strategy spawns tasks (its parameter matters).
    pub const fn is_concurrent(&self) -> bool {
        !matches!(self.kind, StrategyKind::Direct)
    }

    /// Routine-style name used in reports, e.g. `partitioned_memcpy`.
    pub const fn label(&self, operation: Operation) -> &'static str {
        use PrimitiveKind::{Foreign, Native};
        use StrategyKind::{Direct, Partitioned, Recursive};
        match (operation, self.kind, self.primitive) {
            (Operation::Copy, Direct, Native) => "copy",
            (Operation::Copy, Direct, Foreign) => "memcpy",
            (Operation::Copy, Recursive, Native) => "recursive_copy",
            (Operation::Copy, Recursive, Foreign) => "recursive_memcpy",
            (Operation::Copy, Partitioned, Native) => "partitioned_copy",
            (Operation::Copy, Partitioned, Foreign) => "partitioned_memcpy",
            (Operation::Compare, Direct, Native) => "equal",
            (Operation::Compare, Direct, Foreign) => "memcmp",
            (Operation::Compare, Recursive, Native) => "recursive_equal",
            (Operation::Compare, Recursive, Foreign) => "recursive_memcmp",
            (Operation::Compare, Partitioned, Native) => "partitioned_equal",
            (Operation::Compare, Partitioned, Foreign) => "partitioned_memcmp",
        }
    }

    /// Copies `from` into `to`.
    pub fn copy(&self, options: EngineOptions, to: &mut [u8], from: &[u8], param: usize) {
        match self.primitive {
            PrimitiveKind::Native => run_copy(&Native, self.kind, options, to, from, param),
            PrimitiveKind::Foreign => run_copy(&Foreign, self.kind, options, to, from, param),
        }
    }

    /// Compares `a` and `b`.
    pub fn compare(&self, options: EngineOptions, a: &[u8], b: &[u8], param: usize) -> bool {
        match self.primitive {
            PrimitiveKind::Native => run_compare(&Native, self.kind, options, a, b, param),
            PrimitiveKind::Foreign => run_compare(&Foreign, self.kind, options, a, b, param),
        }
    }
}

fn depth_of(param: usize) -> u32 {
    u32::try_from(param).unwrap_or(u32::MAX)
}

fn run_copy<P: Primitive>(
    primitive: &P,
    kind: StrategyKind,
    options: EngineOptions,
    to: &mut [u8],
    from: &[u8],
    param: usize,
) {
    match kind {
        StrategyKind::Direct => primitive.copy(to, from),
        StrategyKind::Recursive => {
            recursive_copy_with(primitive, options, to, from, depth_of(param));
        }
        StrategyKind::Partitioned => partitioned_copy_with(primitive, options, to, from, param),
    }
}

fn run_compare<P: Primitive>(
    primitive: &P,
    kind: StrategyKind,
    options: EngineOptions,
    a: &[u8],
    b: &[u8],
    param: usize,
) -> bool {
    match kind {
        StrategyKind::Direct => primitive.equal(a, b),
        StrategyKind::Recursive => recursive_compare_with(primitive, options, a, b, depth_of(param)),
        StrategyKind::Partitioned => partitioned_compare_with(primitive, options, a, b, param),
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.primitive)
    }
}

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    /// Parses `kind` or `kind/primitive` (primitive defaults to native).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, primitive) = match s.split_once('/') {
            Some((kind, primitive)) => (kind.parse()?, primitive.parse()?),
            None => (s.parse()?, PrimitiveKind::Native),
        };
        Ok(Self::new(kind, primitive))
    }
}
