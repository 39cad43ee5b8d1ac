// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fan-out / join machinery shared by the partitioning strategies.
//!
//! Two dispatchers are available:
//!
//! - [`Dispatch::Pool`] runs tasks on the current rayon pool. Callers control
//!   the number of worker threads by installing a sized `ThreadPool` before
//!   calling the engine.
//! - [`Dispatch::Threads`] spawns one scoped OS thread per task.
//!
//! Either way a call returns only after every task it spawned has finished,
//! and a panic in any task is re-raised on the caller's thread.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::primitive::Primitive;
use crate::strategy::ParseStrategyError;

/// How spawned tasks are scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Dispatch {
    /// Work-stealing tasks on the current rayon pool.
    #[default]
    Pool,
    /// One scoped OS thread per task.
    Threads,
}

impl Dispatch {
    /// Runs `a` and `b` concurrently and returns both results.
    pub(crate) fn join<A, B, RA, RB>(self, a: A, b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        match self {
            Self::Pool => rayon::join(a, b),
            Self::Threads => thread::scope(|s| {
                let left = s.spawn(a);
                let right = s.spawn(b);
                (settle(left.join()), settle(right.join()))
            }),
        }
    }

    /// Spawns every task and blocks until all of them have completed.
    pub(crate) fn fan_out<I, F>(self, tasks: I)
    where
        I: IntoIterator<Item = F> + Send,
        F: FnOnce() + Send,
    {
        match self {
            Self::Pool => rayon::scope(|s| {
                for task in tasks {
                    s.spawn(move |_| task());
                }
            }),
            Self::Threads => thread::scope(|s| {
                let handles: Vec<_> = tasks.into_iter().map(|task| s.spawn(task)).collect();
                for handle in handles {
                    settle(handle.join());
                }
            }),
        }
    }

    /// Short lowercase name (`pool` / `threads`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pool => "pool",
            Self::Threads => "threads",
        }
    }
}

fn settle<T>(joined: thread::Result<T>) -> T {
    match joined {
        Ok(value) => value,
        Err(payload) => std::panic::resume_unwind(payload),
    }
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dispatch {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pool" => Ok(Self::Pool),
            "threads" | "thread" => Ok(Self::Threads),
            _ => Err(ParseStrategyError::UnknownDispatch(s.to_owned())),
        }
    }
}

/// What a compare does with sibling tasks once one region mismatches.
///
/// Copy operations ignore this setting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Cancellation {
    /// Every spawned task compares its region regardless of the others.
    #[default]
    RunToCompletion,
    /// The first mismatch trips a shared flag; tasks that have not yet
    /// started their comparison skip it and report a mismatch.
    Eager,
}

impl Cancellation {
    /// Short lowercase name (`none` / `eager`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RunToCompletion => "none",
            Self::Eager => "eager",
        }
    }

    pub(crate) fn tripwire(self) -> Option<Tripwire> {
        match self {
            Self::RunToCompletion => None,
            Self::Eager => Some(Tripwire::default()),
        }
    }
}

impl fmt::Display for Cancellation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cancellation {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "run-to-completion" => Ok(Self::RunToCompletion),
            "eager" => Ok(Self::Eager),
            _ => Err(ParseStrategyError::UnknownCancellation(s.to_owned())),
        }
    }
}

/// Scheduling knobs for one engine call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineOptions {
    /// Task scheduler.
    pub dispatch: Dispatch,
    /// Compare cancellation policy.
    pub cancellation: Cancellation,
}

impl EngineOptions {
    /// Options with the given dispatcher and the default cancellation policy.
    pub fn with_dispatch(dispatch: Dispatch) -> Self {
        Self {
            dispatch,
            ..Self::default()
        }
    }
}

/// One-way "a mismatch was seen" flag shared by the tasks of a compare.
#[derive(Debug, Default)]
pub(crate) struct Tripwire(AtomicBool);

impl Tripwire {
    fn trip(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    fn is_tripped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Compares one leaf region, honoring an optional tripwire.
#[inline]
pub(crate) fn leaf_equal<P: Primitive>(
    primitive: &P,
    tripwire: Option<&Tripwire>,
    a: &[u8],
    b: &[u8],
) -> bool {
    let Some(wire) = tripwire else {
        return primitive.equal(a, b);
    };
    if wire.is_tripped() {
        return false;
    }
    let equal = primitive.equal(a, b);
    if !equal {
        wire.trip();
    }
    equal
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic)]
    use super::*;
    use crate::primitive::Native;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn join_returns_both_results() {
        for dispatch in [Dispatch::Pool, Dispatch::Threads] {
            assert_eq!(dispatch.join(|| 1, || "two"), (1, "two"));
        }
    }

    #[test]
    fn fan_out_runs_every_task() {
        for dispatch in [Dispatch::Pool, Dispatch::Threads] {
            let counter = AtomicUsize::new(0);
            let counter_ref = &counter;
            dispatch.fan_out((0..9).map(|_| {
                move || {
                    counter_ref.fetch_add(1, Ordering::Relaxed);
                }
            }));
            assert_eq!(counter.load(Ordering::Relaxed), 9, "{dispatch}");
        }
    }

    #[test]
    #[should_panic(expected = "leaf fault")]
    fn thread_panics_reach_the_caller() {
        Dispatch::Threads.fan_out(std::iter::once(|| panic!("leaf fault")));
    }

    #[test]
    #[should_panic(expected = "leaf fault")]
    fn pool_panics_reach_the_caller() {
        Dispatch::Pool.join(|| (), || panic!("leaf fault"));
    }

    #[test]
    fn tripped_wire_skips_comparison() {
        let wire = Tripwire::default();
        assert!(leaf_equal(&Native, Some(&wire), b"abc", b"abc"));
        assert!(!leaf_equal(&Native, Some(&wire), b"abc", b"abd"));
        assert!(wire.is_tripped());
        // Equal regions now report a mismatch: the verdict is already known.
        assert!(!leaf_equal(&Native, Some(&wire), b"abc", b"abc"));
        assert!(leaf_equal(&Native, None, b"abc", b"abc"));
    }

    #[test]
    fn option_names_round_trip() {
        for d in [Dispatch::Pool, Dispatch::Threads] {
            assert_eq!(d.to_string().parse::<Dispatch>().ok(), Some(d));
        }
        for c in [Cancellation::RunToCompletion, Cancellation::Eager] {
            assert_eq!(c.to_string().parse::<Cancellation>().ok(), Some(c));
        }
    }
}
