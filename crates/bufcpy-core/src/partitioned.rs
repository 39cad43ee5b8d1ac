// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Flat N-way partitioned strategy.
//!
//! The buffer is cut by a [`FlatPlan`] and every partition becomes one task,
//! all spawned at a single fan-out level. The call joins on all of them.

use std::sync::mpsc;

use crate::dispatch::{leaf_equal, EngineOptions};
use crate::partition::FlatPlan;
use crate::primitive::Primitive;

/// Copies `from` into `to` with one concurrent task per planned partition.
///
/// `to.len() == from.len()` and `parts >= 1` are preconditions
/// (debug-asserted).
pub fn partitioned_copy_with<P: Primitive>(
    primitive: &P,
    options: EngineOptions,
    to: &mut [u8],
    from: &[u8],
    parts: usize,
) {
    debug_assert_eq!(to.len(), from.len(), "copy buffers must match");
    let plan = FlatPlan::new(to.len(), parts);
    let tasks = RegionsMut::new(to, from, plan)
        .map(move |(to, from)| move || primitive.copy(to, from));
    options.dispatch.fan_out(tasks);
}

/// Compares `a` and `b` with one concurrent task per planned partition.
///
/// Each task publishes exactly one outcome. Outcomes are drained once the
/// fan-out has joined and draining stops at the first mismatch. Buffers of
/// different length are unequal.
pub fn partitioned_compare_with<P: Primitive>(
    primitive: &P,
    options: EngineOptions,
    a: &[u8],
    b: &[u8],
    parts: usize,
) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let plan = FlatPlan::new(a.len(), parts);
    let expected = plan.task_count();
    let tripwire = options.cancellation.tripwire();
    let tripwire = tripwire.as_ref();

    let (tx, rx) = mpsc::channel();
    let sender = &tx;
    let tasks = plan.map(move |part| {
        let tx = sender.clone();
        let (a, b) = (&a[part.range()], &b[part.range()]);
        move || {
            // The receiver outlives the fan-out, so this cannot fail.
            let _ = tx.send(leaf_equal(primitive, tripwire, a, b));
        }
    });
    options.dispatch.fan_out(tasks);
    drop(tx);

    rx.iter().take(expected).all(|equal| equal)
}

/// Splits a `(to, from)` pair along a plan into disjoint region pairs.
struct RegionsMut<'a> {
    to: &'a mut [u8],
    from: &'a [u8],
    plan: FlatPlan,
}

impl<'a> RegionsMut<'a> {
    fn new(to: &'a mut [u8], from: &'a [u8], plan: FlatPlan) -> Self {
        Self { to, from, plan }
    }
}

impl<'a> Iterator for RegionsMut<'a> {
    type Item = (&'a mut [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let part = self.plan.next()?;
        let (to_head, to_tail) = std::mem::take(&mut self.to).split_at_mut(part.len());
        let (from_head, from_tail) = self.from.split_at(part.len());
        self.to = to_tail;
        self.from = from_tail;
        Some((to_head, from_head))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.plan.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Cancellation, Dispatch};
    use crate::primitive::{Foreign, Native};

    fn indexed(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 256) as u8).collect()
    }

    #[test]
    fn regions_follow_the_plan() {
        let from = indexed(11);
        let mut to = vec![0u8; 11];
        let lens: Vec<_> = RegionsMut::new(&mut to, &from, FlatPlan::new(11, 2))
            .map(|(t, f)| {
                assert_eq!(t.len(), f.len());
                t.len()
            })
            .collect();
        // chunk = 5, remainder = 1
        assert_eq!(lens, vec![1, 5, 5]);
    }

    #[test]
    fn copy_with_remainder_and_both_dispatchers() {
        for dispatch in [Dispatch::Pool, Dispatch::Threads] {
            let options = EngineOptions::with_dispatch(dispatch);
            let from = indexed(10_007);
            let mut to = vec![0u8; from.len()];
            partitioned_copy_with(&Foreign, options, &mut to, &from, 6);
            assert_eq!(to, from, "dispatch={dispatch}");
        }
    }

    #[test]
    fn single_part_is_whole_buffer() {
        let from = indexed(100);
        let mut to = vec![0u8; 100];
        partitioned_copy_with(&Native, EngineOptions::default(), &mut to, &from, 1);
        assert_eq!(to, from);
    }

    #[test]
    fn more_parts_than_bytes() {
        let from = indexed(3);
        let mut to = vec![0u8; 3];
        partitioned_copy_with(&Native, EngineOptions::default(), &mut to, &from, 16);
        assert_eq!(to, from);
        assert!(partitioned_compare_with(&Native, EngineOptions::default(), &to, &from, 16));
    }

    #[test]
    fn empty_buffers_compare_equal() {
        assert!(partitioned_compare_with(&Foreign, EngineOptions::default(), &[], &[], 4));
    }

    #[test]
    fn compare_detects_remainder_mismatch() {
        let a = indexed(1_003);
        let mut b = a.clone();
        b[1] ^= 1; // inside the leading remainder [0, 3)
        for cancellation in [Cancellation::RunToCompletion, Cancellation::Eager] {
            let options = EngineOptions {
                dispatch: Dispatch::Threads,
                cancellation,
            };
            assert!(!partitioned_compare_with(&Native, options, &a, &b, 4));
        }
    }
}
