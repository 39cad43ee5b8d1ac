// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recursive divide-and-conquer strategy.
//!
//! Each level splits its range at [`split_point`] and runs both halves
//! concurrently with `depth - 1`, joining before it returns. Depth 0 applies
//! the primitive directly on the calling task.

use crate::dispatch::{leaf_equal, Dispatch, EngineOptions, Tripwire};
use crate::partition::split_point;
use crate::primitive::Primitive;

/// Copies `from` into `to` through `2^depth` concurrent leaves.
///
/// `to.len() == from.len()` is a precondition (debug-asserted).
pub fn recursive_copy_with<P: Primitive>(
    primitive: &P,
    options: EngineOptions,
    to: &mut [u8],
    from: &[u8],
    depth: u32,
) {
    debug_assert_eq!(to.len(), from.len(), "copy buffers must match");
    descend_copy(primitive, options.dispatch, to, from, depth);
}

fn descend_copy<P: Primitive>(
    primitive: &P,
    dispatch: Dispatch,
    to: &mut [u8],
    from: &[u8],
    depth: u32,
) {
    if depth == 0 {
        primitive.copy(to, from);
        return;
    }
    let h = split_point(to.len());
    let (to_left, to_right) = to.split_at_mut(h);
    let (from_left, from_right) = from.split_at(h);
    dispatch.join(
        || descend_copy(primitive, dispatch, to_left, from_left, depth - 1),
        || descend_copy(primitive, dispatch, to_right, from_right, depth - 1),
    );
}

/// Compares `a` and `b` through `2^depth` concurrent leaves.
///
/// Buffers of different length are unequal. Every level waits for both of
/// its branches before combining their verdicts.
pub fn recursive_compare_with<P: Primitive>(
    primitive: &P,
    options: EngineOptions,
    a: &[u8],
    b: &[u8],
    depth: u32,
) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let tripwire = options.cancellation.tripwire();
    descend_equal(primitive, options.dispatch, tripwire.as_ref(), a, b, depth)
}

fn descend_equal<P: Primitive>(
    primitive: &P,
    dispatch: Dispatch,
    tripwire: Option<&Tripwire>,
    a: &[u8],
    b: &[u8],
    depth: u32,
) -> bool {
    if depth == 0 {
        return leaf_equal(primitive, tripwire, a, b);
    }
    let h = split_point(a.len());
    let (a_left, a_right) = a.split_at(h);
    let (b_left, b_right) = b.split_at(h);
    let (left, right) = dispatch.join(
        || descend_equal(primitive, dispatch, tripwire, a_left, b_left, depth - 1),
        || descend_equal(primitive, dispatch, tripwire, a_right, b_right, depth - 1),
    );
    left && right
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Cancellation;
    use crate::primitive::{Foreign, Native};

    fn indexed(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 256) as u8).collect()
    }

    #[test]
    fn depth_zero_is_a_plain_copy() {
        let from = indexed(33);
        let mut to = vec![0u8; 33];
        recursive_copy_with(&Native, EngineOptions::default(), &mut to, &from, 0);
        assert_eq!(to, from);
    }

    #[test]
    fn odd_lengths_copy_exactly() {
        for dispatch in [Dispatch::Pool, Dispatch::Threads] {
            let options = EngineOptions::with_dispatch(dispatch);
            for len in [1usize, 3, 5, 127, 1001] {
                let from = indexed(len);
                let mut to = vec![0u8; len];
                recursive_copy_with(&Foreign, options, &mut to, &from, 4);
                assert_eq!(to, from, "len={len} dispatch={dispatch}");
            }
        }
    }

    #[test]
    fn depth_deeper_than_length_still_copies() {
        // Leaves of length zero are valid partitions.
        let from = indexed(3);
        let mut to = vec![0u8; 3];
        recursive_copy_with(&Native, EngineOptions::default(), &mut to, &from, 6);
        assert_eq!(to, from);
    }

    #[test]
    fn compare_finds_mismatch_in_right_half() {
        let a = indexed(4096);
        let mut b = a.clone();
        b[4095] = b[4095].wrapping_add(1);
        for cancellation in [Cancellation::RunToCompletion, Cancellation::Eager] {
            let options = EngineOptions {
                dispatch: Dispatch::Pool,
                cancellation,
            };
            assert!(!recursive_compare_with(&Native, options, &a, &b, 3));
            assert!(recursive_compare_with(&Native, options, &a, &a, 3));
        }
    }

    #[test]
    fn compare_length_mismatch_is_false() {
        let options = EngineOptions::default();
        assert!(!recursive_compare_with(&Foreign, options, &[0; 10], &[0; 20], 2));
    }
}
