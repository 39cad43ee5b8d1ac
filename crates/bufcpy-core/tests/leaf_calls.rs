// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
//! How many times the engine reaches the leaf primitive, per strategy and
//! cancellation policy.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use bufcpy_core::partition::{leaf_count, FlatPlan};
use bufcpy_core::{
    partitioned_compare_with, partitioned_copy_with, recursive_compare_with, recursive_copy_with,
    Cancellation, Dispatch, EngineOptions, Native, Primitive,
};
use common::indexed;

const LEN: usize = 1_000_003;

/// Native primitive that counts its invocations.
#[derive(Default)]
struct Counting {
    calls: AtomicUsize,
}

impl Counting {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Primitive for Counting {
    fn copy(&self, to: &mut [u8], from: &[u8]) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Native.copy(to, from);
    }

    fn equal(&self, a: &[u8], b: &[u8]) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Native.equal(a, b)
    }
}

fn options(dispatch: Dispatch, cancellation: Cancellation) -> EngineOptions {
    EngineOptions {
        dispatch,
        cancellation,
    }
}

fn first_byte_differs() -> (Vec<u8>, Vec<u8>) {
    let a = indexed(LEN);
    let mut b = a.clone();
    b[0] ^= 0xFF;
    (a, b)
}

#[test]
fn recursive_copy_runs_one_call_per_leaf() {
    let from = indexed(LEN);
    for dispatch in [Dispatch::Pool, Dispatch::Threads] {
        for depth in 0..=4 {
            let counting = Counting::default();
            let mut to = vec![0u8; LEN];
            recursive_copy_with(&counting, EngineOptions::with_dispatch(dispatch), &mut to, &from, depth);
            assert_eq!(counting.calls(), leaf_count(depth), "depth={depth} dispatch={dispatch}");
            assert_eq!(to, from);
        }
        let counting = Counting::default();
        let mut to = vec![0u8; LEN];
        recursive_copy_with(&counting, EngineOptions::with_dispatch(dispatch), &mut to, &from, 3);
        assert_eq!(counting.calls(), 8, "dispatch={dispatch}");
    }
}

#[test]
fn partitioned_copy_runs_one_call_per_task() {
    let from = indexed(LEN);
    for dispatch in [Dispatch::Pool, Dispatch::Threads] {
        let counting = Counting::default();
        let mut to = vec![0u8; LEN];
        partitioned_copy_with(&counting, EngineOptions::with_dispatch(dispatch), &mut to, &from, 4);
        assert_eq!(counting.calls(), FlatPlan::new(LEN, 4).task_count());
        assert_eq!(counting.calls(), 5);
    }
}

#[test]
fn early_mismatch_does_not_cancel_siblings_by_default() {
    let (a, b) = first_byte_differs();
    for dispatch in [Dispatch::Pool, Dispatch::Threads] {
        let run = options(dispatch, Cancellation::RunToCompletion);

        let counting = Counting::default();
        assert!(!partitioned_compare_with(&counting, run, &a, &b, 4));
        assert_eq!(counting.calls(), FlatPlan::new(LEN, 4).task_count(), "flat {dispatch}");

        let counting = Counting::default();
        assert!(!recursive_compare_with(&counting, run, &a, &b, 3));
        assert_eq!(counting.calls(), leaf_count(3), "recursive {dispatch}");
    }
}

#[test]
fn eager_cancellation_never_adds_calls() {
    let (a, b) = first_byte_differs();
    for dispatch in [Dispatch::Pool, Dispatch::Threads] {
        let eager = options(dispatch, Cancellation::Eager);

        let counting = Counting::default();
        assert!(!partitioned_compare_with(&counting, eager, &a, &b, 4));
        assert!(counting.calls() <= FlatPlan::new(LEN, 4).task_count(), "flat {dispatch}");

        let counting = Counting::default();
        assert!(!recursive_compare_with(&counting, eager, &a, &b, 3));
        assert!(counting.calls() <= leaf_count(3), "recursive {dispatch}");
    }
}
