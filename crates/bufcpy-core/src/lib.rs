// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! bufcpy-core: parallel copy and compare over byte buffers.
//!
//! The engine partitions a `(to, from)` buffer pair into disjoint regions,
//! runs a leaf [`Primitive`] on each region concurrently, and joins before
//! returning. Two partitioning schemes are provided:
//!
//! - **recursive** — halve to a depth, `2^depth` leaves ([`recursive_copy`]);
//! - **partitioned** — one flat fan-out over `parts` chunks plus an optional
//!   leading remainder chunk ([`partitioned_copy`]).
//!
//! The free functions use the [`Native`] primitive on the current rayon pool.
//! The `*_with` variants take any primitive and explicit [`EngineOptions`];
//! [`Strategy`] selects both at runtime for harnesses.
//!
//! # Preconditions
//!
//! Copy requires `to.len() == from.len()`; `parts >= 1`. Violations are
//! debug-asserted and otherwise panic or produce unspecified contents. Compare
//! never panics on length mismatch: it returns `false`.
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::many_single_char_names,
    clippy::module_name_repetitions,
    clippy::use_self
)]
// Leaf FFI opts back into `unsafe_code` locally; see `primitive::ffi`.

/// Buffer fill / reset / diff helpers.
pub mod buffer;
mod dispatch;
/// Partition plans (flat and recursive).
pub mod partition;
mod partitioned;
mod primitive;
mod recursive;
mod strategy;

pub use dispatch::{Cancellation, Dispatch, EngineOptions};
pub use partition::{FlatPlan, Partition};
pub use partitioned::{partitioned_compare_with, partitioned_copy_with};
pub use primitive::{Foreign, Native, Primitive, PrimitiveKind};
pub use recursive::{recursive_compare_with, recursive_copy_with};
pub use strategy::{Operation, ParseStrategyError, Strategy, StrategyKind};

/// Copies `from` into `to` with the native primitive, no concurrency.
#[inline]
pub fn copy(to: &mut [u8], from: &[u8]) {
    Native.copy(to, from);
}

/// Byte-for-byte equality with the native primitive, no concurrency.
#[inline]
pub fn compare(a: &[u8], b: &[u8]) -> bool {
    Native.equal(a, b)
}

/// Recursive divide-and-conquer copy to `depth` levels.
pub fn recursive_copy(to: &mut [u8], from: &[u8], depth: u32) {
    recursive_copy_with(&Native, EngineOptions::default(), to, from, depth);
}

/// Recursive divide-and-conquer compare to `depth` levels.
pub fn recursive_compare(a: &[u8], b: &[u8], depth: u32) -> bool {
    recursive_compare_with(&Native, EngineOptions::default(), a, b, depth)
}

/// Flat copy over `parts` chunks (plus a leading remainder chunk).
pub fn partitioned_copy(to: &mut [u8], from: &[u8], parts: usize) {
    partitioned_copy_with(&Native, EngineOptions::default(), to, from, parts);
}

/// Flat compare over `parts` chunks (plus a leading remainder chunk).
pub fn partitioned_compare(a: &[u8], b: &[u8], parts: usize) -> bool {
    partitioned_compare_with(&Native, EngineOptions::default(), a, b, parts)
}
