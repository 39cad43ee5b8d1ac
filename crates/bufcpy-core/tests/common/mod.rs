// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code, clippy::expect_used)]
//! Shared fixtures for the engine integration tests.

use bufcpy_core::{buffer, Cancellation, Dispatch, EngineOptions};

/// Every dispatcher × cancellation combination.
pub const OPTION_MATRIX: [EngineOptions; 4] = [
    EngineOptions {
        dispatch: Dispatch::Pool,
        cancellation: Cancellation::RunToCompletion,
    },
    EngineOptions {
        dispatch: Dispatch::Pool,
        cancellation: Cancellation::Eager,
    },
    EngineOptions {
        dispatch: Dispatch::Threads,
        cancellation: Cancellation::RunToCompletion,
    },
    EngineOptions {
        dispatch: Dispatch::Threads,
        cancellation: Cancellation::Eager,
    },
];

/// Buffer of `len` bytes holding `i mod 256`.
pub fn indexed(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    buffer::fill_sequence(&mut buf);
    buf
}

/// Builds a rayon pool with `threads` workers.
pub fn pool(threads: usize) -> rayon::ThreadPool {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .expect("test pool")
}

/// Asserts two buffers match, reporting the number of differing bytes.
pub fn assert_same(to: &[u8], from: &[u8], what: &str) {
    assert_eq!(to.len(), from.len(), "{what}: length differs");
    let diff = buffer::diff_count(to, from);
    assert_eq!(diff, 0, "{what}: found {diff} non-matching bytes");
}
