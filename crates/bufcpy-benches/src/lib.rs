// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared fixtures for the bufcpy criterion benches.

use bufcpy_core::buffer;

/// Buffer sizes swept by the size benches: 64 KiB, 1 MiB, 16 MiB.
pub const SIZES: [usize; 3] = [64 << 10, 1 << 20, 16 << 20];

/// Worker counts for the scaling benches.
pub const WORKERS: [usize; 5] = [1, 2, 4, 8, 16];

/// Size used by the scaling benches.
pub const SCALING_SIZE: usize = 8 << 20;

/// Part count / depth pairs that produce the same number of leaves.
pub const FAN_OUT: [(usize, usize); 3] = [(2, 1), (4, 2), (8, 3)];

/// `len` bytes holding `i mod 256`.
pub fn indexed(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    buffer::fill_sequence(&mut buf);
    buf
}

/// Builds a rayon pool with exactly `threads` workers.
pub fn pool(threads: usize) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(move |i| format!("bench-{threads}-{i}"))
        .build()
}
