// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Partition plans for the recursive and flat strategies.
//!
//! Every plan yields contiguous, non-overlapping [`Partition`]s in ascending
//! order whose union is exactly `[0, len)`. The engine walks a plan while it
//! splits the destination slice, so no two tasks ever see the same bytes.
//!
//! # Flat plan
//!
//! ```text
//! chunk     = len / parts
//! remainder = len % chunk
//! [0, remainder)                      (only when remainder > 0)
//! [remainder + k*chunk, .. + chunk)   for k in 0..(len - remainder) / chunk
//! ```
//!
//! The remainder is taken modulo `chunk`, not `parts`, so the regular chunks
//! are all exactly `chunk` long and end flush with the buffer. Their count is
//! `len / chunk`, which is at least `parts`.
//!
//! # Recursive plan
//!
//! Each level splits at `len / 2`; on odd lengths the left half is one byte
//! shorter than the right. This tie-break is fixed so timings stay comparable
//! across runs.

use std::ops::Range;

/// A half-open byte range `[start, end)` handled by one task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Partition {
    /// First byte index (inclusive).
    pub start: usize,
    /// One past the last byte index.
    pub end: usize,
}

impl Partition {
    /// Creates a partition; `start <= end` is required.
    pub const fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Number of bytes covered.
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// True when the partition covers no bytes.
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The partition as a slice index range.
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Split point of a recursive level: the left half gets the floor.
#[inline]
pub const fn split_point(len: usize) -> usize {
    len / 2
}

/// Leaves produced by a recursion of `depth` levels (`2^depth`).
///
/// Saturates at `usize::MAX` for depths beyond the pointer width.
pub const fn leaf_count(depth: u32) -> usize {
    if depth >= usize::BITS {
        usize::MAX
    } else {
        1 << depth
    }
}

/// Tasks spawned across a whole recursion of `depth` levels
/// (`2^(depth+1) - 2`; the root call itself is not a spawned task).
pub const fn spawned_task_count(depth: u32) -> usize {
    leaf_count(depth).saturating_mul(2).saturating_sub(2)
}

/// Leaf partitions of a recursive split of `len` bytes, in ascending order.
///
/// This mirrors the engine's recursion exactly and exists for inspection and
/// tests; the engine itself never materializes the list.
pub fn recursive_leaves(len: usize, depth: u32) -> Vec<Partition> {
    fn descend(start: usize, len: usize, depth: u32, out: &mut Vec<Partition>) {
        if depth == 0 {
            out.push(Partition::new(start, start + len));
            return;
        }
        let h = split_point(len);
        descend(start, h, depth - 1, out);
        descend(start + h, len - h, depth - 1, out);
    }

    let mut out = Vec::with_capacity(leaf_count(depth.min(20)));
    descend(0, len, depth, &mut out);
    out
}

/// Iterator over the partitions of a flat N-way split.
///
/// When `len < parts` the chunk size would be zero; the plan then degrades to
/// a single partition over the whole buffer (none for an empty buffer).
#[derive(Clone, Debug)]
pub struct FlatPlan {
    len: usize,
    chunk: usize,
    remainder: usize,
    cursor: usize,
}

impl FlatPlan {
    /// Plans `len` bytes into `parts` chunks.
    ///
    /// `parts >= 1` is a caller precondition; `parts == 0` panics on the
    /// division like any other integer division by zero.
    pub fn new(len: usize, parts: usize) -> Self {
        debug_assert!(parts >= 1, "parts must be >= 1");
        let chunk = match len / parts {
            0 => len,
            chunk => chunk,
        };
        let remainder = if chunk == 0 { 0 } else { len % chunk };
        Self {
            len,
            chunk,
            remainder,
            cursor: 0,
        }
    }

    /// Size of every regular chunk.
    pub const fn chunk_len(&self) -> usize {
        self.chunk
    }

    /// Size of the leading remainder partition (0 when there is none).
    pub const fn remainder(&self) -> usize {
        self.remainder
    }

    /// Total number of tasks the plan dispatches (remainder task included).
    pub fn task_count(&self) -> usize {
        let regular = if self.chunk == 0 {
            0
        } else {
            (self.len - self.remainder) / self.chunk
        };
        regular + usize::from(self.remainder > 0)
    }

    fn remaining(&self) -> usize {
        if self.chunk == 0 || self.cursor >= self.len {
            return 0;
        }
        if self.cursor == 0 {
            return self.task_count();
        }
        (self.len - self.cursor) / self.chunk
    }
}

impl Iterator for FlatPlan {
    type Item = Partition;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }
        let end = if self.cursor == 0 && self.remainder > 0 {
            self.remainder
        } else {
            self.cursor + self.chunk
        };
        let part = Partition::new(self.cursor, end);
        self.cursor = end;
        Some(part)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for FlatPlan {}
