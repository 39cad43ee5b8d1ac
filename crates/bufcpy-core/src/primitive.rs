// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Leaf-level copy and compare routines.
//!
//! A [`Primitive`] operates on one contiguous region and never subdivides it.
//! The partitioning strategies are generic over the primitive, so every
//! strategy can be measured with either the native slice routines or the
//! C library's `memcpy`/`memcmp`.

use std::fmt;
use std::str::FromStr;

use crate::strategy::ParseStrategyError;

/// A single-threaded bulk copy / equality routine applied at a leaf.
///
/// Implementations must be `Sync`: the same primitive is shared by every
/// concurrent task of a partitioned call.
pub trait Primitive: Sync {
    /// Copies `from` into `to`.
    ///
    /// Callers guarantee `to.len() == from.len()`.
    fn copy(&self, to: &mut [u8], from: &[u8]);

    /// Returns `true` iff both regions hold the same bytes.
    ///
    /// Regions of different length are never equal.
    fn equal(&self, a: &[u8], b: &[u8]) -> bool;
}

/// Rust's built-in slice copy and slice equality.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Native;

impl Primitive for Native {
    #[inline]
    fn copy(&self, to: &mut [u8], from: &[u8]) {
        debug_assert_eq!(to.len(), from.len(), "copy regions must match");
        to.copy_from_slice(from);
    }

    #[inline]
    fn equal(&self, a: &[u8], b: &[u8]) -> bool {
        a == b
    }
}

/// The platform C library's `memcpy` / `memcmp`, called through FFI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Foreign;

impl Primitive for Foreign {
    #[inline]
    fn copy(&self, to: &mut [u8], from: &[u8]) {
        debug_assert_eq!(to.len(), from.len(), "copy regions must match");
        ffi::copy(to, from);
    }

    #[inline]
    fn equal(&self, a: &[u8], b: &[u8]) -> bool {
        a.len() == b.len() && ffi::equal(a, b)
    }
}

#[allow(unsafe_code)]
mod ffi {
    use std::ffi::{c_int, c_void};

    unsafe extern "C" {
        fn memcpy(dest: *mut c_void, src: *const c_void, n: usize) -> *mut c_void;
        fn memcmp(s1: *const c_void, s2: *const c_void, n: usize) -> c_int;
    }

    pub(super) fn copy(to: &mut [u8], from: &[u8]) {
        let len = to.len().min(from.len());
        if len == 0 {
            return;
        }
        // SAFETY: both pointers are valid for `len` bytes, and a `&mut` slice
        // cannot alias a live `&` slice, so the regions do not overlap.
        unsafe {
            memcpy(to.as_mut_ptr().cast(), from.as_ptr().cast(), len);
        }
    }

    pub(super) fn equal(a: &[u8], b: &[u8]) -> bool {
        debug_assert_eq!(a.len(), b.len());
        if a.is_empty() {
            return true;
        }
        // SAFETY: both pointers are valid for `a.len()` bytes of reads.
        unsafe { memcmp(a.as_ptr().cast(), b.as_ptr().cast(), a.len()) == 0 }
    }
}

/// Runtime selector for a [`Primitive`] implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PrimitiveKind {
    /// [`Native`].
    #[default]
    Native,
    /// [`Foreign`].
    Foreign,
}

impl PrimitiveKind {
    /// Both primitives, native first.
    pub const ALL: [Self; 2] = [Self::Native, Self::Foreign];

    /// Short lowercase name (`native` / `foreign`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Foreign => "foreign",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrimitiveKind {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "foreign" | "libc" | "c" => Ok(Self::Foreign),
            _ => Err(ParseStrategyError::UnknownPrimitive(s.to_owned())),
        }
    }
}
