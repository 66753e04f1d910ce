use std::fmt::Debug;
use std::hash::Hash;

use num::{FromPrimitive, PrimInt, Signed};

/// Diagonal index, `k = text_pos - pattern_pos`
pub type Diag = isize;

/// Integer types that can store a furthest reaching offset.
///
/// Offsets are signed such that a large negative value can represent an unreachable diagonal.
/// Any offset below zero is considered null, which keeps "null plus one" null as well.
pub trait OffsetType: FromPrimitive + PrimInt + Signed + Default + Hash + Debug + Send + Sync + 'static {
    fn new(value: usize) -> Self;
    fn as_usize(&self) -> usize;
    fn as_isize(&self) -> isize;
    fn increase_one(&self) -> Self;

    /// Sentinel for unreachable diagonals
    fn null() -> Self;

    fn is_null(&self) -> bool;
}

impl OffsetType for i32 {
    #[inline(always)]
    fn new(value: usize) -> Self {
        value as Self
    }

    #[inline(always)]
    fn as_usize(&self) -> usize {
        *self as usize
    }

    #[inline(always)]
    fn as_isize(&self) -> isize {
        *self as isize
    }

    #[inline(always)]
    fn increase_one(&self) -> Self {
        *self + 1
    }

    #[inline(always)]
    fn null() -> Self {
        Self::MIN / 2
    }

    #[inline(always)]
    fn is_null(&self) -> bool {
        *self < 0
    }
}

impl OffsetType for i64 {
    #[inline(always)]
    fn new(value: usize) -> Self {
        value as Self
    }

    #[inline(always)]
    fn as_usize(&self) -> usize {
        *self as usize
    }

    #[inline(always)]
    fn as_isize(&self) -> isize {
        *self as isize
    }

    #[inline(always)]
    fn increase_one(&self) -> Self {
        *self + 1
    }

    #[inline(always)]
    fn null() -> Self {
        Self::MIN / 2
    }

    #[inline(always)]
    fn is_null(&self) -> bool {
        *self < 0
    }
}

/// Pattern position of an offset on diagonal `k`
#[inline(always)]
pub fn pattern_pos<O: OffsetType>(k: Diag, offset: O) -> isize {
    offset.as_isize() - k
}

/// Whether an offset on diagonal `k` lies within the alignment matrix. Null offsets never do.
#[inline(always)]
pub fn in_bounds<O: OffsetType>(k: Diag, offset: O, pattern_len: usize, text_len: usize) -> bool {
    if offset.is_null() {
        return false;
    }

    let v = pattern_pos(k, offset);
    offset.as_usize() <= text_len && v >= 0 && v as usize <= pattern_len
}
