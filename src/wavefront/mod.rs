use serde::{Deserialize, Serialize};

use crate::aligner::offsets::{Diag, OffsetType};
use crate::backtrace::BtCell;
use crate::errors::WfaError;
use crate::wavefront::memory::WavefrontSlab;

pub mod compute;
pub mod extend;
pub mod memory;

/// Enum representing the alignment state (the wavefront component) of an offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlignState {
    Match,
    Deletion,
    Insertion,
    Deletion2, // For two-piece gap model
    Insertion2,
}

/// Furthest reaching offsets for a contiguous range of diagonals `[lo, hi]`, for a single
/// score and alignment state.
///
/// Diagonals without a reachable offset hold [`OffsetType::null`]. When piggyback backtracing
/// is enabled, `bt` holds a trace cell for each diagonal, indexed identically to `offsets`.
#[derive(Clone, Debug, Default)]
pub struct Wavefront<O> {
    lo: Diag,
    hi: Diag,

    /// Diagonal stored at index 0. Stays fixed when trimming `lo`.
    base: Diag,

    offsets: Vec<O>,
    bt: Vec<BtCell>,
}

impl<O: OffsetType> Wavefront<O> {
    /// Prepare this wavefront to hold diagonals `[lo, hi]`, all null. Keeps already allocated
    /// memory around.
    pub(crate) fn reset(&mut self, lo: Diag, hi: Diag, piggyback: bool) -> Result<(), std::collections::TryReserveError> {
        debug_assert!(lo <= hi);
        let len = (hi - lo + 1) as usize;

        self.offsets.clear();
        self.offsets.try_reserve_exact(len)?;
        self.offsets.resize(len, O::null());

        self.bt.clear();
        if piggyback {
            self.bt.try_reserve_exact(len)?;
            self.bt.resize(len, BtCell::initial());
        }

        self.lo = lo;
        self.hi = hi;
        self.base = lo;

        Ok(())
    }

    #[inline(always)]
    pub fn lo(&self) -> Diag {
        self.lo
    }

    #[inline(always)]
    pub fn hi(&self) -> Diag {
        self.hi
    }

    #[inline(always)]
    pub fn contains(&self, k: Diag) -> bool {
        k >= self.lo && k <= self.hi
    }

    #[inline(always)]
    fn ix(&self, k: Diag) -> usize {
        (k - self.base) as usize
    }

    /// Furthest reaching offset on diagonal `k`, null if the diagonal is not part of this wavefront
    #[inline]
    pub fn get(&self, k: Diag) -> O {
        if self.contains(k) {
            self.offsets[self.ix(k)]
        } else {
            O::null()
        }
    }

    #[inline]
    pub fn get_bt(&self, k: Diag) -> Option<&BtCell> {
        if self.contains(k) {
            self.bt.get(self.ix(k))
        } else {
            None
        }
    }

    #[inline]
    pub fn set(&mut self, k: Diag, offset: O) {
        debug_assert!(self.contains(k));
        let ix = self.ix(k);
        self.offsets[ix] = offset;
    }

    #[inline]
    pub fn set_bt(&mut self, k: Diag, bt: BtCell) {
        debug_assert!(self.contains(k));
        let ix = self.ix(k);
        self.bt[ix] = bt;
    }

    pub fn has_trace(&self) -> bool {
        !self.bt.is_empty()
    }

    /// Iterate over (diagonal, offset) pairs with a reachable offset
    pub fn iter(&self) -> impl Iterator<Item=(Diag, O)> + '_ {
        (self.lo..=self.hi)
            .map(|k| (k, self.get(k)))
            .filter(|(_, offset)| !offset.is_null())
    }

    /// Shrink `[lo, hi]` to the outermost diagonals with a reachable offset. Returns `false` if
    /// no diagonal is reachable.
    pub(crate) fn trim(&mut self) -> bool {
        while self.lo <= self.hi && self.get(self.lo).is_null() {
            self.lo += 1;
        }

        while self.hi >= self.lo && self.get(self.hi).is_null() {
            self.hi -= 1;
        }

        self.lo <= self.hi
    }
}

/// All wavefronts for a single score. Wavefronts of states that were unreachable at this score
/// are `None`.
#[derive(Clone, Debug, Default)]
pub struct WavefrontSet<O> {
    pub(crate) m: Option<Wavefront<O>>,
    pub(crate) i1: Option<Wavefront<O>>,
    pub(crate) d1: Option<Wavefront<O>>,
    pub(crate) i2: Option<Wavefront<O>>,
    pub(crate) d2: Option<Wavefront<O>>,
}

impl<O: OffsetType> WavefrontSet<O> {
    /// The set for score zero: only the match wavefront, with diagonal zero at offset zero
    pub fn initial(slab: &mut WavefrontSlab<O>, piggyback: bool) -> Result<Self, WfaError> {
        let mut m = slab.allocate(0, 0, piggyback)?;
        m.set(0, O::zero());

        Ok(Self { m: Some(m), ..Self::default() })
    }

    pub fn get(&self, state: AlignState) -> Option<&Wavefront<O>> {
        match state {
            AlignState::Match => self.m.as_ref(),
            AlignState::Insertion => self.i1.as_ref(),
            AlignState::Deletion => self.d1.as_ref(),
            AlignState::Insertion2 => self.i2.as_ref(),
            AlignState::Deletion2 => self.d2.as_ref(),
        }
    }

    pub(crate) fn slot_mut(&mut self, state: AlignState) -> &mut Option<Wavefront<O>> {
        match state {
            AlignState::Match => &mut self.m,
            AlignState::Insertion => &mut self.i1,
            AlignState::Deletion => &mut self.d1,
            AlignState::Insertion2 => &mut self.i2,
            AlignState::Deletion2 => &mut self.d2,
        }
    }

    pub fn m(&self) -> Option<&Wavefront<O>> {
        self.m.as_ref()
    }

    pub fn m_mut(&mut self) -> Option<&mut Wavefront<O>> {
        self.m.as_mut()
    }

    /// True if no state reached any diagonal at this score
    pub fn is_null(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Iterate over the non-null wavefronts with their state
    pub fn iter(&self) -> impl Iterator<Item=(AlignState, &Wavefront<O>)> + '_ {
        [AlignState::Match, AlignState::Insertion, AlignState::Deletion, AlignState::Insertion2, AlignState::Deletion2]
            .into_iter()
            .filter_map(|state| self.get(state).map(|wf| (state, wf)))
    }

    /// Take out all wavefronts, leaving a null set behind
    pub(crate) fn drain(&mut self) -> impl Iterator<Item=Wavefront<O>> {
        [self.m.take(), self.i1.take(), self.d1.take(), self.i2.take(), self.d2.take()]
            .into_iter()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_set() {
        let mut slab = WavefrontSlab::<i32>::new();

        // Reuses a released buffer, which must come back clean
        let mut used = slab.allocate(-5, 5, false).unwrap();
        used.set(3, 9);
        slab.release(used);

        let set = WavefrontSet::initial(&mut slab, true).unwrap();
        assert_eq!(slab.num_free(), 0);

        let wf = set.m().unwrap();
        assert_eq!(wf.lo(), 0);
        assert_eq!(wf.hi(), 0);
        assert_eq!(wf.get(0), 0);
        assert!(wf.get(1).is_null());
        assert!(wf.get(-1).is_null());
        assert!(wf.get(3).is_null());
        assert!(wf.has_trace());
        assert_eq!(wf.get_bt(0), Some(&BtCell::initial()));

        let set = WavefrontSet::<i32>::initial(&mut slab, false).unwrap();
        assert!(!set.m().unwrap().has_trace());
    }

    #[test]
    fn test_trim() {
        let mut wf = Wavefront::<i32>::default();
        wf.reset(-3, 3, false).unwrap();
        wf.set(-1, 4);
        wf.set(2, 5);

        assert!(wf.trim());
        assert_eq!((wf.lo(), wf.hi()), (-1, 2));
        assert_eq!(wf.get(-1), 4);
        assert_eq!(wf.get(2), 5);
        assert!(wf.get(3).is_null());
        assert_eq!(wf.iter().collect::<Vec<_>>(), vec![(-1, 4), (2, 5)]);

        let mut empty = Wavefront::<i32>::default();
        empty.reset(0, 2, false).unwrap();
        assert!(!empty.trim());
    }

    #[test]
    fn test_reset_reuses_memory() {
        let mut wf = Wavefront::<i64>::default();
        wf.reset(-10, 10, true).unwrap();
        wf.set(5, 7);

        wf.reset(0, 1, true).unwrap();
        assert!(wf.get(5).is_null());
        assert!(wf.get(0).is_null());
        assert!(wf.offsets.capacity() >= 21);
        assert_eq!(wf.bt.len(), 2);
    }

    #[test]
    fn test_wavefront_set() {
        let mut slab = WavefrontSlab::new();
        let mut set = WavefrontSet::<i32>::initial(&mut slab, false).unwrap();
        assert!(!set.is_null());
        assert!(set.get(AlignState::Insertion).is_none());
        assert_eq!(set.iter().count(), 1);

        assert_eq!(set.drain().count(), 1);
        assert!(set.is_null());
    }
}
