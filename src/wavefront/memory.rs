use std::cell::Cell;

use crate::aligner::config::MemoryMode;
use crate::aligner::offsets::{Diag, OffsetType};
use crate::errors::WfaError;
use crate::wavefront::{Wavefront, WavefrontSet};

/// Pool of wavefront buffers, such that memory of discarded wavefronts is reused for new ones
#[derive(Debug, Default)]
pub struct WavefrontSlab<O> {
    free: Vec<Wavefront<O>>,
}

impl<O: OffsetType> WavefrontSlab<O> {
    pub fn new() -> Self {
        Self { free: Vec::new() }
    }

    /// Obtain a wavefront covering diagonals `[lo, hi]` with all offsets null
    pub fn allocate(&mut self, lo: Diag, hi: Diag, piggyback: bool) -> Result<Wavefront<O>, WfaError> {
        let mut wf = self.free.pop().unwrap_or_default();
        wf.reset(lo, hi, piggyback)?;

        Ok(wf)
    }

    pub fn release(&mut self, wf: Wavefront<O>) {
        self.free.push(wf);
    }

    pub fn release_set(&mut self, set: &mut WavefrontSet<O>) {
        self.free.extend(set.drain());
    }

    pub fn num_free(&self) -> usize {
        self.free.len()
    }
}

/// Wavefront sets indexed by score.
///
/// With full memory, every score gets its own slot. With modular memory, only the last `scope`
/// scores are kept in a ring buffer, and committing a new score recycles the set of the score
/// `scope` steps earlier.
#[derive(Debug)]
pub struct ScoreHistory<O> {
    mode: MemoryMode,
    scope: usize,
    slots: Vec<(usize, WavefrontSet<O>)>,
    current: usize,
    max_lookback: Cell<usize>,
}

impl<O: OffsetType> ScoreHistory<O> {
    pub fn new(mode: MemoryMode, scope: usize) -> Self {
        Self {
            mode,
            scope,
            slots: Vec::new(),
            current: 0,
            max_lookback: Cell::new(0),
        }
    }

    pub fn mode(&self) -> MemoryMode {
        self.mode
    }

    pub fn scope(&self) -> usize {
        self.scope
    }

    /// Largest distance between the most recent score and a requested score
    pub fn max_lookback(&self) -> usize {
        self.max_lookback.get()
    }

    /// The most recently committed score
    pub fn current(&self) -> usize {
        self.current
    }

    #[inline]
    fn slot_ix(&self, score: usize) -> usize {
        match self.mode {
            MemoryMode::Full => score,
            MemoryMode::Modular => score % self.scope,
        }
    }

    /// Store the wavefront set for `score`, which must be the next score after the current one
    /// (or zero to start a new alignment). Wavefronts of an evicted set are returned to the slab.
    pub fn commit(&mut self, score: usize, set: WavefrontSet<O>, slab: &mut WavefrontSlab<O>) -> Result<(), WfaError> {
        debug_assert!(score == 0 || score == self.current + 1);

        if score == 0 {
            self.release_all(slab);
            self.max_lookback.set(0);
        }

        let ix = self.slot_ix(score);
        if ix < self.slots.len() {
            let (_, evicted) = &mut self.slots[ix];
            slab.release_set(evicted);
            self.slots[ix] = (score, set);
        } else {
            debug_assert_eq!(ix, self.slots.len());
            self.slots.try_reserve(1)?;
            self.slots.push((score, set));
        }

        self.current = score;
        Ok(())
    }

    /// The wavefront set for `score`, or `None` if it was never computed or was already evicted
    pub fn get(&self, score: usize) -> Option<&WavefrontSet<O>> {
        if score > self.current {
            return None;
        }

        let lookback = self.current - score;
        if lookback > self.max_lookback.get() {
            self.max_lookback.set(lookback);
        }

        debug_assert!(self.mode == MemoryMode::Full || lookback < self.scope,
            "score {score} is out of scope (current: {}, scope: {})", self.current, self.scope);

        self.slots.get(self.slot_ix(score))
            .filter(|(slot_score, _)| *slot_score == score)
            .map(|(_, set)| set)
    }

    pub fn get_mut(&mut self, score: usize) -> Option<&mut WavefrontSet<O>> {
        let ix = self.slot_ix(score);
        self.slots.get_mut(ix)
            .filter(|(slot_score, _)| *slot_score == score)
            .map(|(_, set)| set)
    }

    /// Return all wavefronts to the slab. Statistics are kept until the next alignment starts.
    pub fn release_all(&mut self, slab: &mut WavefrontSlab<O>) {
        for (_, set) in self.slots.iter_mut() {
            slab.release_set(set);
        }

        self.slots.clear();
        self.current = 0;
    }

    /// Number of wavefront sets in memory
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_with_m(slab: &mut WavefrontSlab<i32>, offset: i32) -> WavefrontSet<i32> {
        let mut m = slab.allocate(0, 0, false).unwrap();
        m.set(0, offset);

        WavefrontSet { m: Some(m), ..WavefrontSet::default() }
    }

    #[test]
    fn test_modular_history() {
        let mut slab = WavefrontSlab::new();
        let mut history = ScoreHistory::new(MemoryMode::Modular, 3);

        for score in 0..7 {
            let set = set_with_m(&mut slab, score as i32);
            history.commit(score, set, &mut slab).unwrap();
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.current(), 6);
        assert_eq!(history.get(6).and_then(|s| s.m()).map(|m| m.get(0)), Some(6));
        assert_eq!(history.get(4).and_then(|s| s.m()).map(|m| m.get(0)), Some(4));
        assert!(history.get(7).is_none());
        assert_eq!(history.max_lookback(), 2);

        // Evicted sets were recycled, so only four wavefronts were ever allocated
        assert_eq!(slab.num_free(), 1);

        history.release_all(&mut slab);
        assert!(history.is_empty());
        assert_eq!(slab.num_free(), 4);
        assert_eq!(history.max_lookback(), 2);
    }

    #[test]
    fn test_full_history() {
        let mut slab = WavefrontSlab::new();
        let mut history = ScoreHistory::new(MemoryMode::Full, 3);

        for score in 0..7 {
            let set = set_with_m(&mut slab, score as i32);
            history.commit(score, set, &mut slab).unwrap();
        }

        assert_eq!(history.len(), 7);
        assert_eq!(history.get(0).and_then(|s| s.m()).map(|m| m.get(0)), Some(0));
        assert_eq!(history.max_lookback(), 6);
        assert_eq!(slab.num_free(), 0);
    }

    #[test]
    fn test_commit_zero_restarts() {
        let mut slab = WavefrontSlab::new();
        let mut history = ScoreHistory::new(MemoryMode::Full, 3);

        for score in 0..3 {
            let set = set_with_m(&mut slab, score as i32);
            history.commit(score, set, &mut slab).unwrap();
        }

        let set = set_with_m(&mut slab, 10);
        history.commit(0, set, &mut slab).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.max_lookback(), 0);
        assert_eq!(history.get_mut(0).and_then(|s| s.m_mut()).map(|m| m.get(0)), Some(10));
    }
}
