//! Computation of the next wavefront set from the retained wavefronts of lower scores.
//!
//! Gap-affine and two-piece gap-affine penalties share the same kernel: the recurrence loops
//! over one or two gap pieces, each with its own pair of insertion and deletion wavefronts.

use crate::aligner::offsets::{Diag, OffsetType};
use crate::backtrace::{BacktraceBuffer, BtCell};
use crate::errors::WfaError;
use crate::wavefront::memory::{ScoreHistory, WavefrontSlab};
use crate::wavefront::{AlignState, Wavefront, WavefrontSet};

pub(crate) mod recurrence;

use recurrence::{Origin, Recurrence};

/// Backtrace cell of the origin of a derived offset. Gap-closing origins live in the set under
/// construction, all others in the history.
fn origin_bt<'a, O: OffsetType>(
    history: &'a ScoreHistory<O>,
    current: &'a WavefrontSet<O>,
    score: usize,
    origin: &Origin,
) -> Option<&'a BtCell> {
    let set = if origin.score == score {
        current
    } else {
        history.get(origin.score)?
    };

    set.get(origin.state)?.get_bt(origin.k)
}

fn traced<O: OffsetType>(
    history: &ScoreHistory<O>,
    current: &WavefrontSet<O>,
    score: usize,
    origin: &Origin,
    buffer: &mut BacktraceBuffer,
) -> Result<BtCell, WfaError> {
    let cell = origin_bt(history, current, score, origin)
        .ok_or_else(|| WfaError::BacktraceInconsistent(
            format!("no trace data for {:?} at score {}, diagonal {}", origin.state, origin.score, origin.k)))?;

    match origin.op {
        Some(op) => cell.push(op, buffer),
        None => Ok(*cell),
    }
}

fn finish<O: OffsetType>(mut wf: Wavefront<O>, slab: &mut WavefrontSlab<O>) -> Option<Wavefront<O>> {
    if wf.trim() {
        Some(wf)
    } else {
        slab.release(wf);
        None
    }
}

/// Compute the wavefront set for `score`. All lower scores must be committed to `history`, and
/// their match wavefronts must be extended.
///
/// When a backtrace buffer is given, every offset also receives a backtrace cell, derived from
/// the cell of its origin.
pub(crate) fn compute_next<O: OffsetType>(
    recurrence: &Recurrence,
    history: &ScoreHistory<O>,
    slab: &mut WavefrontSlab<O>,
    mut bt_buffer: Option<&mut BacktraceBuffer>,
    score: usize,
) -> Result<WavefrontSet<O>, WfaError> {
    let mut next = WavefrontSet::default();
    let Some((lo, hi)) = recurrence.next_range(history, score) else {
        return Ok(next);
    };

    let piggyback = bt_buffer.is_some();

    for piece in recurrence.pieces() {
        let mut ins = slab.allocate(lo, hi, piggyback)?;
        let mut del = slab.allocate(lo, hi, piggyback)?;

        for k in lo..=hi {
            if let Some((offset, origin)) = recurrence.insertion(history, score, piece, k) {
                ins.set(k, offset);

                if let Some(buffer) = bt_buffer.as_deref_mut() {
                    ins.set_bt(k, traced(history, &next, score, &origin, buffer)?);
                }
            }

            if let Some((offset, origin)) = recurrence.deletion(history, score, piece, k) {
                del.set(k, offset);

                if let Some(buffer) = bt_buffer.as_deref_mut() {
                    del.set_bt(k, traced(history, &next, score, &origin, buffer)?);
                }
            }
        }

        *next.slot_mut(piece.insertion) = finish(ins, slab);
        *next.slot_mut(piece.deletion) = finish(del, slab);
    }

    let mut m = slab.allocate(lo, hi, piggyback)?;
    for k in lo..=hi {
        let gap_offset = |state: AlignState| next.get(state).map_or(O::null(), |wf| wf.get(k));

        if let Some((offset, origin)) = recurrence.match_cell(history, score, k, gap_offset) {
            m.set(k, offset);

            if let Some(buffer) = bt_buffer.as_deref_mut() {
                m.set_bt(k, traced(history, &next, score, &origin, buffer)?);
            }
        }
    }

    next.m = finish(m, slab);

    Ok(next)
}

/// Diagonal range covered by any wavefront in the set
pub(crate) fn set_range<O: OffsetType>(set: &WavefrontSet<O>) -> Option<(Diag, Diag)> {
    set.iter()
        .map(|(_, wf)| (wf.lo(), wf.hi()))
        .reduce(|(lo, hi), (wf_lo, wf_hi)| (lo.min(wf_lo), hi.max(wf_hi)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aligner::config::MemoryMode;
    use crate::aligner::penalties::Penalties;
    use crate::backtrace::BtOp;
    use crate::sequences::PaddedSequences;
    use crate::wavefront::extend::extend_matches;

    struct Fixture {
        seqs: PaddedSequences,
        recurrence: Recurrence,
        history: ScoreHistory<i32>,
        slab: WavefrontSlab<i32>,
        buffer: BacktraceBuffer,
    }

    impl Fixture {
        fn new(penalties: Penalties, pattern: &[u8], text: &[u8]) -> Self {
            let seqs = PaddedSequences::new(pattern, text).unwrap();
            let recurrence = Recurrence::new(&penalties, pattern.len(), text.len()).unwrap();
            let mut history = ScoreHistory::new(MemoryMode::Modular, penalties.score_scope());
            let mut slab = WavefrontSlab::new();

            let mut initial = WavefrontSet::initial(&mut slab, true).unwrap();
            if let Some(m) = initial.m_mut() {
                extend_matches(m, &seqs);
            }
            history.commit(0, initial, &mut slab).unwrap();

            Self { seqs, recurrence, history, slab, buffer: BacktraceBuffer::new() }
        }

        fn advance_to(&mut self, target: usize) {
            for score in self.history.current() + 1..=target {
                let mut next = compute_next(&self.recurrence, &self.history, &mut self.slab,
                                            Some(&mut self.buffer), score).unwrap();

                if let Some(m) = next.m_mut() {
                    extend_matches(m, &self.seqs);
                }

                self.history.commit(score, next, &mut self.slab).unwrap();
            }
        }

        fn offset(&self, score: usize, state: AlignState, k: Diag) -> Option<i32> {
            self.history.get(score)?
                .get(state)
                .map(|wf| wf.get(k))
                .filter(|offset| !offset.is_null())
        }

        fn ops(&self, score: usize, state: AlignState, k: Diag) -> Vec<BtOp> {
            self.history.get(score)
                .and_then(|set| set.get(state))
                .and_then(|wf| wf.get_bt(k))
                .map(|bt| bt.pcigar.ops().to_vec())
                .unwrap_or_default()
        }
    }

    #[test]
    fn test_gap_affine_first_scores() {
        let mut fixture = Fixture::new(Penalties::gap_affine(4, 6, 2), b"AAAA", b"CCCC");

        fixture.advance_to(3);
        assert!(fixture.history.get(1).unwrap().is_null());
        assert!(fixture.history.get(3).unwrap().is_null());

        fixture.advance_to(4);
        assert_eq!(fixture.offset(4, AlignState::Match, 0), Some(1));
        assert_eq!(fixture.offset(4, AlignState::Insertion, 1), None);
        assert_eq!(fixture.ops(4, AlignState::Match, 0), vec![BtOp::Mismatch]);

        fixture.advance_to(8);
        assert_eq!(fixture.offset(8, AlignState::Match, 0), Some(2));
        assert_eq!(fixture.offset(8, AlignState::Insertion, 1), Some(1));
        assert_eq!(fixture.offset(8, AlignState::Deletion, -1), Some(0));
        assert_eq!(fixture.offset(8, AlignState::Match, 1), Some(1));
        assert_eq!(fixture.offset(8, AlignState::Match, -1), Some(0));

        assert_eq!(fixture.ops(8, AlignState::Match, 0), vec![BtOp::Mismatch, BtOp::Mismatch]);
        assert_eq!(fixture.ops(8, AlignState::Insertion, 1), vec![BtOp::InsertionOpen]);
        assert_eq!(fixture.ops(8, AlignState::Match, 1), vec![BtOp::InsertionOpen]);

        fixture.advance_to(10);
        assert_eq!(fixture.offset(10, AlignState::Insertion, 2), Some(2));
        assert_eq!(fixture.ops(10, AlignState::Insertion, 2), vec![BtOp::InsertionOpen, BtOp::InsertionExtend]);
    }

    #[test]
    fn test_bounds_are_respected() {
        // Text of length 1: no diagonal beyond 1, and no offset beyond 1
        let mut fixture = Fixture::new(Penalties::gap_affine(4, 6, 2), b"AAAA", b"C");

        for score in 1..=12 {
            fixture.advance_to(score);
            if let Some(set) = fixture.history.get(score) {
                for (_, wf) in set.iter() {
                    assert!(wf.lo() >= -4 && wf.hi() <= 1);
                    assert!(wf.iter().all(|(_, offset)| offset <= 1));
                }
            }
        }
    }

    #[test]
    fn test_gap_affine_2p_second_piece() {
        let mut fixture = Fixture::new(Penalties::gap_affine_2p(4, 6, 2, 24, 1), b"AAAAAAAA", b"CC");

        fixture.advance_to(25);
        assert_eq!(fixture.offset(8, AlignState::Deletion, -1), Some(0));
        assert_eq!(fixture.offset(24, AlignState::Deletion2, -1), None);
        assert_eq!(fixture.offset(25, AlignState::Deletion2, -1), Some(0));
        assert_eq!(fixture.ops(25, AlignState::Deletion2, -1), vec![BtOp::DeletionOpen]);

        // Deleting two symbols with the second piece costs 26, and with the first 10
        fixture.advance_to(26);
        assert_eq!(fixture.offset(26, AlignState::Deletion2, -2), Some(0));
    }

    #[test]
    fn test_empty_set_without_sources() {
        let fixture = Fixture::new(Penalties::gap_affine(4, 6, 2), b"AC", b"AC");
        let mut slab = WavefrontSlab::new();

        let next = compute_next(&fixture.recurrence, &fixture.history, &mut slab, None, 1).unwrap();
        assert!(next.is_null());
        assert!(set_range(&next).is_none());
    }
}
