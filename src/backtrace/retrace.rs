//! Backtrace by recomputation.
//!
//! Without trace data, the path to the end cell is recovered by evaluating the recurrence
//! again for each cell on the path, and following the candidate that produced its offset.
//! Candidates are evaluated in the same order as during the forward computation, so this
//! yields the same edit script as a piggyback backtrace.

use crate::aligner::offsets::{Diag, OffsetType};
use crate::alignment::{CigarOp, EditScript};
use crate::backtrace::BtOp;
use crate::errors::WfaError;
use crate::wavefront::compute::recurrence::Recurrence;
use crate::wavefront::memory::ScoreHistory;
use crate::wavefront::AlignState;

fn inconsistent(state: AlignState, score: usize, k: Diag, reason: &str) -> WfaError {
    WfaError::BacktraceInconsistent(format!("{state:?} cell at score {score}, diagonal {k}: {reason}"))
}

/// Recover the edit script ending at the match state cell on diagonal `k` at `score`. Requires
/// the wavefront sets of all scores up to `score`.
pub(crate) fn retrace<O: OffsetType>(
    recurrence: &Recurrence,
    history: &ScoreHistory<O>,
    score: usize,
    k: Diag,
) -> Result<EditScript, WfaError> {
    let stored = |score: usize, state: AlignState, k: Diag| {
        history.get(score)
            .and_then(|set| set.get(state))
            .map_or(O::null(), |wf| wf.get(k))
    };

    let mut state = AlignState::Match;
    let (mut score, mut k) = (score, k);
    let mut offset = stored(score, state, k);
    if offset.is_null() {
        return Err(inconsistent(state, score, k, "end cell not reached"));
    }

    // Operations in reverse order
    let mut ops = Vec::new();

    loop {
        if state == AlignState::Match {
            if score == 0 {
                if k != 0 {
                    return Err(inconsistent(state, score, k, "path does not start at the origin"));
                }

                ops.extend(std::iter::repeat(CigarOp::Match).take(offset.as_usize()));
                break;
            }

            let (origin_offset, origin) = recurrence
                .match_cell(history, score, k, |gap_state| stored(score, gap_state, k))
                .ok_or_else(|| inconsistent(state, score, k, "no candidate"))?;

            if origin_offset > offset {
                return Err(inconsistent(state, score, k, "candidate beyond the stored offset"));
            }

            let matches = (offset - origin_offset).as_usize();
            ops.extend(std::iter::repeat(CigarOp::Match).take(matches));

            match origin.op {
                Some(BtOp::Mismatch) => {
                    ops.push(CigarOp::Mismatch);
                    offset = origin_offset - O::one();
                },
                Some(_) => return Err(inconsistent(state, score, k, "unexpected origin")),
                None => offset = origin_offset,
            }

            score = origin.score;
            state = origin.state;
        } else {
            let piece = recurrence.piece_for(state)
                .ok_or_else(|| inconsistent(state, score, k, "no gap piece for this state"))?;

            let is_insertion = state == piece.insertion;
            let candidate = if is_insertion {
                recurrence.insertion(history, score, piece, k)
            } else {
                recurrence.deletion(history, score, piece, k)
            };

            let (origin_offset, origin) = candidate
                .ok_or_else(|| inconsistent(state, score, k, "no candidate"))?;

            if origin_offset != offset {
                return Err(inconsistent(state, score, k, "stored offset differs from recomputed offset"));
            }

            if is_insertion {
                ops.push(CigarOp::Insertion);
                offset = origin_offset - O::one();
            } else {
                ops.push(CigarOp::Deletion);
            }

            score = origin.score;
            state = origin.state;
            k = origin.k;
        }
    }

    ops.reverse();
    Ok(EditScript::from_ops(ops, recurrence.pattern_len(), recurrence.text_len()))
}
