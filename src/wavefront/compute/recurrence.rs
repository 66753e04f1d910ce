use crate::aligner::offsets::{in_bounds, Diag, OffsetType};
use crate::aligner::penalties::{GapPiece, GapPieces, Penalties};
use crate::backtrace::BtOp;
use crate::wavefront::memory::ScoreHistory;
use crate::wavefront::AlignState;

/// The cell an offset was derived from
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Origin {
    pub score: usize,
    pub state: AlignState,
    pub k: Diag,

    /// Operation leading from the origin to the derived cell. `None` when closing a gap, which
    /// moves to the match state without consuming any symbol.
    pub op: Option<BtOp>,
}

/// A candidate offset for a cell together with where it came from
pub(crate) type Candidate<O> = (O, Origin);

/// Pick the furthest reaching candidate. On ties, the earliest candidate wins, which fixes the
/// preference order between operations.
#[inline]
pub(crate) fn furthest<O: OffsetType>(candidates: impl IntoIterator<Item=Option<Candidate<O>>>) -> Option<Candidate<O>> {
    candidates.into_iter()
        .flatten()
        .fold(None, |best, candidate| match best {
            Some(b) if b.0 >= candidate.0 => Some(b),
            _ => Some(candidate),
        })
}

/// The gap-affine wavefront recurrence for a particular pair of sequence lengths.
///
/// With `x` the mismatch penalty, and for each gap piece `o` and `e` its open and extend
/// penalties:
///
/// ```text
/// I[s][k] = max(M[s-o-e][k-1], I[s-e][k-1]) + 1
/// D[s][k] = max(M[s-o-e][k+1], D[s-e][k+1])
/// M[s][k] = max(M[s-x][k] + 1, D[s][k], I[s][k])
/// ```
///
/// Candidates that point outside the alignment matrix are discarded before taking the
/// maximum. Ties prefer a mismatch, then deletions before insertions, then the first gap
/// piece, and for gap states opening over extending.
#[derive(Clone, Debug)]
pub(crate) struct Recurrence {
    mismatch: usize,
    pieces: GapPieces,
    pattern_len: usize,
    text_len: usize,
}

impl Recurrence {
    /// Returns `None` for distance metrics without a gap-affine recurrence
    pub fn new(penalties: &Penalties, pattern_len: usize, text_len: usize) -> Option<Self> {
        Some(Self {
            mismatch: penalties.mismatch() as usize,
            pieces: penalties.gap_pieces()?,
            pattern_len,
            text_len,
        })
    }

    pub fn pieces(&self) -> &[GapPiece] {
        &self.pieces
    }

    pub fn pattern_len(&self) -> usize {
        self.pattern_len
    }

    pub fn text_len(&self) -> usize {
        self.text_len
    }

    /// The gap piece writing to the given gap state
    pub fn piece_for(&self, state: AlignState) -> Option<&GapPiece> {
        self.pieces.iter()
            .find(|piece| piece.insertion == state || piece.deletion == state)
    }

    /// Diagonal range `[lo, hi]` of the wavefront set at `score`: one beyond the union of all
    /// source wavefronts, clamped to the diagonals of the alignment matrix. `None` if no source
    /// wavefront exists.
    pub fn next_range<O: OffsetType>(&self, history: &ScoreHistory<O>, score: usize) -> Option<(Diag, Diag)> {
        let mut sources = vec![(self.mismatch, AlignState::Match)];
        for piece in self.pieces.iter() {
            sources.push((piece.open, AlignState::Match));
            sources.push((piece.extend, piece.insertion));
            sources.push((piece.extend, piece.deletion));
        }

        let (lo, hi) = sources.into_iter()
            .filter_map(|(delta, state)| history.get(score.checked_sub(delta)?)?.get(state))
            .fold(None, |range, wf| match range {
                None => Some((wf.lo(), wf.hi())),
                Some((lo, hi)) => Some((wf.lo().min(lo), wf.hi().max(hi))),
            })?;

        let lo = (lo - 1).max(-(self.pattern_len as Diag));
        let hi = (hi + 1).min(self.text_len as Diag);

        (lo <= hi).then_some((lo, hi))
    }

    #[allow(clippy::too_many_arguments)]
    #[inline]
    fn source<O: OffsetType>(
        &self,
        history: &ScoreHistory<O>,
        score: usize,
        delta: usize,
        state: AlignState,
        k_source: Diag,
        k: Diag,
        op: BtOp,
    ) -> Option<Candidate<O>> {
        let source_score = score.checked_sub(delta)?;
        let offset = history.get(source_score)?.get(state)?.get(k_source);
        if offset.is_null() {
            return None;
        }

        let offset = match op {
            BtOp::Mismatch | BtOp::InsertionOpen | BtOp::InsertionExtend => offset.increase_one(),
            BtOp::DeletionOpen | BtOp::DeletionExtend => offset,
        };

        in_bounds(k, offset, self.pattern_len, self.text_len)
            .then_some((offset, Origin { score: source_score, state, k: k_source, op: Some(op) }))
    }

    pub fn mismatch<O: OffsetType>(&self, history: &ScoreHistory<O>, score: usize, k: Diag) -> Option<Candidate<O>> {
        self.source(history, score, self.mismatch, AlignState::Match, k, k, BtOp::Mismatch)
    }

    pub fn insertion<O: OffsetType>(&self, history: &ScoreHistory<O>, score: usize, piece: &GapPiece, k: Diag) -> Option<Candidate<O>> {
        furthest([
            self.source(history, score, piece.open, AlignState::Match, k - 1, k, BtOp::InsertionOpen),
            self.source(history, score, piece.extend, piece.insertion, k - 1, k, BtOp::InsertionExtend),
        ])
    }

    pub fn deletion<O: OffsetType>(&self, history: &ScoreHistory<O>, score: usize, piece: &GapPiece, k: Diag) -> Option<Candidate<O>> {
        furthest([
            self.source(history, score, piece.open, AlignState::Match, k + 1, k, BtOp::DeletionOpen),
            self.source(history, score, piece.extend, piece.deletion, k + 1, k, BtOp::DeletionExtend),
        ])
    }

    /// The match state offset at `score` on diagonal `k`, before exact-match extension.
    /// `gap_offset` gives the offset of a gap state at the same score and diagonal.
    pub fn match_cell<O, F>(&self, history: &ScoreHistory<O>, score: usize, k: Diag, gap_offset: F) -> Option<Candidate<O>>
    where
        O: OffsetType,
        F: Fn(AlignState) -> O,
    {
        let close = |state: AlignState| {
            let offset = gap_offset(state);
            (!offset.is_null())
                .then_some((offset, Origin { score, state, k, op: None }))
        };

        let closing = self.pieces.iter()
            .flat_map(|piece| [close(piece.deletion), close(piece.insertion)]);

        furthest(std::iter::once(self.mismatch(history, score, k)).chain(closing))
    }
}
