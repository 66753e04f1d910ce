use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use crate::errors::WfaError;
use crate::wavefront::AlignState;

/// The family of distance functions an aligner can be configured with
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DistanceMetric {
    Edit,
    GapLinear,
    GapAffine,
    GapAffine2p,
}

impl Display for DistanceMetric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Edit => write!(f, "edit distance"),
            Self::GapLinear => write!(f, "gap-linear distance"),
            Self::GapAffine => write!(f, "gap-affine distance"),
            Self::GapAffine2p => write!(f, "two-piece gap-affine distance"),
        }
    }
}

/// Alignment penalties. Matches are always free; all other costs are positive penalties.
///
/// A gap of length `l` costs `gap_open + l * gap_extend`. With two-piece gap-affine penalties,
/// a gap costs the minimum of both pieces, which allows modelling short and long gaps differently.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum Penalties {
    Edit,
    GapLinear {
        mismatch: u32,
        indel: u32,
    },
    GapAffine {
        mismatch: u32,
        gap_open: u32,
        gap_extend: u32,
    },
    GapAffine2p {
        mismatch: u32,
        gap_open1: u32,
        gap_extend1: u32,
        gap_open2: u32,
        gap_extend2: u32,
    },
}

impl Default for Penalties {
    fn default() -> Self {
        Self::gap_affine(4, 6, 2)
    }
}

/// One gap-affine piece as used by the wavefront recurrence: the score delta to open (and
/// extend once) a gap, the delta to extend it, and the wavefront states it writes to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct GapPiece {
    pub open: usize,
    pub extend: usize,
    pub insertion: AlignState,
    pub deletion: AlignState,
}

pub(crate) type GapPieces = SmallVec<[GapPiece; 2]>;

/// Score delta of opening a gap, which includes its first extension
#[inline]
fn open_delta(gap_open: u32, gap_extend: u32) -> u64 {
    gap_open as u64 + gap_extend as u64
}

/// Gap opening plus extension must fit a single penalty value
fn check_open_delta(gap_open: u32, gap_extend: u32) -> Result<(), WfaError> {
    if gap_open.checked_add(gap_extend).is_none() {
        return Err(WfaError::InvalidPenalties(
            format!("gap open ({gap_open}) plus gap extension ({gap_extend}) penalty is too large")));
    }

    Ok(())
}

impl Penalties {
    pub fn gap_affine(mismatch: u32, gap_open: u32, gap_extend: u32) -> Self {
        Self::GapAffine { mismatch, gap_open, gap_extend }
    }

    pub fn gap_affine_2p(mismatch: u32, gap_open1: u32, gap_extend1: u32, gap_open2: u32, gap_extend2: u32) -> Self {
        Self::GapAffine2p { mismatch, gap_open1, gap_extend1, gap_open2, gap_extend2 }
    }

    pub fn metric(&self) -> DistanceMetric {
        match self {
            Self::Edit => DistanceMetric::Edit,
            Self::GapLinear { .. } => DistanceMetric::GapLinear,
            Self::GapAffine { .. } => DistanceMetric::GapAffine,
            Self::GapAffine2p { .. } => DistanceMetric::GapAffine2p,
        }
    }

    #[inline]
    pub fn mismatch(&self) -> u32 {
        match *self {
            Self::Edit => 1,
            Self::GapLinear { mismatch, .. }
            | Self::GapAffine { mismatch, .. }
            | Self::GapAffine2p { mismatch, .. } => mismatch,
        }
    }

    /// Cost of a single gap of the given length
    pub fn gap_cost(&self, length: usize) -> u64 {
        if length == 0 {
            return 0;
        }

        let length = length as u64;
        match *self {
            Self::Edit => length,
            Self::GapLinear { indel, .. } => length * indel as u64,
            Self::GapAffine { gap_open, gap_extend, .. } => gap_open as u64 + length * gap_extend as u64,
            Self::GapAffine2p { gap_open1, gap_extend1, gap_open2, gap_extend2, .. } => {
                let piece1 = gap_open1 as u64 + length * gap_extend1 as u64;
                let piece2 = gap_open2 as u64 + length * gap_extend2 as u64;

                piece1.min(piece2)
            }
        }
    }

    /// Number of most recent scores that must remain addressable to compute the next wavefront
    /// set, i.e., the largest single-step score delta plus one.
    pub fn score_scope(&self) -> usize {
        let max_delta = match *self {
            Self::Edit => 1,
            Self::GapLinear { mismatch, indel } => mismatch.max(indel) as u64,
            Self::GapAffine { mismatch, gap_open, gap_extend } =>
                (mismatch as u64).max(open_delta(gap_open, gap_extend)),
            Self::GapAffine2p { mismatch, gap_open1, gap_extend1, gap_open2, gap_extend2 } =>
                (mismatch as u64)
                    .max(open_delta(gap_open1, gap_extend1))
                    .max(open_delta(gap_open2, gap_extend2)),
        };

        max_delta as usize + 1
    }

    pub fn validate(&self) -> Result<(), WfaError> {
        match *self {
            Self::Edit => Ok(()),
            Self::GapLinear { mismatch, indel } => {
                if mismatch == 0 || indel == 0 {
                    return Err(WfaError::InvalidPenalties(
                        "mismatch and indel penalties must be positive".to_string()));
                }

                Ok(())
            },
            Self::GapAffine { mismatch, gap_open, gap_extend } => {
                if mismatch == 0 || gap_extend == 0 {
                    return Err(WfaError::InvalidPenalties(
                        "mismatch and gap extension penalties must be positive".to_string()));
                }

                check_open_delta(gap_open, gap_extend)
            },
            Self::GapAffine2p { mismatch, gap_open1, gap_extend1, gap_open2, gap_extend2 } => {
                if mismatch == 0 || gap_extend1 == 0 || gap_extend2 == 0 {
                    return Err(WfaError::InvalidPenalties(
                        "mismatch and gap extension penalties must be positive".to_string()));
                }

                check_open_delta(gap_open1, gap_extend1)?;
                check_open_delta(gap_open2, gap_extend2)
            }
        }
    }

    /// The gap pieces driving the wavefront recurrence, or `None` for metrics without one
    pub(crate) fn gap_pieces(&self) -> Option<GapPieces> {
        match *self {
            Self::GapAffine { gap_open, gap_extend, .. } => Some(smallvec![
                GapPiece {
                    open: open_delta(gap_open, gap_extend) as usize,
                    extend: gap_extend as usize,
                    insertion: AlignState::Insertion,
                    deletion: AlignState::Deletion,
                }
            ]),
            Self::GapAffine2p { gap_open1, gap_extend1, gap_open2, gap_extend2, .. } => Some(smallvec![
                GapPiece {
                    open: open_delta(gap_open1, gap_extend1) as usize,
                    extend: gap_extend1 as usize,
                    insertion: AlignState::Insertion,
                    deletion: AlignState::Deletion,
                },
                GapPiece {
                    open: open_delta(gap_open2, gap_extend2) as usize,
                    extend: gap_extend2 as usize,
                    insertion: AlignState::Insertion2,
                    deletion: AlignState::Deletion2,
                }
            ]),
            Self::Edit | Self::GapLinear { .. } => None,
        }
    }
}
