//! Backtrace data and edit script recovery.
//!
//! With piggyback backtracing, every offset carries a [`BtCell`]: a short run of edit operations
//! leading to it, and a handle to the [`BacktraceBuffer`] block holding the operations before
//! that. Exact matches are never recorded; they are re-derived when replaying the operations
//! against the sequences.

use nonmax::NonMaxU32;
use serde::Serialize;

use crate::alignment::{CigarOp, EditScript};
use crate::errors::WfaError;
use crate::sequences::PaddedSequences;

pub mod retrace;

/// Maximum number of operations stored inline with an offset
pub const PCIGAR_CAPACITY: usize = 16;

/// Edit operation recorded in a backtrace
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BtOp {
    Mismatch,
    InsertionOpen,
    InsertionExtend,
    DeletionOpen,
    DeletionExtend,
}

impl BtOp {
    /// Whether this operation leaves the match state, in which case it's preceded by an
    /// exact-match extension
    #[inline]
    pub fn from_match_state(&self) -> bool {
        !matches!(self, Self::InsertionExtend | Self::DeletionExtend)
    }

    pub fn cigar_op(&self) -> CigarOp {
        match self {
            Self::Mismatch => CigarOp::Mismatch,
            Self::InsertionOpen | Self::InsertionExtend => CigarOp::Insertion,
            Self::DeletionOpen | Self::DeletionExtend => CigarOp::Deletion,
        }
    }
}

/// A fixed capacity run of edit operations, oldest first
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PackedCigar {
    ops: [BtOp; PCIGAR_CAPACITY],
    len: u8,
}

impl Default for PackedCigar {
    fn default() -> Self {
        Self {
            ops: [BtOp::Mismatch; PCIGAR_CAPACITY],
            len: 0,
        }
    }
}

impl PackedCigar {
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == PCIGAR_CAPACITY
    }

    #[inline]
    fn push(&mut self, op: BtOp) {
        debug_assert!(!self.is_full());
        self.ops[self.len()] = op;
        self.len += 1;
    }

    pub fn ops(&self) -> &[BtOp] {
        &self.ops[..self.len()]
    }
}

/// Stable reference to a block in the backtrace buffer
pub type BtHandle = NonMaxU32;

/// Trace data stored next to an offset
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BtCell {
    pub pcigar: PackedCigar,
    pub prev: Option<BtHandle>,
}

impl BtCell {
    /// Trace of the alignment origin: no operations, no predecessor
    pub fn initial() -> Self {
        Self::default()
    }

    /// Trace of a cell reached from this cell by applying `op`. Full runs are offloaded to the
    /// buffer first.
    pub fn push(&self, op: BtOp, buffer: &mut BacktraceBuffer) -> Result<Self, WfaError> {
        let mut next = if self.pcigar.is_full() {
            let handle = buffer.append(self.pcigar, self.prev)?;
            Self { pcigar: PackedCigar::default(), prev: Some(handle) }
        } else {
            *self
        };

        next.pcigar.push(op);
        Ok(next)
    }
}

#[derive(Copy, Clone, Debug)]
struct BufferBlock {
    pcigar: PackedCigar,
    prev: Option<BtHandle>,
}

/// Append-only storage for offloaded operation runs.
///
/// Blocks are never moved or removed while an alignment runs, so handles stay valid regardless
/// of which wavefronts are still in memory.
#[derive(Debug, Default)]
pub struct BacktraceBuffer {
    blocks: Vec<BufferBlock>,
}

impl BacktraceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn append(&mut self, pcigar: PackedCigar, prev: Option<BtHandle>) -> Result<BtHandle, WfaError> {
        let handle = u32::try_from(self.blocks.len()).ok()
            .and_then(NonMaxU32::new)
            .ok_or(WfaError::BacktraceBufferFull(self.blocks.len()))?;

        self.blocks.try_reserve(1)?;
        self.blocks.push(BufferBlock { pcigar, prev });

        Ok(handle)
    }

    fn block(&self, handle: BtHandle) -> Result<&BufferBlock, WfaError> {
        self.blocks.get(handle.get() as usize)
            .ok_or_else(|| WfaError::BacktraceInconsistent(
                format!("dangling backtrace handle {}", handle.get())))
    }

    /// Recover the edit script of the path ending in `cell` at the end of both sequences.
    ///
    /// Collects the operation runs by following the predecessor links, and replays them
    /// forward from the origin. Exact matches are re-derived by greedy extension before every
    /// operation that leaves the match state, and once more at the end.
    pub fn recover(&self, cell: &BtCell, seqs: &PaddedSequences) -> Result<EditScript, WfaError> {
        let mut runs = vec![cell.pcigar];
        let mut prev = cell.prev;
        while let Some(handle) = prev {
            let block = self.block(handle)?;

            if block.prev.is_some_and(|p| p >= handle) {
                return Err(WfaError::BacktraceInconsistent(
                    format!("backtrace block {} does not point to an older block", handle.get())));
            }

            runs.push(block.pcigar);
            prev = block.prev;
        }

        let (plen, tlen) = (seqs.pattern_len(), seqs.text_len());
        let (mut v, mut h) = (0, 0);
        let mut ops = Vec::new();

        let extend = |v: &mut usize, h: &mut usize, ops: &mut Vec<CigarOp>| {
            let run = seqs.match_run(*v, *h);
            ops.extend(std::iter::repeat(CigarOp::Match).take(run));
            *v += run;
            *h += run;
        };

        for op in runs.iter().rev().flat_map(|run| run.ops()) {
            if op.from_match_state() {
                extend(&mut v, &mut h, &mut ops);
            }

            match op.cigar_op() {
                CigarOp::Mismatch => { v += 1; h += 1; },
                CigarOp::Insertion => h += 1,
                CigarOp::Deletion => v += 1,
                CigarOp::Match => (),
            }

            if v > plen || h > tlen {
                return Err(WfaError::BacktraceInconsistent(
                    format!("backtrace moves past the end of the sequences at ({v}, {h})")));
            }

            ops.push(op.cigar_op());
        }

        extend(&mut v, &mut h, &mut ops);

        if v != plen || h != tlen {
            return Err(WfaError::BacktraceInconsistent(
                format!("backtrace ends at ({v}, {h}) instead of ({plen}, {tlen})")));
        }

        Ok(EditScript::from_ops(ops, plen, tlen))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_from_ops(ops: &[BtOp], buffer: &mut BacktraceBuffer) -> BtCell {
        ops.iter()
            .try_fold(BtCell::initial(), |cell, op| cell.push(*op, buffer))
            .unwrap()
    }

    #[test]
    fn test_push_offloads_full_runs() {
        let mut buffer = BacktraceBuffer::new();
        let ops = vec![BtOp::Mismatch; PCIGAR_CAPACITY + 1];

        let cell = cell_from_ops(&ops[..PCIGAR_CAPACITY], &mut buffer);
        assert!(cell.pcigar.is_full());
        assert!(cell.prev.is_none());
        assert!(buffer.is_empty());

        let cell = cell.push(BtOp::DeletionOpen, &mut buffer).unwrap();
        assert_eq!(cell.pcigar.ops(), &[BtOp::DeletionOpen]);
        assert_eq!(cell.prev.map(|h| h.get()), Some(0));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_recover_matches_between_ops() {
        let seqs = PaddedSequences::new(b"ACGTTACG", b"ACCTACGG").unwrap();
        let mut buffer = BacktraceBuffer::new();

        // ACGTTACG-
        // ACCT-ACGG
        let cell = cell_from_ops(&[BtOp::Mismatch, BtOp::DeletionOpen, BtOp::InsertionOpen], &mut buffer);
        let script = buffer.recover(&cell, &seqs).unwrap();

        assert_eq!(script.to_string(), "2M1X1M1D3M1I");
    }

    #[test]
    fn test_recover_gap_extension_has_no_matches() {
        let seqs = PaddedSequences::new(b"AAAA", b"AA").unwrap();
        let mut buffer = BacktraceBuffer::new();

        let cell = cell_from_ops(&[BtOp::DeletionOpen, BtOp::DeletionExtend], &mut buffer);
        let script = buffer.recover(&cell, &seqs).unwrap();

        assert_eq!(script.to_string(), "2M2D");
    }

    #[test]
    fn test_recover_across_blocks() {
        let pattern = vec![b'A'; 40];
        let text = vec![b'C'; 40];
        let seqs = PaddedSequences::new(&pattern, &text).unwrap();

        let mut buffer = BacktraceBuffer::new();
        let cell = cell_from_ops(&[BtOp::Mismatch; 40], &mut buffer);
        assert_eq!(buffer.len(), 2);

        let script = buffer.recover(&cell, &seqs).unwrap();
        assert_eq!(script.to_string(), "40X");
    }

    #[test]
    fn test_recover_inconsistent() {
        let seqs = PaddedSequences::new(b"ACGT", b"ACGT").unwrap();
        let mut buffer = BacktraceBuffer::new();

        let cell = cell_from_ops(&[BtOp::InsertionOpen], &mut buffer);
        assert!(matches!(buffer.recover(&cell, &seqs), Err(WfaError::BacktraceInconsistent(_))));

        let dangling = BtCell { pcigar: PackedCigar::default(), prev: NonMaxU32::new(5) };
        assert!(matches!(buffer.recover(&dangling, &seqs), Err(WfaError::BacktraceInconsistent(_))));
    }
}
