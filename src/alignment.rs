use std::fmt::{Display, Formatter, Write};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::aligner::penalties::Penalties;

/// Alignment operation, relative to the pattern: an insertion consumes a text symbol only, a
/// deletion consumes a pattern symbol only.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CigarOp {
    Match,
    Mismatch,
    Insertion,
    Deletion,
}

impl CigarOp {
    pub fn as_char(&self) -> char {
        match self {
            Self::Match => 'M',
            Self::Mismatch => 'X',
            Self::Insertion => 'I',
            Self::Deletion => 'D',
        }
    }

    #[inline]
    pub fn consumes_pattern(&self) -> bool {
        !matches!(self, Self::Insertion)
    }

    #[inline]
    pub fn consumes_text(&self) -> bool {
        !matches!(self, Self::Deletion)
    }
}

/// Run-length encoded alignment operations, together with the aligned ranges of the pattern and
/// the text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditScript {
    ops: Vec<(CigarOp, usize)>,
    pub pattern_begin: usize,
    pub pattern_end: usize,
    pub text_begin: usize,
    pub text_end: usize,
}

impl EditScript {
    /// Build an edit script for an end-to-end alignment from individual operations
    pub fn from_ops(ops: impl IntoIterator<Item=CigarOp>, pattern_len: usize, text_len: usize) -> Self {
        let ops = ops.into_iter()
            .dedup_with_count()
            .map(|(count, op)| (op, count))
            .collect();

        Self {
            ops,
            pattern_begin: 0,
            pattern_end: pattern_len,
            text_begin: 0,
            text_end: text_len,
        }
    }

    /// Operation runs as (operation, length) pairs
    pub fn runs(&self) -> &[(CigarOp, usize)] {
        &self.ops
    }

    /// Iterate over the individual operations
    pub fn iter_ops(&self) -> impl Iterator<Item=CigarOp> + '_ {
        self.ops.iter()
            .flat_map(|(op, count)| std::iter::repeat(*op).take(*count))
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn num_ops(&self, op: CigarOp) -> usize {
        self.ops.iter()
            .filter(|(run_op, _)| *run_op == op)
            .map(|(_, count)| *count)
            .sum()
    }

    /// Replay this script on `pattern`. Mismatched and inserted symbols are taken from `text`.
    ///
    /// Returns `None` if the script doesn't fit the aligned ranges of both sequences.
    pub fn apply(&self, pattern: &[u8], text: &[u8]) -> Option<Vec<u8>> {
        let mut v = self.pattern_begin;
        let mut h = self.text_begin;
        let mut output = Vec::with_capacity(self.text_end.saturating_sub(self.text_begin));

        for op in self.iter_ops() {
            match op {
                CigarOp::Match => output.push(*pattern.get(v)?),
                CigarOp::Mismatch | CigarOp::Insertion => output.push(*text.get(h)?),
                CigarOp::Deletion => {
                    pattern.get(v)?;
                },
            }

            v += op.consumes_pattern() as usize;
            h += op.consumes_text() as usize;
        }

        (v == self.pattern_end && h == self.text_end).then_some(output)
    }

    /// Check that this script is a valid alignment of `pattern` and `text`: matches align equal
    /// symbols, mismatches different symbols, and both aligned ranges are covered exactly.
    pub fn check(&self, pattern: &[u8], text: &[u8]) -> bool {
        if self.pattern_end > pattern.len() || self.text_end > text.len() {
            return false;
        }

        let mut v = self.pattern_begin;
        let mut h = self.text_begin;
        for op in self.iter_ops() {
            if v + op.consumes_pattern() as usize > self.pattern_end
                || h + op.consumes_text() as usize > self.text_end
            {
                return false;
            }

            match op {
                CigarOp::Match if pattern[v] != text[h] => return false,
                CigarOp::Mismatch if pattern[v] == text[h] => return false,
                _ => (),
            }

            v += op.consumes_pattern() as usize;
            h += op.consumes_text() as usize;
        }

        v == self.pattern_end && h == self.text_end
    }

    /// Total cost of this script. Each insertion or deletion run counts as a single gap.
    pub fn score(&self, penalties: &Penalties) -> u64 {
        self.ops.iter()
            .map(|(op, count)| match op {
                CigarOp::Match => 0,
                CigarOp::Mismatch => penalties.mismatch() as u64 * *count as u64,
                CigarOp::Insertion | CigarOp::Deletion => penalties.gap_cost(*count),
            })
            .sum()
    }

    /// Three line representation of the alignment: pattern, match indicators, and text
    pub fn print_alignment(&self, pattern: &[u8], text: &[u8]) -> String {
        let mut pattern_chars = Vec::new();
        let mut aln_chars = Vec::new();
        let mut text_chars = Vec::new();

        let mut v = self.pattern_begin;
        let mut h = self.text_begin;
        for op in self.iter_ops() {
            let p = if op.consumes_pattern() { pattern.get(v).copied().unwrap_or(b'?') } else { b'-' };
            let t = if op.consumes_text() { text.get(h).copied().unwrap_or(b'?') } else { b'-' };

            pattern_chars.push(p);
            text_chars.push(t);
            aln_chars.push(match op {
                CigarOp::Match => b'|',
                CigarOp::Mismatch => b'*',
                CigarOp::Insertion | CigarOp::Deletion => b' ',
            });

            v += op.consumes_pattern() as usize;
            h += op.consumes_text() as usize;
        }

        format!(
            "{}\n{}\n{}",
            String::from_utf8_lossy(&pattern_chars),
            String::from_utf8_lossy(&aln_chars),
            String::from_utf8_lossy(&text_chars),
        )
    }
}

impl Display for EditScript {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (op, count) in &self.ops {
            write!(f, "{count}")?;
            f.write_char(op.as_char())?;
        }

        Ok(())
    }
}

/// Result of aligning a pair of sequences.
///
/// The score follows the wavefront convention of negated penalties: an alignment with cost 12
/// has score -12.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentResult {
    pub score: i64,

    /// Only present when the alignment scope includes the edit script
    pub edit_script: Option<EditScript>,
}

impl AlignmentResult {
    /// The alignment distance, i.e., the total penalty
    pub fn cost(&self) -> u64 {
        self.score.unsigned_abs()
    }
}
