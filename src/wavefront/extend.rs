use crate::aligner::offsets::{pattern_pos, OffsetType};
use crate::sequences::PaddedSequences;
use crate::wavefront::Wavefront;

/// Advance every offset of a match-state wavefront along its diagonal while pattern and text
/// agree.
///
/// Doesn't change the diagonal range, and a second invocation is a no-op: an extended offset
/// always points at a mismatch or past the end of one of the sequences.
pub fn extend_matches<O: OffsetType>(wf: &mut Wavefront<O>, seqs: &PaddedSequences) {
    for k in wf.lo()..=wf.hi() {
        let offset = wf.get(k);
        if offset.is_null() {
            continue;
        }

        let v = pattern_pos(k, offset);
        let h = offset.as_usize();
        if v < 0 || v as usize > seqs.pattern_len() || h > seqs.text_len() {
            continue;
        }

        let run = seqs.match_run(v as usize, h);
        if run > 0 {
            wf.set(k, offset + O::new(run));
        }
    }
}
