pub mod config;
pub mod offsets;
pub mod penalties;

use tracing::{debug, info_span, trace};

use crate::aligner::config::{AlignerConfig, AlignmentScope, BacktraceStrategy, MemoryMode};
use crate::aligner::offsets::{Diag, OffsetType};
use crate::alignment::AlignmentResult;
use crate::backtrace::retrace::retrace;
use crate::backtrace::BacktraceBuffer;
use crate::debug::messages::DebugOutputMessage;
use crate::debug::{debug_enabled, log};
use crate::errors::WfaError;
use crate::sequences::PaddedSequences;
use crate::wavefront::compute::recurrence::Recurrence;
use crate::wavefront::compute::{compute_next, set_range};
use crate::wavefront::extend::extend_matches;
use crate::wavefront::memory::{ScoreHistory, WavefrontSlab};
use crate::wavefront::WavefrontSet;

/// Global (end-to-end) pairwise aligner using the wavefront algorithm.
///
/// The aligner owns all wavefront memory, and reuses it across invocations of
/// [`WavefrontAligner::align`]. Its work is proportional to the alignment score rather than
/// the product of the sequence lengths.
///
/// ```
/// use wfa::aligner::WavefrontAligner;
/// use wfa::aligner::config::AlignerConfig;
/// use wfa::aligner::penalties::Penalties;
///
/// let mut aligner = WavefrontAligner::<i32>::new(AlignerConfig::new(Penalties::gap_affine(4, 6, 2)))
///     .unwrap();
///
/// let result = aligner.align(b"ACGT", b"AGT").unwrap();
/// assert_eq!(result.cost(), 8);
/// assert_eq!(result.edit_script.unwrap().to_string(), "1M1D2M");
/// ```
pub struct WavefrontAligner<O = i32> {
    config: AlignerConfig,
    history: ScoreHistory<O>,
    slab: WavefrontSlab<O>,
    bt_buffer: BacktraceBuffer,
}

impl<O: OffsetType> WavefrontAligner<O> {
    pub fn new(config: AlignerConfig) -> Result<Self, WfaError> {
        config.validate()?;

        let history = ScoreHistory::new(config.memory_mode(), config.penalties.score_scope());

        Ok(Self {
            config,
            history,
            slab: WavefrontSlab::new(),
            bt_buffer: BacktraceBuffer::new(),
        })
    }

    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    pub fn memory_mode(&self) -> MemoryMode {
        self.history.mode()
    }

    /// Number of most recent scores kept in memory with modular memory
    pub fn score_scope(&self) -> usize {
        self.history.scope()
    }

    /// Largest number of scores the most recent alignment looked back while computing (and
    /// backtracing) wavefronts
    pub fn max_lookback(&self) -> usize {
        self.history.max_lookback()
    }

    /// Align `pattern` end-to-end against `text`
    pub fn align(&mut self, pattern: &[u8], text: &[u8]) -> Result<AlignmentResult, WfaError> {
        let span = info_span!("wavefront_align", pattern_len = pattern.len(), text_len = text.len());
        let _enter = span.enter();

        let longest = pattern.len().max(text.len());
        if O::from_usize(longest).is_none() {
            return Err(WfaError::SequenceTooLong(longest));
        }

        let seqs = PaddedSequences::new(pattern, text)?;
        let recurrence = Recurrence::new(&self.config.penalties, seqs.pattern_len(), seqs.text_len())
            .ok_or_else(|| WfaError::NotImplemented {
                metric: self.config.penalties.metric().to_string(),
                mode: self.config.span.to_string(),
            })?;

        self.bt_buffer.clear();
        let result = self.run(&recurrence, &seqs);

        self.history.release_all(&mut self.slab);
        self.bt_buffer.clear();

        result
    }

    fn run(&mut self, recurrence: &Recurrence, seqs: &PaddedSequences) -> Result<AlignmentResult, WfaError> {
        if debug_enabled() {
            log(&DebugOutputMessage::NewAlignment {
                pattern_len: seqs.pattern_len(),
                text_len: seqs.text_len()
            });
        }

        self.initialize()?;

        let mut score = 0;
        loop {
            if let Some(m) = self.history.get_mut(score).and_then(|set| set.m_mut()) {
                extend_matches(m, seqs);
            }

            if debug_enabled() {
                if let Some(set) = self.history.get(score) {
                    log(&DebugOutputMessage::new_from_wavefront_set(score, set));
                }
            }

            if self.terminate(score, seqs) {
                debug!(score, "reached the end of both sequences");

                if debug_enabled() {
                    log(&DebugOutputMessage::Terminate { score });
                }

                return self.recover(recurrence, score, seqs);
            }

            score += 1;
            if let Some(max_score) = self.config.max_score {
                if score > max_score as usize {
                    return Err(WfaError::MaxScoreReached(max_score));
                }
            }

            let bt_buffer = self.config.piggyback().then_some(&mut self.bt_buffer);
            let next = compute_next(recurrence, &self.history, &mut self.slab, bt_buffer, score)?;

            if let Some((lo, hi)) = set_range(&next) {
                trace!(score, lo, hi, "computed wavefront set");
            }

            self.history.commit(score, next, &mut self.slab)?;
        }
    }

    /// Score zero: a single match state offset at the origin
    fn initialize(&mut self) -> Result<(), WfaError> {
        let initial = WavefrontSet::initial(&mut self.slab, self.config.piggyback())?;
        self.history.commit(0, initial, &mut self.slab)
    }

    fn end_diagonal(seqs: &PaddedSequences) -> Diag {
        seqs.text_len() as Diag - seqs.pattern_len() as Diag
    }

    /// Whether the match wavefront at `score` reached the end of both sequences
    fn terminate(&self, score: usize, seqs: &PaddedSequences) -> bool {
        let k_end = Self::end_diagonal(seqs);

        self.history.get(score)
            .and_then(|set| set.m())
            .map(|m| m.get(k_end))
            .is_some_and(|offset| !offset.is_null() && offset.as_usize() >= seqs.text_len())
    }

    fn recover(&self, recurrence: &Recurrence, score: usize, seqs: &PaddedSequences) -> Result<AlignmentResult, WfaError> {
        let edit_script = match (self.config.scope, self.config.backtrace) {
            (AlignmentScope::ScoreOnly, _) => None,
            (AlignmentScope::Alignment, BacktraceStrategy::Piggyback) => {
                let k_end = Self::end_diagonal(seqs);
                let cell = self.history.get(score)
                    .and_then(|set| set.m())
                    .and_then(|m| m.get_bt(k_end))
                    .ok_or_else(|| WfaError::BacktraceInconsistent(
                        "no trace data at the end cell".to_string()))?;

                Some(self.bt_buffer.recover(cell, seqs)?)
            },
            (AlignmentScope::Alignment, BacktraceStrategy::Recompute) =>
                Some(retrace(recurrence, &self.history, score, Self::end_diagonal(seqs))?),
        };

        if let Some(ref script) = edit_script {
            debug!(%script, "recovered edit script");
        }

        Ok(AlignmentResult {
            score: -(score as i64),
            edit_script,
        })
    }
}
