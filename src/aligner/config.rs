use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::aligner::penalties::Penalties;
use crate::errors::WfaError;

/// What to compute: only the optimal score, or the score together with an edit script
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentScope {
    ScoreOnly,

    #[default]
    Alignment,
}

/// How to recover the edit script once the end of both sequences is reached
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacktraceStrategy {
    /// Store short runs of edit operations next to each offset, and offload full runs to an
    /// append-only backtrace buffer. Works with modular wavefront memory.
    #[default]
    Piggyback,

    /// Keep no trace data, and re-derive the path from the stored wavefronts. Requires all
    /// wavefronts to be retained until the alignment ends.
    Recompute,
}

/// Retention policy for the score-indexed wavefront history
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryMode {
    /// Keep the wavefront sets of all scores until the alignment ends
    Full,

    /// Keep only the most recent scores (the score scope), reusing older slots
    Modular,
}

/// The part of both sequences that must be covered by the alignment
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentSpan {
    /// Global alignment, both sequences aligned end-to-end
    #[default]
    EndToEnd,

    /// Free gaps at the ends of the text. Not implemented yet.
    SemiGlobal,
}

impl Display for AlignmentSpan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndToEnd => write!(f, "end-to-end"),
            Self::SemiGlobal => write!(f, "semi-global"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignerConfig {
    pub penalties: Penalties,
    pub scope: AlignmentScope,
    pub backtrace: BacktraceStrategy,

    /// Wavefront retention policy. If not given, modular memory is used whenever possible.
    pub memory: Option<MemoryMode>,
    pub span: AlignmentSpan,

    /// Give up once the alignment score exceeds this value
    pub max_score: Option<u32>,
}

impl AlignerConfig {
    pub fn new(penalties: Penalties) -> Self {
        Self {
            penalties,
            ..Self::default()
        }
    }

    pub fn with_scope(mut self, scope: AlignmentScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_backtrace(mut self, backtrace: BacktraceStrategy) -> Self {
        self.backtrace = backtrace;
        self
    }

    pub fn with_memory(mut self, memory: MemoryMode) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_span(mut self, span: AlignmentSpan) -> Self {
        self.span = span;
        self
    }

    pub fn with_max_score(mut self, max_score: u32) -> Self {
        self.max_score = Some(max_score);
        self
    }

    /// Whether offsets carry inline trace data
    pub fn piggyback(&self) -> bool {
        self.scope == AlignmentScope::Alignment && self.backtrace == BacktraceStrategy::Piggyback
    }

    /// The retention policy used for the wavefront history
    pub fn memory_mode(&self) -> MemoryMode {
        if let Some(mode) = self.memory {
            return mode;
        }

        match (self.scope, self.backtrace) {
            (AlignmentScope::Alignment, BacktraceStrategy::Recompute) => MemoryMode::Full,
            _ => MemoryMode::Modular,
        }
    }

    /// Check that the configuration describes an alignment we can compute
    pub fn validate(&self) -> Result<(), WfaError> {
        self.penalties.validate()?;

        if self.span != AlignmentSpan::EndToEnd || self.penalties.gap_pieces().is_none() {
            return Err(WfaError::NotImplemented {
                metric: self.penalties.metric().to_string(),
                mode: self.span.to_string(),
            });
        }

        if self.scope == AlignmentScope::Alignment
            && self.backtrace == BacktraceStrategy::Recompute
            && self.memory_mode() == MemoryMode::Modular
        {
            return Err(WfaError::InvalidConfig(
                "recomputing the backtrace requires full wavefront memory".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_mode_defaults() {
        let config = AlignerConfig::default();
        assert_eq!(config.memory_mode(), MemoryMode::Modular);
        assert!(config.piggyback());

        let config = AlignerConfig::default().with_backtrace(BacktraceStrategy::Recompute);
        assert_eq!(config.memory_mode(), MemoryMode::Full);
        assert!(!config.piggyback());

        let config = AlignerConfig::default().with_scope(AlignmentScope::ScoreOnly);
        assert_eq!(config.memory_mode(), MemoryMode::Modular);
        assert!(!config.piggyback());
    }

    #[test]
    fn test_validate() {
        assert!(AlignerConfig::default().validate().is_ok());

        let config = AlignerConfig::new(Penalties::Edit);
        assert!(matches!(config.validate(), Err(WfaError::NotImplemented { .. })));

        let config = AlignerConfig::new(Penalties::GapLinear { mismatch: 4, indel: 2 });
        assert!(matches!(config.validate(), Err(WfaError::NotImplemented { .. })));

        let config = AlignerConfig::default().with_span(AlignmentSpan::SemiGlobal);
        assert!(matches!(config.validate(), Err(WfaError::NotImplemented { .. })));

        let config = AlignerConfig::default()
            .with_backtrace(BacktraceStrategy::Recompute)
            .with_memory(MemoryMode::Modular);
        assert!(matches!(config.validate(), Err(WfaError::InvalidConfig(_))));

        // Score-only alignment never needs a backtrace, so modular memory is fine
        let config = AlignerConfig::default()
            .with_scope(AlignmentScope::ScoreOnly)
            .with_backtrace(BacktraceStrategy::Recompute)
            .with_memory(MemoryMode::Modular);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "penalties": { "metric": "gap_affine2p", "mismatch": 4, "gap_open1": 6,
                           "gap_extend1": 2, "gap_open2": 24, "gap_extend2": 1 },
            "backtrace": "recompute",
            "max_score": 100
        }"#;

        let config: AlignerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.penalties, Penalties::gap_affine_2p(4, 6, 2, 24, 1));
        assert_eq!(config.scope, AlignmentScope::Alignment);
        assert_eq!(config.backtrace, BacktraceStrategy::Recompute);
        assert_eq!(config.memory_mode(), MemoryMode::Full);
        assert_eq!(config.max_score, Some(100));
    }
}
