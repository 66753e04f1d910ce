use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WfaError {
    /// The configured distance metric (or alignment span) has no wavefront recurrence yet
    #[error("{metric} is not implemented for {mode} alignment")]
    NotImplemented { metric: String, mode: String },

    /// Penalties that can't drive the wavefront recurrence (e.g., zero mismatch cost)
    #[error("invalid penalties: {0}")]
    InvalidPenalties(String),

    /// Contradicting aligner options
    #[error("invalid aligner configuration: {0}")]
    InvalidConfig(String),

    /// An input sequence contains one of the symbols reserved for padding
    #[error("{sequence} contains reserved padding symbol {symbol:#04x} at position {position}")]
    ReservedSymbol {
        sequence: &'static str,
        position: usize,
        symbol: u8,
    },

    /// A sequence does not fit the offset integer type of the aligner
    #[error("sequence of length {0} is too long for the offset integer type")]
    SequenceTooLong(usize),

    /// Could not allocate memory for a new wavefront
    #[error("could not allocate wavefront memory")]
    OutOfMemory(#[from] TryReserveError),

    /// The piggyback backtrace buffer can't address any more records
    #[error("backtrace buffer is full ({0} records)")]
    BacktraceBufferFull(usize),

    /// The stored trace could not be replayed into a valid alignment
    #[error("inconsistent backtrace: {0}")]
    BacktraceInconsistent(String),

    /// The optional score ceiling was hit before reaching the end of both sequences
    #[error("maximum alignment score {0} reached before alignment end")]
    MaxScoreReached(u32),
}
