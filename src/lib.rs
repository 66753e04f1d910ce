//! Pairwise sequence alignment with the wavefront algorithm.
//!
//! Computes optimal end-to-end alignments under gap-affine and two-piece gap-affine penalties,
//! in time and memory proportional to the alignment score. See
//! [`aligner::WavefrontAligner`] for the entry point.

pub mod errors;
pub mod aligner;
pub mod alignment;
pub mod backtrace;
pub mod sequences;
pub mod wavefront;
pub mod debug;

pub use aligner::WavefrontAligner;
pub use aligner::config::{AlignerConfig, AlignmentScope, AlignmentSpan, BacktraceStrategy, MemoryMode};
pub use aligner::penalties::{DistanceMetric, Penalties};
pub use alignment::{AlignmentResult, CigarOp, EditScript};
pub use errors::WfaError;
