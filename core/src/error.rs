//! Error types for `lda-rs`.
//!
//! Everything here is fatal to a training run: configuration problems are caught before
//! the first sweep, and collective failures leave the cluster with inconsistent baselines,
//! so nothing is retried.

use lda_kernels::KernelError;
use thiserror::Error;

/// Errors that can occur while setting up or running the sampler.
#[derive(Error, Debug)]
pub enum LdaError {
    /// A hyperparameter is out of its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A matrix does not have the shape the caller declared.
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// A shard's document-word matrix has a different vocabulary than the model.
    #[error("Shard {shard} has vocabulary size {got}, model expects {expected}")]
    VocabularyMismatch {
        shard: usize,
        expected: usize,
        got: usize,
    },

    /// A word index falls outside the vocabulary.
    #[error("Word index {index} out of bounds for vocabulary size {vocab_size}")]
    WordOutOfBounds { index: usize, vocab_size: usize },

    /// A dense matrix could not be allocated.
    #[error("Failed to allocate a {rows}x{cols} count matrix")]
    Allocation { rows: usize, cols: usize },

    /// A peer dropped out of, or disagreed during, a collective operation.
    #[error("Collective communication failed: {0}")]
    Collective(String),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, LdaError>;
