//! # lda-kernels
//!
//! The innermost loops of the collapsed Gibbs sampler, kept free of any matrix type so the
//! `lda-rs` core crate can swap its storage without touching the hot path.
//!
//! - [`rand48`]: the 48-bit linear-congruential variate source (one per shard).
//! - [`cpu_gibbs`]: single-token topic reassignment over row-major count slices.
//! - [`cpu_reduce`]: elementwise add/subtract and row sums used by the orchestrator.

use num_traits::{FromPrimitive, Num, NumAssign, ToPrimitive};
use std::fmt::Debug;
use thiserror::Error;

pub mod cpu_gibbs;
pub mod cpu_reduce;
pub mod rand48;

pub use cpu_gibbs::{cpu_sample_token, draw_topic, topic_weights, GibbsParams, TokenCounts};
pub use cpu_reduce::{cpu_add_assign, cpu_row_sums, cpu_sub_assign, cpu_sum};
pub use rand48::Rand48;

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
}

pub type Result<T> = std::result::Result<T, KernelError>;

/// Trait bound for elements that can be processed by kernels.
/// Counts are stored as floating point, but the reductions work on any numeric cell.
pub trait KernelElem:
    Num + NumAssign + Copy + Clone + Debug + Send + Sync + FromPrimitive + ToPrimitive + PartialOrd
{
}

impl<T> KernelElem for T where
    T: Num
        + NumAssign
        + Copy
        + Clone
        + Debug
        + Send
        + Sync
        + FromPrimitive
        + ToPrimitive
        + PartialOrd
{
}
