//! Sampler hyperparameters.

use crate::error::{LdaError, Result};
use serde::{Deserialize, Serialize};

/// Training configuration shared by every shard of every node.
///
/// All nodes of a cluster must run with the same configuration; only `seed` is combined
/// with the node rank before use.
///
/// ```rust
/// use lda_rs::LdaConfig;
///
/// let config = LdaConfig::new(20).with_iterations(200).with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LdaConfig {
    /// Number of latent topics.
    pub n_topics: usize,

    /// Number of full sweeps over the corpus.
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// Symmetric document-topic prior.
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Symmetric topic-word prior.
    #[serde(default = "default_beta")]
    pub beta: f64,

    /// Base seed for the per-shard generators. Drawn from OS entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_iterations() -> usize {
    1000
}

fn default_alpha() -> f64 {
    0.1
}

fn default_beta() -> f64 {
    0.01
}

impl LdaConfig {
    pub fn new(n_topics: usize) -> Self {
        Self {
            n_topics,
            iterations: default_iterations(),
            alpha: default_alpha(),
            beta: default_beta(),
            seed: None,
        }
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Rejects values the sampler cannot run with.
    ///
    /// Both priors must be strictly positive and finite; this is what keeps every topic
    /// weight in the sampling kernel above zero.
    pub fn validate(&self) -> Result<()> {
        if self.n_topics == 0 {
            return Err(LdaError::InvalidConfig("n_topics must be at least 1".into()));
        }
        if self.iterations == 0 {
            return Err(LdaError::InvalidConfig(
                "iterations must be at least 1".into(),
            ));
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(LdaError::InvalidConfig(format!(
                "alpha must be positive and finite, got {}",
                self.alpha
            )));
        }
        if !(self.beta.is_finite() && self.beta > 0.0) {
            return Err(LdaError::InvalidConfig(format!(
                "beta must be positive and finite, got {}",
                self.beta
            )));
        }
        Ok(())
    }

    /// Seed for one shard's generator, or `None` to draw from entropy.
    ///
    /// Mixes the base seed with the node rank and shard index so that no two shards in a
    /// cluster share a stream.
    pub fn shard_seed(&self, rank: usize, shard: usize) -> Option<u64> {
        self.seed.map(|seed| {
            splitmix(
                seed ^ (rank as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
                    ^ (shard as u64 + 1).wrapping_mul(0xC2B2_AE3D_27D4_EB4F),
            )
        })
    }

    /// Seed for the generator that draws a node's initial topic assignment.
    pub fn init_seed(&self, rank: usize) -> Option<u64> {
        self.seed
            .map(|seed| splitmix(seed ^ (rank as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)))
    }
}

// SplitMix64 finalizer.
fn splitmix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
