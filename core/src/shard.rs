//! Per-thread sampler state.
//!
//! A [`Shard`] owns a contiguous slice of a node's documents together with everything a
//! sweep mutates: the token array, the topic-document counts, a private copy of the
//! topic-word counts and a private copy of the per-topic totals. Shards never share
//! mutable state, so a node sweeps them in parallel without locks.

use crate::error::{LdaError, Result};
use crate::matrix::{CountMatrix, CsrMatrix};
use lda_kernels::{cpu_sample_token, GibbsParams, Rand48, TokenCounts};
use rand::Rng;

pub struct Shard {
    index: usize,
    docs: CsrMatrix,
    /// Topic of every token occurrence, ordered by document, then ascending word index.
    tokens: Vec<usize>,
    topic_doc: CountMatrix,
    topic_word: CountMatrix,
    totals: Vec<f64>,
    probs: Vec<f64>,
    rng: Rand48,
}

impl Shard {
    /// Allocates an empty shard. Every token starts in topic 0 until [`Shard::randomize`]
    /// is called.
    ///
    /// # Arguments
    ///
    /// * `index` - Position of the shard within its node; only used in error messages.
    /// * `docs` - Document-word counts; the column count must equal `vocab_size`.
    /// * `rng` - The generator the sweep draws its variates from.
    pub fn new(
        index: usize,
        docs: CsrMatrix,
        n_topics: usize,
        vocab_size: usize,
        rng: Rand48,
    ) -> Result<Self> {
        if n_topics == 0 {
            return Err(LdaError::InvalidConfig("n_topics must be at least 1".into()));
        }
        if docs.ncols() != vocab_size {
            return Err(LdaError::VocabularyMismatch {
                shard: index,
                expected: vocab_size,
                got: docs.ncols(),
            });
        }
        let n_tokens = docs.token_count();
        let mut tokens = Vec::new();
        tokens
            .try_reserve_exact(n_tokens)
            .map_err(|_| LdaError::Allocation {
                rows: 1,
                cols: n_tokens,
            })?;
        tokens.resize(n_tokens, 0);

        let mut shard = Self {
            index,
            topic_doc: CountMatrix::zeros(n_topics, docs.nrows())?,
            topic_word: CountMatrix::zeros(n_topics, vocab_size)?,
            totals: vec![0.0; n_topics],
            probs: vec![0.0; n_topics],
            docs,
            tokens,
            rng,
        };
        shard.rebuild_counts();
        Ok(shard)
    }

    /// Builds a shard from an existing topic assignment.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if `tokens` does not hold exactly one valid topic per token occurrence.
    pub fn with_assignment(
        index: usize,
        docs: CsrMatrix,
        n_topics: usize,
        vocab_size: usize,
        tokens: Vec<usize>,
        rng: Rand48,
    ) -> Result<Self> {
        let expected = docs.token_count();
        if tokens.len() != expected {
            return Err(LdaError::InvalidConfig(format!(
                "shard {index}: token array has {} entries, documents hold {expected} tokens",
                tokens.len()
            )));
        }
        if let Some(&bad) = tokens.iter().find(|&&t| t >= n_topics) {
            return Err(LdaError::InvalidConfig(format!(
                "shard {index}: token assigned to topic {bad}, only {n_topics} topics exist"
            )));
        }

        let mut shard = Self::new(index, docs, n_topics, vocab_size, rng)?;
        shard.tokens = tokens;
        shard.rebuild_counts();
        Ok(shard)
    }

    /// Draws a uniformly random topic for every token and rebuilds the count matrices.
    pub fn randomize<R: Rng>(&mut self, init: &mut R) {
        let n_topics = self.n_topics();
        for t in self.tokens.iter_mut() {
            *t = init.random_range(0..n_topics);
        }
        self.rebuild_counts();
    }

    fn rebuild_counts(&mut self) {
        self.topic_doc.fill(0.0);
        self.topic_word.fill(0.0);

        let mut pos = 0;
        for doc in 0..self.docs.nrows() {
            for (word, count) in self.docs.row(doc) {
                for _ in 0..count.floor() as usize {
                    let topic = self.tokens[pos];
                    self.topic_doc.increment(topic, doc, 1.0);
                    self.topic_word.increment(topic, word, 1.0);
                    pos += 1;
                }
            }
        }
    }

    /// Runs the sampling kernel once over every token of the shard.
    ///
    /// Documents are visited in index order and words in ascending index; each token
    /// consumes one variate from the shard's generator. Returns the number of tokens
    /// whose topic changed.
    pub fn sweep(&mut self, params: &GibbsParams) -> Result<usize> {
        let Shard {
            docs,
            tokens,
            topic_doc,
            topic_word,
            totals,
            probs,
            rng,
            ..
        } = self;

        let vocab_size = topic_word.cols();
        let n_docs = topic_doc.cols();
        let mut counts = TokenCounts {
            topic_word: topic_word.data_mut(),
            vocab_size,
            topic_doc: topic_doc.data_mut(),
            n_docs,
            totals,
        };
        counts.check_shapes()?;

        let mut changed = 0;
        let mut pos = 0;
        for doc in 0..docs.nrows() {
            for (word, count) in docs.row(doc) {
                for _ in 0..count.floor() as usize {
                    let token = &mut tokens[pos];
                    let old = *token;
                    let new = cpu_sample_token(&mut counts, probs, token, word, doc, params, rng);
                    if new != old {
                        changed += 1;
                    }
                    pos += 1;
                }
            }
        }
        Ok(changed)
    }

    /// Replaces the local topic-word copy with the node baseline.
    pub fn reseed(&mut self, baseline: &CountMatrix) -> Result<()> {
        self.topic_word.copy_from(baseline)
    }

    /// Subtracts the baseline from the local topic-word copy, leaving the sweep's delta.
    ///
    /// The local copy no longer holds counts afterwards; call [`Shard::reseed`] before
    /// the next sweep.
    pub fn isolate_delta(&mut self, baseline: &CountMatrix) -> Result<&CountMatrix> {
        self.topic_word.sub_assign(baseline)?;
        Ok(&self.topic_word)
    }

    /// Overwrites the shard's private per-topic totals.
    pub fn set_totals(&mut self, totals: &[f64]) -> Result<()> {
        if totals.len() != self.totals.len() {
            return Err(LdaError::ShapeMismatch {
                expected: vec![self.totals.len()],
                got: vec![totals.len()],
            });
        }
        self.totals.copy_from_slice(totals);
        Ok(())
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn n_topics(&self) -> usize {
        self.totals.len()
    }

    pub fn n_docs(&self) -> usize {
        self.docs.nrows()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn docs(&self) -> &CsrMatrix {
        &self.docs
    }

    pub fn tokens(&self) -> &[usize] {
        &self.tokens
    }

    pub fn topic_doc(&self) -> &CountMatrix {
        &self.topic_doc
    }

    pub fn topic_word(&self) -> &CountMatrix {
        &self.topic_word
    }

    pub fn totals(&self) -> &[f64] {
        &self.totals
    }

    /// Hands out the final topic-document counts and token array.
    pub fn into_parts(self) -> (CountMatrix, Vec<usize>) {
        (self.topic_doc, self.tokens)
    }
}
