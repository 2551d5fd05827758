use crate::rand48::Rand48;
use crate::{KernelError, Result};

/// Hyperparameters read by every token update.
///
/// `smoothing` is the denominator offset `N * beta`, where `N` is the token count of the
/// whole corpus across every node. Textbook LDA uses the vocabulary size here; the global
/// token count is the modeling choice this sampler is built around and is kept as is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GibbsParams {
    pub alpha: f64,
    pub beta: f64,
    pub smoothing: f64,
}

impl GibbsParams {
    pub fn new(alpha: f64, beta: f64, total_tokens: usize) -> Self {
        Self {
            alpha,
            beta,
            smoothing: total_tokens as f64 * beta,
        }
    }
}

/// Mutable views over the three count tables a token update touches.
///
/// Both matrices are row-major with one row per topic:
/// - `topic_word`: `[n_topics, vocab_size]`
/// - `topic_doc`: `[n_topics, n_docs]`
pub struct TokenCounts<'a> {
    pub topic_word: &'a mut [f64],
    pub vocab_size: usize,
    pub topic_doc: &'a mut [f64],
    pub n_docs: usize,
    pub totals: &'a mut [f64],
}

impl TokenCounts<'_> {
    pub fn n_topics(&self) -> usize {
        self.totals.len()
    }

    /// Checks the slice lengths against the declared shapes.
    ///
    /// The sampling loop indexes without further checks, so callers validate once per sweep.
    pub fn check_shapes(&self) -> Result<()> {
        let n_topics = self.n_topics();
        if self.topic_word.len() != n_topics * self.vocab_size {
            return Err(KernelError::ShapeMismatch {
                expected: vec![n_topics, self.vocab_size],
                got: vec![self.topic_word.len()],
            });
        }
        if self.topic_doc.len() != n_topics * self.n_docs {
            return Err(KernelError::ShapeMismatch {
                expected: vec![n_topics, self.n_docs],
                got: vec![self.topic_doc.len()],
            });
        }
        Ok(())
    }
}

/// Fills `probs` with the unnormalized conditional for every topic and returns their sum.
///
/// ```text
/// p(i) = (topic_word[i][w] + beta) * (topic_doc[i][d] + alpha) / (totals[i] + smoothing)
/// ```
pub fn topic_weights(
    counts: &TokenCounts<'_>,
    word: usize,
    doc: usize,
    params: &GibbsParams,
    probs: &mut [f64],
) -> f64 {
    let mut sum = 0.0;
    for (topic, p) in probs.iter_mut().enumerate() {
        let tw = counts.topic_word[topic * counts.vocab_size + word];
        let td = counts.topic_doc[topic * counts.n_docs + doc];
        *p = (tw + params.beta) * (td + params.alpha) / (counts.totals[topic] + params.smoothing);
        sum += *p;
    }
    sum
}

/// Picks a topic from unnormalized weights given a uniform variate `u`.
///
/// Walks topics in index order until the running sum reaches `u * total`. When rounding
/// lets the walk step past the last topic, the overshoot index wraps modulo the topic
/// count, so the result is always a valid topic.
pub fn draw_topic(weights: &[f64], total: f64, u: f64) -> usize {
    let target = total * u;
    let mut running = 0.0;
    for (topic, &w) in weights.iter().enumerate() {
        running += w;
        if running >= target {
            return topic;
        }
    }
    weights.len() % weights.len()
}

/// Reassigns a single token occurrence.
///
/// Removes the token's current topic from the counts, samples a new topic from the
/// collapsed conditional, writes it back into `token` and adds it to the counts.
/// Returns the new topic.
///
/// # Arguments
///
/// * `counts` - Topic-word, topic-document and per-topic totals of the owning shard.
/// * `probs` - Scratch buffer of length `n_topics`.
/// * `token` - The token-array entry holding the current topic.
/// * `word`, `doc` - Column indices of the token in the two matrices.
pub fn cpu_sample_token(
    counts: &mut TokenCounts<'_>,
    probs: &mut [f64],
    token: &mut usize,
    word: usize,
    doc: usize,
    params: &GibbsParams,
    rng: &mut Rand48,
) -> usize {
    let old = *token;
    counts.topic_word[old * counts.vocab_size + word] -= 1.0;
    counts.topic_doc[old * counts.n_docs + doc] -= 1.0;
    counts.totals[old] -= 1.0;

    let total = topic_weights(counts, word, doc, params, probs);
    let new = draw_topic(probs, total, rng.next_f64());

    *token = new;
    counts.topic_word[new * counts.vocab_size + word] += 1.0;
    counts.topic_doc[new * counts.n_docs + doc] += 1.0;
    counts.totals[new] += 1.0;
    new
}
