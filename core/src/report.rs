//! Summaries of a trained model.
//!
//! Pure functions over the count matrices; nothing here touches sampler state.

use crate::matrix::CountMatrix;

/// Headline numbers for one topic.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicSummary {
    pub topic: usize,
    /// Fraction of all tokens assigned to this topic.
    pub share: f64,
    /// `(word index, count)` pairs, most frequent first.
    pub top_words: Vec<(usize, f64)>,
}

/// Returns `(index, value)` pairs sorted by descending value, ties in index order.
fn ranked(values: &[f64], k: usize) -> Vec<(usize, f64)> {
    let mut pairs: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
    pairs.truncate(k);
    pairs
}

/// Summarizes every row of a `[n_topics, vocab_size]` topic-word matrix.
pub fn topic_summaries(topic_word: &CountMatrix, top_words: usize) -> Vec<TopicSummary> {
    let total = topic_word.sum();
    (0..topic_word.rows())
        .map(|topic| {
            let row = topic_word.row(topic);
            let row_total: f64 = row.iter().sum();
            TopicSummary {
                topic,
                share: if total > 0.0 { row_total / total } else { 0.0 },
                top_words: ranked(row, top_words),
            }
        })
        .collect()
}

/// Topic proportions of every document in a `[n_topics, n_docs]` topic-document matrix.
///
/// Each entry lists `(topic, proportion)` pairs sorted by descending proportion and cut to
/// `top_topics`. Empty documents get all-zero proportions.
pub fn document_topics(topic_doc: &CountMatrix, top_topics: usize) -> Vec<Vec<(usize, f64)>> {
    (0..topic_doc.cols())
        .map(|doc| {
            let mut column = topic_doc.column(doc);
            let total: f64 = column.iter().sum();
            if total > 0.0 {
                column.iter_mut().for_each(|c| *c /= total);
            }
            ranked(&column, top_topics)
        })
        .collect()
}
