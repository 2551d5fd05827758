//! Corpus assembly helpers: vocabulary lookup and document partitioning.
//!
//! The sampler only sees [`CsrMatrix`] shards. These helpers turn word lists into index
//! sequences and cut a node's documents into contiguous ranges, one per participant.

use crate::error::{LdaError, Result};
use crate::matrix::CsrMatrix;
use std::collections::HashMap;
use std::ops::Range;

/// Word list with a stable index per word. The index of a word is its position in the
/// list it was built from.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    words: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Builds a vocabulary from words in index order. Empty entries are skipped and a
    /// repeated word keeps its first index.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = Self::default();
        for word in words {
            let word = word.into();
            if word.is_empty() || vocab.index.contains_key(&word) {
                continue;
            }
            vocab.index.insert(word.clone(), vocab.words.len());
            vocab.words.push(word);
        }
        vocab
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    pub fn word(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    /// Maps a token stream to word indices, dropping tokens outside the vocabulary.
    /// Returns the indices and the number of dropped tokens.
    pub fn encode<'a, I>(&self, tokens: I) -> (Vec<usize>, usize)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut dropped = 0;
        let ids = tokens
            .into_iter()
            .filter_map(|t| {
                let id = self.get(t);
                if id.is_none() {
                    dropped += 1;
                }
                id
            })
            .collect();
        (ids, dropped)
    }
}

/// Splits `n` items into `parts` contiguous ranges.
///
/// Every range holds `n / parts` items except the last, which also takes the remainder.
///
/// ```rust
/// use lda_rs::corpus::partition;
///
/// assert_eq!(partition(10, 3).unwrap(), vec![0..3, 3..6, 6..10]);
/// ```
pub fn partition(n: usize, parts: usize) -> Result<Vec<Range<usize>>> {
    if parts == 0 {
        return Err(LdaError::InvalidConfig(
            "cannot partition into zero parts".into(),
        ));
    }
    let chunk = n / parts;
    Ok((0..parts)
        .map(|p| {
            let start = p * chunk;
            let end = if p + 1 == parts { n } else { start + chunk };
            start..end
        })
        .collect())
}

/// Cuts a document-word matrix into `parts` row blocks following [`partition`].
pub fn split_documents(docs: &CsrMatrix, parts: usize) -> Result<Vec<CsrMatrix>> {
    partition(docs.nrows(), parts)?
        .into_iter()
        .map(|r| docs.slice_rows(r.start, r.end))
        .collect()
}
