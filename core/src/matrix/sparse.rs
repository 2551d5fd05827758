//! Compressed sparse row storage for document-word counts.

use crate::error::{LdaError, Result};

/// Compressed Sparse Row matrix with documents as rows and vocabulary entries as columns.
///
/// Column indices are strictly ascending within each row. The sampler depends on that
/// order: a shard's token array is laid out document by document, then word by word in
/// ascending index, so the sweep and the token array stay in lockstep.
#[derive(Clone, Debug, PartialEq)]
pub struct CsrMatrix {
    nrows: usize,
    ncols: usize,
    row_ptrs: Vec<usize>,    // length nrows + 1
    col_indices: Vec<usize>, // length nnz
    values: Vec<f64>,        // length nnz
}

impl CsrMatrix {
    /// Builds a matrix from raw CSR arrays, validating their structure.
    pub fn new(
        nrows: usize,
        ncols: usize,
        row_ptrs: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if row_ptrs.len() != nrows + 1 {
            return Err(LdaError::ShapeMismatch {
                expected: vec![nrows + 1],
                got: vec![row_ptrs.len()],
            });
        }
        if col_indices.len() != values.len() || row_ptrs[nrows] != values.len() {
            return Err(LdaError::ShapeMismatch {
                expected: vec![row_ptrs[nrows]],
                got: vec![col_indices.len(), values.len()],
            });
        }
        if row_ptrs[0] != 0 || row_ptrs.windows(2).any(|w| w[0] > w[1]) {
            return Err(LdaError::InvalidConfig(
                "row pointers must start at 0 and be non-decreasing".into(),
            ));
        }
        for row in 0..nrows {
            let cols = &col_indices[row_ptrs[row]..row_ptrs[row + 1]];
            if cols.windows(2).any(|w| w[0] >= w[1]) {
                return Err(LdaError::InvalidConfig(format!(
                    "column indices of row {row} must be strictly ascending"
                )));
            }
            if let Some(&index) = cols.iter().find(|&&c| c >= ncols) {
                return Err(LdaError::WordOutOfBounds {
                    index,
                    vocab_size: ncols,
                });
            }
        }
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(LdaError::InvalidConfig(
                "document-word counts must be finite and non-negative".into(),
            ));
        }

        Ok(Self {
            nrows,
            ncols,
            row_ptrs,
            col_indices,
            values,
        })
    }

    /// Counts word occurrences per document.
    ///
    /// Each document is a sequence of vocabulary indices in reading order; repeated indices
    /// are merged into a single entry.
    pub fn from_documents(documents: &[Vec<usize>], vocab_size: usize) -> Result<Self> {
        let mut row_ptrs = Vec::with_capacity(documents.len() + 1);
        let mut col_indices = Vec::new();
        let mut values = Vec::new();
        row_ptrs.push(0);

        let mut sorted = Vec::new();
        for doc in documents {
            sorted.clear();
            sorted.extend_from_slice(doc);
            sorted.sort_unstable();

            let row_start = values.len();
            for &word in &sorted {
                if word >= vocab_size {
                    return Err(LdaError::WordOutOfBounds {
                        index: word,
                        vocab_size,
                    });
                }
                // Repeats are adjacent after sorting; merge them into the current entry.
                if values.len() > row_start && col_indices.last() == Some(&word) {
                    if let Some(v) = values.last_mut() {
                        *v += 1.0;
                    }
                } else {
                    col_indices.push(word);
                    values.push(1.0);
                }
            }
            row_ptrs.push(values.len());
        }

        Ok(Self {
            nrows: documents.len(),
            ncols: vocab_size,
            row_ptrs,
            col_indices,
            values,
        })
    }

    /// Builds a matrix from dense rows, dropping zeros.
    pub fn from_dense(rows: &[Vec<f64>], ncols: usize) -> Result<Self> {
        let mut row_ptrs = Vec::with_capacity(rows.len() + 1);
        let mut col_indices = Vec::new();
        let mut values = Vec::new();
        row_ptrs.push(0);

        for row in rows {
            if row.len() != ncols {
                return Err(LdaError::ShapeMismatch {
                    expected: vec![ncols],
                    got: vec![row.len()],
                });
            }
            for (col, &v) in row.iter().enumerate() {
                if v != 0.0 {
                    col_indices.push(col);
                    values.push(v);
                }
            }
            row_ptrs.push(values.len());
        }

        Self::new(rows.len(), ncols, row_ptrs, col_indices, values)
    }

    /// Number of documents.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Vocabulary size.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Nonzero `(word, count)` entries of one document in ascending word order.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_ptrs[row]..self.row_ptrs[row + 1];
        self.col_indices[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Get element (row, col). O(nnz_row) lookup.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.row(row)
            .find(|&(c, _)| c == col)
            .map(|(_, v)| v)
            .unwrap_or(0.0)
    }

    /// Number of token occurrences in one document. Fractional counts are truncated.
    pub fn row_token_count(&self, row: usize) -> usize {
        self.row(row).map(|(_, v)| v.floor() as usize).sum()
    }

    /// Number of token occurrences in the whole matrix; the length of a matching token array.
    pub fn token_count(&self) -> usize {
        self.values.iter().map(|v| v.floor() as usize).sum()
    }

    /// Copies out a contiguous range of documents as a new matrix.
    pub fn slice_rows(&self, start: usize, end: usize) -> Result<Self> {
        if start > end || end > self.nrows {
            return Err(LdaError::ShapeMismatch {
                expected: vec![self.nrows],
                got: vec![start, end],
            });
        }
        let lo = self.row_ptrs[start];
        let hi = self.row_ptrs[end];
        Ok(Self {
            nrows: end - start,
            ncols: self.ncols,
            row_ptrs: self.row_ptrs[start..=end].iter().map(|p| p - lo).collect(),
            col_indices: self.col_indices[lo..hi].to_vec(),
            values: self.values[lo..hi].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> CsrMatrix {
        CsrMatrix::from_dense(
            &[
                vec![2.0, 0.0, 1.0, 0.0],
                vec![0.0, 1.0, 0.0, 2.0],
                vec![1.0, 1.0, 1.0, 1.0],
            ],
            4,
        )
        .unwrap()
    }

    #[test]
    fn test_from_dense() {
        let m = scenario();
        assert_eq!(m.nrows(), 3);
        assert_eq!(m.ncols(), 4);
        assert_eq!(m.nnz(), 8);
        assert_eq!(m.row(0).collect::<Vec<_>>(), vec![(0, 2.0), (2, 1.0)]);
        assert_eq!(m.get(1, 3), 2.0);
        assert_eq!(m.get(1, 0), 0.0);
        assert_eq!(m.token_count(), 10);
        assert_eq!(m.row_token_count(2), 4);
    }

    #[test]
    fn test_from_documents_merges_and_sorts() {
        let docs = vec![vec![2, 0, 0], vec![3, 1, 3], vec![0, 1, 2, 3]];
        let m = CsrMatrix::from_documents(&docs, 4).unwrap();
        assert_eq!(m, scenario());
    }

    #[test]
    fn test_from_documents_repeated_word_across_rows() {
        // The last word of row 0 equals the first word of row 1; they must stay separate.
        let docs = vec![vec![1], vec![1, 1]];
        let m = CsrMatrix::from_documents(&docs, 2).unwrap();
        assert_eq!(m.row(0).collect::<Vec<_>>(), vec![(1, 1.0)]);
        assert_eq!(m.row(1).collect::<Vec<_>>(), vec![(1, 2.0)]);
    }

    #[test]
    fn test_from_documents_empty_document() {
        let docs = vec![vec![], vec![0]];
        let m = CsrMatrix::from_documents(&docs, 1).unwrap();
        assert_eq!(m.row(0).count(), 0);
        assert_eq!(m.token_count(), 1);
    }

    #[test]
    fn test_out_of_vocabulary_rejected() {
        let err = CsrMatrix::from_documents(&[vec![0, 5]], 4);
        assert!(matches!(
            err,
            Err(LdaError::WordOutOfBounds {
                index: 5,
                vocab_size: 4
            })
        ));
    }

    #[test]
    fn test_new_validates_structure() {
        // Descending columns in a row.
        let err = CsrMatrix::new(1, 3, vec![0, 2], vec![2, 1], vec![1.0, 1.0]);
        assert!(matches!(err, Err(LdaError::InvalidConfig(_))));

        // Negative count.
        let err = CsrMatrix::new(1, 3, vec![0, 1], vec![1], vec![-1.0]);
        assert!(matches!(err, Err(LdaError::InvalidConfig(_))));

        // Wrong row pointer length.
        let err = CsrMatrix::new(2, 3, vec![0, 1], vec![1], vec![1.0]);
        assert!(matches!(err, Err(LdaError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_slice_rows() {
        let m = scenario();
        let tail = m.slice_rows(1, 3).unwrap();
        assert_eq!(tail.nrows(), 2);
        assert_eq!(tail.row(0).collect::<Vec<_>>(), vec![(1, 1.0), (3, 2.0)]);
        assert_eq!(tail.token_count(), 7);

        let empty = m.slice_rows(2, 2).unwrap();
        assert_eq!(empty.nrows(), 0);
        assert_eq!(empty.token_count(), 0);

        assert!(m.slice_rows(2, 4).is_err());
    }
}
