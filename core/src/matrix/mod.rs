//! Count matrices.
//!
//! The sampler's sufficient statistics are plain count tables:
//!
//! - **Topic-word** `[n_topics, vocab_size]`: how often each word is assigned to each topic.
//! - **Topic-document** `[n_topics, n_docs]`: how many tokens of each document carry each topic.
//! - **Document-word** (sparse, see [`CsrMatrix`]): raw term frequencies, read-only.
//!
//! Dense tables are row-major `f64` buffers. Counts are whole numbers, but storing them as
//! floating point lets the sampling kernel use them directly in the weight formula, and
//! deltas between two snapshots may be negative.
//!
//! ```rust
//! use lda_rs::matrix::CountMatrix;
//!
//! let mut m = CountMatrix::zeros(2, 3).unwrap();
//! m.set(1, 2, 4.0);
//! assert_eq!(m.row_sums().unwrap(), vec![0.0, 4.0]);
//! assert_eq!(m.sum(), 4.0);
//! ```

pub mod sparse;

pub use sparse::CsrMatrix;

use crate::error::{LdaError, Result};
use lda_kernels::{cpu_add_assign, cpu_row_sums, cpu_sub_assign, cpu_sum};

/// Dense row-major count table.
#[derive(Clone, Debug, PartialEq)]
pub struct CountMatrix {
    shape: [usize; 2],
    data: Vec<f64>,
}

impl CountMatrix {
    /// Creates a matrix filled with zeros.
    ///
    /// # Errors
    ///
    /// Returns `LdaError::Allocation` if the buffer cannot be reserved. Topic-word tables grow
    /// with `n_topics * vocab_size`, so this is reported instead of aborting the process.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        let size = rows
            .checked_mul(cols)
            .ok_or(LdaError::Allocation { rows, cols })?;
        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| LdaError::Allocation { rows, cols })?;
        data.resize(size, 0.0);
        Ok(Self {
            shape: [rows, cols],
            data,
        })
    }

    /// Wraps an existing row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns `LdaError::ShapeMismatch` if `data.len()` is not `rows * cols`.
    pub fn new(data: Vec<f64>, shape: [usize; 2]) -> Result<Self> {
        let size = shape[0] * shape[1];
        if data.len() != size {
            return Err(LdaError::ShapeMismatch {
                expected: vec![size],
                got: vec![data.len()],
            });
        }
        Ok(Self { shape, data })
    }

    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    pub fn cols(&self) -> usize {
        self.shape[1]
    }

    pub fn shape(&self) -> &[usize; 2] {
        &self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.shape[1] + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.shape[1] + col] = value;
    }

    /// Adds `value` to a single cell.
    pub fn increment(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.shape[1] + col] += value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let cols = self.shape[1];
        &self.data[row * cols..(row + 1) * cols]
    }

    /// Copies out one column (e.g. the topic counts of one document).
    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.shape[0]).map(|r| self.get(r, col)).collect()
    }

    /// Sum of every element.
    pub fn sum(&self) -> f64 {
        cpu_sum(&self.data)
    }

    /// Sum of each row; for a topic-word table these are the per-topic totals.
    pub fn row_sums(&self) -> Result<Vec<f64>> {
        Ok(cpu_row_sums(&self.data, &self.shape)?)
    }

    /// Sum of each column; for a topic-document table these are the document lengths.
    pub fn column_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.shape[1]];
        for row in self.data.chunks(self.shape[1].max(1)) {
            for (s, &x) in sums.iter_mut().zip(row) {
                *s += x;
            }
        }
        sums
    }

    /// `self += other`, elementwise.
    pub fn add_assign(&mut self, other: &CountMatrix) -> Result<()> {
        self.check_same_shape(other)?;
        Ok(cpu_add_assign(&mut self.data, &other.data)?)
    }

    /// `self -= other`, elementwise.
    pub fn sub_assign(&mut self, other: &CountMatrix) -> Result<()> {
        self.check_same_shape(other)?;
        Ok(cpu_sub_assign(&mut self.data, &other.data)?)
    }

    /// Overwrites every element with the matching element of `other`.
    pub fn copy_from(&mut self, other: &CountMatrix) -> Result<()> {
        self.check_same_shape(other)?;
        self.data.copy_from_slice(&other.data);
        Ok(())
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    fn check_same_shape(&self, other: &CountMatrix) -> Result<()> {
        if self.shape != other.shape {
            return Err(LdaError::ShapeMismatch {
                expected: self.shape.to_vec(),
                got: other.shape.to_vec(),
            });
        }
        Ok(())
    }
}
