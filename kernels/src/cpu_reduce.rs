use crate::{KernelElem, KernelError, Result};
use rayon::prelude::*;

fn check_len(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(KernelError::ShapeMismatch {
            expected: vec![expected],
            got: vec![got],
        });
    }
    Ok(())
}

/// `dst += src`, elementwise.
///
/// Count matrices are `n_topics * vocab_size` long, which is large enough for the
/// parallel split to pay off on real vocabularies.
pub fn cpu_add_assign<T: KernelElem>(dst: &mut [T], src: &[T]) -> Result<()> {
    check_len(dst.len(), src.len())?;
    dst.par_iter_mut()
        .zip(src.par_iter())
        .for_each(|(d, &s)| *d += s);
    Ok(())
}

/// `dst -= src`, elementwise.
pub fn cpu_sub_assign<T: KernelElem>(dst: &mut [T], src: &[T]) -> Result<()> {
    check_len(dst.len(), src.len())?;
    dst.par_iter_mut()
        .zip(src.par_iter())
        .for_each(|(d, &s)| *d -= s);
    Ok(())
}

/// Sum of every row of a row-major `[rows, cols]` buffer.
pub fn cpu_row_sums<T: KernelElem>(data: &[T], shape: &[usize; 2]) -> Result<Vec<T>> {
    let [rows, cols] = *shape;
    check_len(rows * cols, data.len())?;
    if cols == 0 {
        return Ok(vec![T::zero(); rows]);
    }
    Ok(data
        .par_chunks(cols)
        .map(|row| row.iter().fold(T::zero(), |acc, &x| acc + x))
        .collect())
}

/// Sum of all elements.
pub fn cpu_sum<T: KernelElem>(data: &[T]) -> T {
    data.iter().fold(T::zero(), |acc, &x| acc + x)
}
