use super::backend::CollectiveBackend;
use crate::error::Result;
use crate::matrix::CountMatrix;

/// Backend for a cluster of one. The reduction of a single contribution is itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalBackend;

impl LocalBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CollectiveBackend for LocalBackend {
    fn rank(&self) -> usize {
        0
    }

    fn world_size(&self) -> usize {
        1
    }

    fn all_reduce_sum(&self, matrix: &CountMatrix) -> Result<CountMatrix> {
        Ok(matrix.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_reduce_is_identity() {
        let backend = LocalBackend::new();
        assert_eq!(backend.rank(), 0);
        assert_eq!(backend.world_size(), 1);

        let m = CountMatrix::new(vec![1.0, -2.0, 3.0], [1, 3]).unwrap();
        assert_eq!(backend.all_reduce_sum(&m).unwrap(), m);
    }
}
