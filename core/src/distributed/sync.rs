use super::backend::CollectiveBackend;
use crate::error::{LdaError, Result};
use crate::matrix::CountMatrix;
use tracing::trace;

/// Node-side handle on the cluster.
///
/// Wraps a [`CollectiveBackend`] with the checks the trainer relies on: the result of a
/// reduction has the shape that went in, and scalars travel as `1x1` matrices so a
/// backend only has to implement one operation.
pub struct ClusterSynchronizer<B: CollectiveBackend> {
    backend: B,
    rounds: u64,
}

impl<B: CollectiveBackend> ClusterSynchronizer<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, rounds: 0 }
    }

    pub fn rank(&self) -> usize {
        self.backend.rank()
    }

    pub fn world_size(&self) -> usize {
        self.backend.world_size()
    }

    /// Number of completed collective calls.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// All-reduces a count matrix across every node.
    pub fn reduce(&mut self, matrix: &CountMatrix) -> Result<CountMatrix> {
        let reduced = self.backend.all_reduce_sum(matrix)?;
        if reduced.shape() != matrix.shape() {
            return Err(LdaError::Collective(format!(
                "reduction returned shape {:?} for input of shape {:?}",
                reduced.shape(),
                matrix.shape()
            )));
        }
        self.rounds += 1;
        trace!(
            round = self.rounds,
            rank = self.rank(),
            rows = matrix.rows(),
            cols = matrix.cols(),
            "all-reduce complete"
        );
        Ok(reduced)
    }

    /// All-reduces a count, e.g. the number of tokens each node holds.
    pub fn reduce_count(&mut self, count: usize) -> Result<usize> {
        let lifted = CountMatrix::new(vec![count as f64], [1, 1])?;
        let reduced = self.reduce(&lifted)?;
        let total = reduced.get(0, 0);
        if !(total.is_finite() && total >= 0.0) {
            return Err(LdaError::Collective(format!(
                "reduced count {total} is not a valid token count"
            )));
        }
        Ok(total.round() as usize)
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributed::{CpuBackend, LocalBackend};
    use std::thread;

    #[test]
    fn test_local_reduce_counts_rounds() {
        let mut sync = ClusterSynchronizer::new(LocalBackend::new());
        let m = CountMatrix::new(vec![1.0, 2.0], [2, 1]).unwrap();
        assert_eq!(sync.reduce(&m).unwrap(), m);
        assert_eq!(sync.reduce_count(10).unwrap(), 10);
        assert_eq!(sync.rounds(), 2);
    }

    #[test]
    fn test_ring_reduce_count() {
        let handles: Vec<_> = CpuBackend::ring(3)
            .into_iter()
            .map(|backend| {
                thread::spawn(move || {
                    let mut sync = ClusterSynchronizer::new(backend);
                    let mine = 10 * (sync.rank() + 1);
                    sync.reduce_count(mine).unwrap()
                })
            })
            .collect();

        for h in handles {
            assert_eq!(h.join().unwrap(), 60);
        }
    }

    struct ShrinkingBackend;

    impl CollectiveBackend for ShrinkingBackend {
        fn rank(&self) -> usize {
            0
        }

        fn world_size(&self) -> usize {
            1
        }

        fn all_reduce_sum(&self, _matrix: &CountMatrix) -> Result<CountMatrix> {
            CountMatrix::zeros(1, 1)
        }
    }

    #[test]
    fn test_shape_change_is_collective_error() {
        let mut sync = ClusterSynchronizer::new(ShrinkingBackend);
        let m = CountMatrix::zeros(2, 2).unwrap();
        assert!(matches!(sync.reduce(&m), Err(LdaError::Collective(_))));
        assert_eq!(sync.rounds(), 0);
    }
}
