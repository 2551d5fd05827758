use crate::error::Result;
use crate::matrix::CountMatrix;

/// Abstraction for a cluster communication backend.
///
/// This trait allows swapping between different communication implementations:
/// - **Local**: a single node, the reduction is the identity.
/// - **CPU/Ring**: ring all-reduce over channels between in-process peers.
///
/// Membership is fixed when the backend is constructed. Every participant must call the
/// collective operations in the same order with matrices of the same shape.
pub trait CollectiveBackend: Send + Sync {
    /// Returns the rank of this node.
    fn rank(&self) -> usize;

    /// Returns the number of nodes taking part in every collective call.
    fn world_size(&self) -> usize;

    /// Performs an All-Reduce sum on the given matrix.
    ///
    /// Blocks until every participant has contributed and returns the elementwise sum of
    /// all contributions. A disconnected peer is reported as `LdaError::Collective`.
    fn all_reduce_sum(&self, matrix: &CountMatrix) -> Result<CountMatrix>;
}
