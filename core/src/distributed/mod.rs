//! # Cluster Synchronization
//!
//! Every node keeps its own copy of the topic-word counts. Once per iteration the nodes
//! exchange what changed locally so that all copies converge on the same global counts.
//!
//! ## Protocol
//!
//! 1. Each node sums the deltas its shards produced during the sweep.
//! 2. The node deltas are **All-Reduced**: every node receives the elementwise sum.
//! 3. Each node adds the global delta to its baseline.
//!
//! Shards sample against counts that are at most one iteration old (Stale-Synchronous
//! Parallel), so the chain is not the sequential Gibbs chain. The baselines of all nodes
//! are identical after every round.
//!
//! ## Module Contents
//!
//! *   [`CollectiveBackend`]: the interface for communication. We support:
//!     *   [`LocalBackend`]: a cluster of one.
//!     *   [`CpuBackend`]: Ring All-Reduce over channels between in-process peers.
//! *   [`ClusterSynchronizer`]: what the trainer holds; validates results and lifts
//!     scalars into matrices.

pub mod backend;
pub mod cpu_backend;
pub mod local;
pub mod sync;

pub use backend::CollectiveBackend;
pub use cpu_backend::CpuBackend;
pub use local::LocalBackend;
pub use sync::ClusterSynchronizer;
