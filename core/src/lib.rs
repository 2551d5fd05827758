//! # lda-rs
//!
//! `lda-rs` trains Latent Dirichlet Allocation topic models with collapsed Gibbs sampling,
//! spread over worker threads inside a node and over the nodes of a cluster.
//!
//! Each node splits its documents into shards, one per worker thread. Shards sample
//! against a private copy of the topic-word counts; once per iteration the node sums the
//! shard deltas and all-reduces them with the other nodes. Sampling therefore runs on
//! counts that are at most one iteration stale.
//!
//! ## Modules
//!
//! - [`matrix`]: dense count tables and the sparse document-word matrix.
//! - [`config`]: hyperparameters.
//! - [`shard`]: per-thread sampler state and the sweep.
//! - [`trainer`]: the per-node orchestrator.
//! - [`distributed`]: collective backends and the cluster synchronizer.
//! - [`corpus`]: vocabulary lookup and document partitioning.
//! - [`report`]: top words per topic and topic proportions per document.
//!
//! ## Example
//!
//! ```rust
//! use lda_rs::distributed::LocalBackend;
//! use lda_rs::matrix::CsrMatrix;
//! use lda_rs::{LdaConfig, NodeTrainer};
//!
//! let docs = CsrMatrix::from_documents(&[vec![0, 0, 2], vec![1, 3, 3], vec![0, 1, 2, 3]], 4).unwrap();
//! let config = LdaConfig::new(2).with_iterations(20).with_seed(42);
//!
//! let mut trainer = NodeTrainer::new(config, LocalBackend::new(), 4, vec![docs]).unwrap();
//! trainer.train().unwrap();
//!
//! let model = trainer.into_model();
//! assert_eq!(model.topic_word.sum(), 10.0);
//! ```

pub mod config;
pub mod corpus;
pub mod distributed;
pub mod error;
pub mod matrix;
pub mod report;
pub mod shard;
pub mod trainer;

pub use config::LdaConfig;
pub use error::{LdaError, Result};
pub use matrix::{CountMatrix, CsrMatrix};
pub use trainer::{IterationStats, NodeTrainer, ShardModel, TrainedModel};
