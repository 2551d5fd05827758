//! # Node Trainer
//!
//! Drives the sampler on one node: a fixed rayon pool with one thread per shard sweeps
//! all shards in parallel, then the node exchanges topic-word deltas with the rest of the
//! cluster.
//!
//! ## Iteration
//!
//! 1. **Totals**: row sums of the baseline, copied into every shard.
//! 2. **Sweep**: every shard samples against its private copy of the baseline, then
//!    subtracts the baseline to isolate its delta.
//! 3. **Reduce**: shard deltas are summed into a node delta, which is all-reduced.
//! 4. **Adopt**: the global delta is added to the baseline and every shard is reseeded.
//!
//! The baseline is read-only while shards sweep and only changes between the two
//! barriers (end of the parallel sweep, end of the collective call).

use crate::config::LdaConfig;
use crate::distributed::{ClusterSynchronizer, CollectiveBackend};
use crate::error::{LdaError, Result};
use crate::matrix::{CountMatrix, CsrMatrix};
use crate::shard::Shard;
use lda_kernels::{GibbsParams, Rand48};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// What one call to [`NodeTrainer::step`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationStats {
    /// 1-based index of the completed iteration.
    pub iteration: usize,
    /// Tokens on this node whose topic changed during the sweep.
    pub reassigned: usize,
    /// Wall time of the sweep alone.
    pub sweep_time: Duration,
    /// Wall time of the whole iteration, collective call included.
    pub elapsed: Duration,
}

/// Final state of one shard.
#[derive(Debug, Clone)]
pub struct ShardModel {
    /// `[n_topics, n_docs]` topic counts of the shard's documents.
    pub topic_doc: CountMatrix,
    /// Topic of every token occurrence of the shard.
    pub tokens: Vec<usize>,
}

/// Everything a node hands out after training.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    /// `[n_topics, vocab_size]` global topic-word counts as of the last synchronization.
    pub topic_word: CountMatrix,
    pub shards: Vec<ShardModel>,
}

pub struct NodeTrainer<B: CollectiveBackend> {
    config: LdaConfig,
    sync: ClusterSynchronizer<B>,
    pool: ThreadPool,
    shards: Vec<Shard>,
    baseline: CountMatrix,
    node_delta: CountMatrix,
    params: GibbsParams,
    total_tokens: usize,
    iteration: usize,
}

impl<B: CollectiveBackend> NodeTrainer<B> {
    /// Validates the inputs, draws the initial topic assignment and agrees on a global
    /// baseline with the rest of the cluster.
    ///
    /// This is a collective call: every node of the cluster must construct its trainer
    /// at the same point.
    ///
    /// # Arguments
    ///
    /// * `config` - Hyperparameters; identical on every node.
    /// * `backend` - The node's connection to the cluster.
    /// * `vocab_size` - Number of columns of every shard matrix.
    /// * `shards` - One document-word matrix per worker thread.
    #[instrument(skip_all, fields(rank = backend.rank(), shards = shards.len()))]
    pub fn new(
        config: LdaConfig,
        backend: B,
        vocab_size: usize,
        shards: Vec<CsrMatrix>,
    ) -> Result<Self> {
        config.validate()?;
        if shards.is_empty() {
            return Err(LdaError::InvalidConfig(
                "a node needs at least one shard".into(),
            ));
        }

        let mut sync = ClusterSynchronizer::new(backend);
        let rank = sync.rank();
        let n_topics = config.n_topics;

        let mut init = match config.init_seed(rank) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let shards = shards
            .into_iter()
            .enumerate()
            .map(|(i, docs)| {
                let rng = config
                    .shard_seed(rank, i)
                    .map(Rand48::new)
                    .unwrap_or_else(Rand48::from_entropy);
                let mut shard = Shard::new(i, docs, n_topics, vocab_size, rng)?;
                shard.randomize(&mut init);
                Ok(shard)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut local = CountMatrix::zeros(n_topics, vocab_size)?;
        for shard in &shards {
            local.add_assign(shard.topic_word())?;
        }
        let baseline = sync.reduce(&local)?;

        let local_tokens: usize = shards.iter().map(Shard::token_count).sum();
        let total_tokens = sync.reduce_count(local_tokens)?;
        let params = GibbsParams::new(config.alpha, config.beta, total_tokens);

        let pool = ThreadPoolBuilder::new()
            .num_threads(shards.len())
            .thread_name(move |i| format!("lda-r{rank}-s{i}"))
            .build()?;

        let mut trainer = Self {
            node_delta: CountMatrix::zeros(n_topics, vocab_size)?,
            config,
            sync,
            pool,
            shards,
            baseline,
            params,
            total_tokens,
            iteration: 0,
        };
        trainer.reseed_shards()?;

        info!(
            world_size = trainer.sync.world_size(),
            n_topics,
            vocab_size,
            local_tokens,
            total_tokens,
            "sampler initialized"
        );
        Ok(trainer)
    }

    /// Runs one sweep of every shard followed by one synchronization round.
    pub fn step(&mut self) -> Result<IterationStats> {
        let start = Instant::now();
        let totals = self.baseline.row_sums()?;

        let Self {
            pool,
            shards,
            baseline,
            params,
            ..
        } = self;
        let baseline: &CountMatrix = baseline;
        let params: &GibbsParams = params;
        let reassigned: Vec<usize> = pool.install(|| {
            shards
                .par_iter_mut()
                .map(|shard| {
                    shard.set_totals(&totals)?;
                    let changed = shard.sweep(params)?;
                    shard.isolate_delta(baseline)?;
                    Ok(changed)
                })
                .collect::<Result<Vec<_>>>()
        })?;
        let sweep_time = start.elapsed();

        self.node_delta.fill(0.0);
        for shard in &self.shards {
            self.node_delta.add_assign(shard.topic_word())?;
        }
        let global_delta = self.sync.reduce(&self.node_delta)?;
        self.baseline.add_assign(&global_delta)?;
        self.reseed_shards()?;

        self.iteration += 1;
        let stats = IterationStats {
            iteration: self.iteration,
            reassigned: reassigned.iter().sum(),
            sweep_time,
            elapsed: start.elapsed(),
        };
        debug!(
            iteration = stats.iteration,
            reassigned = stats.reassigned,
            sweep_ms = stats.sweep_time.as_millis() as u64,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "iteration complete"
        );
        Ok(stats)
    }

    /// Runs the configured number of iterations.
    #[instrument(skip_all, fields(rank = self.sync.rank(), iterations = self.config.iterations))]
    pub fn train(&mut self) -> Result<()> {
        let start = Instant::now();
        for _ in 0..self.config.iterations {
            self.step()?;
        }
        info!(
            iterations = self.iteration,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "training complete"
        );
        Ok(())
    }

    fn reseed_shards(&mut self) -> Result<()> {
        let Self {
            pool,
            shards,
            baseline,
            ..
        } = self;
        let baseline: &CountMatrix = baseline;
        pool.install(|| {
            shards
                .par_iter_mut()
                .try_for_each(|shard| shard.reseed(baseline))
        })
    }

    pub fn config(&self) -> &LdaConfig {
        &self.config
    }

    pub fn rank(&self) -> usize {
        self.sync.rank()
    }

    pub fn world_size(&self) -> usize {
        self.sync.world_size()
    }

    /// The node's current view of the global topic-word counts.
    pub fn baseline(&self) -> &CountMatrix {
        &self.baseline
    }

    pub fn shards(&self) -> &[Shard] {
        &self.shards
    }

    /// Token count of the whole cluster.
    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    /// Number of completed iterations.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn into_model(self) -> TrainedModel {
        TrainedModel {
            topic_word: self.baseline,
            shards: self
                .shards
                .into_iter()
                .map(|shard| {
                    let (topic_doc, tokens) = shard.into_parts();
                    ShardModel { topic_doc, tokens }
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributed::LocalBackend;

    fn corpus() -> CsrMatrix {
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
    fn test_new_builds_consistent_baseline() {
        let config = LdaConfig::new(3).with_iterations(5).with_seed(1);
        let trainer = NodeTrainer::new(config, LocalBackend::new(), 4, vec![corpus()]).unwrap();

        assert_eq!(trainer.total_tokens(), 10);
        assert_eq!(trainer.baseline().shape(), &[3, 4]);
        assert_eq!(trainer.baseline().sum(), 10.0);
        assert_eq!(trainer.shards()[0].topic_word(), trainer.baseline());
        assert_eq!(trainer.iteration(), 0);
    }

    #[test]
    fn test_step_keeps_baseline_sum() {
        let config = LdaConfig::new(2).with_iterations(3).with_seed(9);
        let shards = vec![
            corpus().slice_rows(0, 2).unwrap(),
            corpus().slice_rows(2, 3).unwrap(),
        ];
        let mut trainer = NodeTrainer::new(config, LocalBackend::new(), 4, shards).unwrap();

        for i in 1..=3 {
            let stats = trainer.step().unwrap();
            assert_eq!(stats.iteration, i);
            assert!(stats.reassigned <= 10);
            assert_eq!(trainer.baseline().sum(), 10.0);
            assert_eq!(trainer.baseline().column_sums(), vec![3.0, 2.0, 2.0, 3.0]);
            for shard in trainer.shards() {
                assert_eq!(shard.topic_word(), trainer.baseline());
            }
        }
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let run = || {
            let config = LdaConfig::new(2).with_iterations(10).with_seed(1234);
            let mut trainer =
                NodeTrainer::new(config, LocalBackend::new(), 4, vec![corpus()]).unwrap();
            trainer.train().unwrap();
            trainer.into_model()
        };
        let a = run();
        let b = run();
        assert_eq!(a.topic_word, b.topic_word);
        assert_eq!(a.shards[0].tokens, b.shards[0].tokens);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let err = NodeTrainer::new(LdaConfig::new(2), LocalBackend::new(), 4, vec![]);
        assert!(matches!(err, Err(LdaError::InvalidConfig(_))));

        let err = NodeTrainer::new(
            LdaConfig::new(2).with_alpha(-1.0),
            LocalBackend::new(),
            4,
            vec![corpus()],
        );
        assert!(matches!(err, Err(LdaError::InvalidConfig(_))));

        let err = NodeTrainer::new(LdaConfig::new(2), LocalBackend::new(), 5, vec![corpus()]);
        assert!(matches!(
            err,
            Err(LdaError::VocabularyMismatch { shard: 0, .. })
        ));
    }
}
