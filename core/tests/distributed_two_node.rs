use lda_rs::corpus::{partition, split_documents};
use lda_rs::distributed::CpuBackend;
use lda_rs::matrix::{CountMatrix, CsrMatrix};
use lda_rs::{LdaConfig, NodeTrainer};
use std::thread;

fn corpus() -> CsrMatrix {
    CsrMatrix::from_documents(
        &[
            vec![0, 0, 2],
            vec![1, 3, 3],
            vec![0, 1, 2, 3],
            vec![4, 4, 5, 0],
            vec![5, 5, 4],
            vec![2, 2, 2, 1],
        ],
        6,
    )
    .unwrap()
}

/// Runs `world_size` nodes with `threads` shards each and returns every node's baseline
/// after every iteration.
fn run_cluster(world_size: usize, threads: usize, iterations: usize) -> Vec<Vec<CountMatrix>> {
    let docs = corpus();
    let ranges = partition(docs.nrows(), world_size).unwrap();

    let handles: Vec<_> = CpuBackend::ring(world_size)
        .into_iter()
        .zip(ranges)
        .map(|(backend, range)| {
            let node_docs = docs.slice_rows(range.start, range.end).unwrap();
            thread::spawn(move || {
                let shards = split_documents(&node_docs, threads).unwrap();
                let config = LdaConfig::new(3)
                    .with_iterations(iterations)
                    .with_seed(2024);
                let mut trainer = NodeTrainer::new(config, backend, 6, shards).unwrap();
                assert_eq!(trainer.total_tokens(), 21);

                let mut history = vec![trainer.baseline().clone()];
                for _ in 0..iterations {
                    trainer.step().unwrap();
                    history.push(trainer.baseline().clone());
                }
                history
            })
        })
        .collect();

    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn test_two_nodes_adopt_identical_baselines() {
    let nodes = run_cluster(2, 1, 20);
    assert_eq!(nodes.len(), 2);

    for (a, b) in nodes[0].iter().zip(&nodes[1]) {
        assert_eq!(a, b);
        assert_eq!(a.sum(), 21.0);
    }
    assert_eq!(nodes[0].len(), 21);
}

#[test]
fn test_three_nodes_two_threads_each() {
    let nodes = run_cluster(3, 2, 10);
    let expected_words = corpus_word_totals();

    for i in 0..=10 {
        let reference = &nodes[0][i];
        assert_eq!(reference.sum(), 21.0);
        assert_eq!(reference.column_sums(), expected_words);
        for node in &nodes[1..] {
            assert_eq!(&node[i], reference);
        }
    }
}

fn corpus_word_totals() -> Vec<f64> {
    let docs = corpus();
    let mut totals = vec![0.0; docs.ncols()];
    for d in 0..docs.nrows() {
        for (w, c) in docs.row(d) {
            totals[w] += c;
        }
    }
    totals
}
