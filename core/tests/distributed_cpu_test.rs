use crossbeam::channel::unbounded;
use lda_rs::distributed::backend::CollectiveBackend;
use lda_rs::distributed::cpu_backend::CpuBackend;
use lda_rs::matrix::CountMatrix;
use lda_rs::LdaError;
use std::thread;

#[test]
fn test_ring_all_reduce_cpu() {
    let world_size = 4;
    let mut handles = vec![];

    // Create channels for the ring: 0->1->2->3->0
    let mut txs = vec![];
    let mut rxs = vec![];

    for _ in 0..world_size {
        let (tx, rx) = unbounded();
        txs.push(tx);
        rxs.push(rx);
    }

    for rank in 0..world_size {
        // Channel i connects Node i to Node i+1.
        // Node i sends on Channel i.
        // Node i+1 receives on Channel i.
        let my_tx_idx = rank;
        let my_rx_idx = (rank + world_size - 1) % world_size;

        let right_tx = txs[my_tx_idx].clone();
        let left_rx = rxs[my_rx_idx].clone();

        let handle = thread::spawn(move || {
            let backend = CpuBackend::new(rank, world_size, left_rx, right_tx);

            // Rank 0 has 1s, Rank 1 has 2s, etc. Sum should be 1+2+3+4 = 10.
            let data = vec![(rank + 1) as f64; 8];
            let matrix = CountMatrix::new(data, [2, 4]).unwrap();

            let result = backend.all_reduce_sum(&matrix).unwrap();

            assert_eq!(result.shape(), &[2, 4]);
            for &val in result.data() {
                assert!(
                    (val - 10.0).abs() < 1e-9,
                    "Rank {}: Expected {}, got {}",
                    rank,
                    10.0,
                    val
                );
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_ring_all_reduce_uneven_chunks() {
    // 7 elements over 3 ranks: chunks of 3, 3 and 1. Deltas may be negative.
    let world_size = 3;
    let handles: Vec<_> = CpuBackend::ring(world_size)
        .into_iter()
        .map(|backend| {
            thread::spawn(move || {
                let rank = backend.rank() as f64;
                let data: Vec<f64> = (0..7).map(|i| i as f64 - rank).collect();
                let matrix = CountMatrix::new(data, [1, 7]).unwrap();
                backend.all_reduce_sum(&matrix).unwrap()
            })
        })
        .collect();

    // Sum over ranks 0, 1, 2 of (i - rank) = 3i - 3.
    let expected: Vec<f64> = (0..7).map(|i| 3.0 * i as f64 - 3.0).collect();
    for handle in handles {
        let result = handle.join().unwrap();
        assert_eq!(result.data(), expected.as_slice());
    }
}

#[test]
fn test_ring_all_reduce_more_ranks_than_elements() {
    let handles: Vec<_> = CpuBackend::ring(5)
        .into_iter()
        .map(|backend| {
            thread::spawn(move || {
                let matrix = CountMatrix::new(vec![1.0, 2.0], [2, 1]).unwrap();
                backend.all_reduce_sum(&matrix).unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().data(), &[5.0, 10.0]);
    }
}

#[test]
fn test_ring_shape_disagreement_is_error() {
    let handles: Vec<_> = CpuBackend::ring(2)
        .into_iter()
        .map(|backend| {
            thread::spawn(move || {
                let cols = 4 + 2 * backend.rank();
                let matrix = CountMatrix::zeros(1, cols).unwrap();
                backend.all_reduce_sum(&matrix)
            })
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap();
        assert!(matches!(result, Err(LdaError::Collective(_))));
    }
}

#[test]
fn test_cpu_backend_properties() {
    let (tx, rx) = unbounded();
    let backend = CpuBackend::new(2, 4, rx, tx);
    assert_eq!(backend.rank(), 2);
    assert_eq!(backend.world_size(), 4);
}
