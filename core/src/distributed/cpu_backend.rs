use super::backend::CollectiveBackend;
use crate::error::{LdaError, Result};
use crate::matrix::CountMatrix;
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::ops::Range;

/// A CPU-based collective backend connecting in-process peers.
///
/// Implements the **Ring All-Reduce** algorithm using `crossbeam` channels. Each peer
/// only talks to its two neighbours: it receives from `rank - 1` and sends to `rank + 1`.
pub struct CpuBackend {
    rank: usize,
    world_size: usize,
    left_rx: Receiver<Vec<f64>>, // Receive from rank - 1
    right_tx: Sender<Vec<f64>>,  // Send to rank + 1
}

impl CpuBackend {
    pub fn new(
        rank: usize,
        world_size: usize,
        left_rx: Receiver<Vec<f64>>,
        right_tx: Sender<Vec<f64>>,
    ) -> Self {
        Self {
            rank,
            world_size,
            left_rx,
            right_tx,
        }
    }

    /// Wires `world_size` peers into a ring. Element `r` of the result is rank `r`.
    ///
    /// ```rust
    /// use lda_rs::distributed::{CollectiveBackend, CpuBackend};
    ///
    /// let peers = CpuBackend::ring(3);
    /// assert_eq!(peers.len(), 3);
    /// assert_eq!(peers[2].rank(), 2);
    /// assert_eq!(peers[0].world_size(), 3);
    /// ```
    pub fn ring(world_size: usize) -> Vec<CpuBackend> {
        let (txs, mut rxs): (Vec<_>, Vec<_>) = (0..world_size).map(|_| unbounded()).unzip();
        // Rank r writes into channel r; rank r + 1 reads from it.
        rxs.rotate_right(1);

        txs.into_iter()
            .zip(rxs)
            .enumerate()
            .map(|(rank, (right_tx, left_rx))| CpuBackend::new(rank, world_size, left_rx, right_tx))
            .collect()
    }

    fn chunk_index(&self, offset: isize) -> usize {
        (self.rank as isize + offset).rem_euclid(self.world_size as isize) as usize
    }

    fn exchange(&self, outgoing: &[f64], expected_len: usize, phase: &str) -> Result<Vec<f64>> {
        self.right_tx.send(outgoing.to_vec()).map_err(|_| {
            LdaError::Collective(format!(
                "rank {}: right neighbour disconnected during {phase}",
                self.rank
            ))
        })?;
        let incoming = self.left_rx.recv().map_err(|_| {
            LdaError::Collective(format!(
                "rank {}: left neighbour disconnected during {phase}",
                self.rank
            ))
        })?;
        if incoming.len() != expected_len {
            return Err(LdaError::Collective(format!(
                "rank {}: received a chunk of {} elements during {phase}, expected {}; \
                 peers disagree on the matrix shape",
                self.rank,
                incoming.len(),
                expected_len
            )));
        }
        Ok(incoming)
    }
}

fn chunk_range(index: usize, chunk_size: usize, total: usize) -> Range<usize> {
    let start = (index * chunk_size).min(total);
    let end = (start + chunk_size).min(total);
    start..end
}

impl CollectiveBackend for CpuBackend {
    fn rank(&self) -> usize {
        self.rank
    }

    fn world_size(&self) -> usize {
        self.world_size
    }

    fn all_reduce_sum(&self, matrix: &CountMatrix) -> Result<CountMatrix> {
        let mut data = matrix.data().to_vec();
        let total_elements = data.len();
        let chunk_size = total_elements.div_ceil(self.world_size.max(1));

        // --- Phase 1: Scatter-Reduce ---
        // In each step, we send a chunk to the right and receive a chunk from the left.
        // We add the received chunk to our local buffer.
        for step in 0..self.world_size.saturating_sub(1) {
            // Rank r sends chunk (r - step) and receives chunk (r - step - 1).
            let send = chunk_range(self.chunk_index(-(step as isize)), chunk_size, total_elements);
            let recv = chunk_range(
                self.chunk_index(-(step as isize) - 1),
                chunk_size,
                total_elements,
            );

            let incoming = self.exchange(&data[send], recv.len(), "scatter-reduce")?;
            for (dst, val) in data[recv].iter_mut().zip(incoming) {
                *dst += val;
            }
        }

        // --- Phase 2: All-Gather ---
        // Now each rank has one fully reduced chunk. We need to share it with everyone.
        for step in 0..self.world_size.saturating_sub(1) {
            let send = chunk_range(
                self.chunk_index(1 - step as isize),
                chunk_size,
                total_elements,
            );
            let recv = chunk_range(self.chunk_index(-(step as isize)), chunk_size, total_elements);

            let incoming = self.exchange(&data[send], recv.len(), "all-gather")?;
            data[recv].copy_from_slice(&incoming);
        }

        CountMatrix::new(data, *matrix.shape())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_range_clamps() {
        // 5 elements over 4 ranks: chunks of 2, the last one empty.
        assert_eq!(chunk_range(0, 2, 5), 0..2);
        assert_eq!(chunk_range(2, 2, 5), 4..5);
        assert_eq!(chunk_range(3, 2, 5), 5..5);
        assert_eq!(chunk_range(1, 0, 0), 0..0);
    }

    #[test]
    fn test_single_rank_ring_is_identity() {
        let peers = CpuBackend::ring(1);
        let m = CountMatrix::new(vec![1.0, 2.0], [1, 2]).unwrap();
        assert_eq!(peers[0].all_reduce_sum(&m).unwrap(), m);
    }

    #[test]
    fn test_disconnected_peer_is_collective_error() {
        let mut peers = CpuBackend::ring(2);
        let survivor = peers.remove(0);
        drop(peers);

        let m = CountMatrix::zeros(2, 2).unwrap();
        let err = survivor.all_reduce_sum(&m);
        assert!(matches!(err, Err(LdaError::Collective(_))));
    }
}
