//! 48-bit linear-congruential generator.
//!
//! Produces the same stream as the C library's `erand48` family:
//!
//! ```text
//! x(n+1) = (0x5DEECE66D * x(n) + 0xB) mod 2^48
//! u(n+1) = x(n+1) / 2^48
//! ```
//!
//! The state is a single 48-bit word. Every shard owns its own instance and no
//! generator is ever shared across threads.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

const MULTIPLIER: u64 = 0x5_DEEC_E66D;
const INCREMENT: u64 = 0xB;
const MASK: u64 = (1 << 48) - 1;
const SCALE: f64 = (1u64 << 48) as f64;

/// Low 16 bits loaded by `srand48`.
const SEED_LOW: u64 = 0x330E;

/// A deterministic stream of doubles uniformly distributed in `[0, 1)`.
///
/// ```
/// # use lda_kernels::Rand48;
/// let mut a = Rand48::new(7);
/// let mut b = Rand48::new(7);
/// assert_eq!(a.next_f64(), b.next_f64());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rand48 {
    state: u64,
}

impl Rand48 {
    /// Seeds the generator the way `srand48` does: the low 32 bits of `seed` become the high
    /// bits of the state, followed by the fixed `0x330E` word.
    pub fn new(seed: u64) -> Self {
        Self {
            state: (((seed & 0xFFFF_FFFF) << 16) | SEED_LOW) & MASK,
        }
    }

    /// Uses `state` directly as the 48-bit register.
    pub fn from_state(state: u64) -> Self {
        Self {
            state: state & MASK,
        }
    }

    /// Seeds from OS entropy mixed with the high-resolution clock.
    ///
    /// `RandomState` keys come from the OS and are bumped on every construction, so two
    /// generators created back to back on the same thread still start apart.
    pub fn from_entropy() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let mut hasher = RandomState::new().build_hasher();
        hasher.write_u128(nanos);
        Self::from_state(hasher.finish())
    }

    /// Current 48-bit register.
    pub fn state(&self) -> u64 {
        self.state
    }

    /// Advances the register and returns the new 48-bit value.
    pub fn next_u48(&mut self) -> u64 {
        self.state = MULTIPLIER
            .wrapping_mul(self.state)
            .wrapping_add(INCREMENT)
            & MASK;
        self.state
    }

    /// Uniform `f64` in `[0, 1)` with 48 bits of resolution.
    pub fn next_f64(&mut self) -> f64 {
        self.next_u48() as f64 / SCALE
    }
}

impl Default for Rand48 {
    /// The all-zero register `erand48` starts from when nobody seeds it.
    fn default() -> Self {
        Self::from_state(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_values_from_zero_state() {
        let mut rng = Rand48::default();
        // 0 * a + c
        assert_eq!(rng.next_u48(), 0xB);
        // a * 0xB + 0xB
        assert_eq!(rng.next_u48(), (MULTIPLIER * 0xB + 0xB) & MASK);
    }

    #[test]
    fn test_srand48_seeding() {
        let rng = Rand48::new(0x1234_5678);
        assert_eq!(rng.state(), 0x1234_5678_330E);

        // Only the low 32 bits of the seed are used.
        let wide = Rand48::new(0xFFFF_0000_1234_5678);
        assert_eq!(wide.state(), rng.state());
    }

    #[test]
    fn test_state_stays_within_48_bits() {
        let mut rng = Rand48::from_state(u64::MAX);
        assert_eq!(rng.state(), MASK);
        for _ in 0..1_000 {
            assert!(rng.next_u48() <= MASK);
        }
    }

    #[test]
    fn test_uniform_in_range() {
        let mut rng = Rand48::new(99);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "value {v} out of [0, 1)");
        }
    }

    #[test]
    fn test_uniform_mean_approx_half() {
        let mut rng = Rand48::new(12345);
        let n = 10_000;
        let mean = (0..n).map(|_| rng.next_f64()).sum::<f64>() / n as f64;
        assert!((mean - 0.5).abs() < 0.02, "uniform mean {mean} too far from 0.5");
    }

    #[test]
    fn test_deterministic() {
        let mut a = Rand48::new(42);
        let mut b = Rand48::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u48(), b.next_u48());
        }
    }

    #[test]
    fn test_distinct_seeds_diverge() {
        let mut a = Rand48::new(1);
        let mut b = Rand48::new(2);
        let same = (0..100).filter(|_| a.next_u48() == b.next_u48()).count();
        assert_eq!(same, 0);
    }

    #[test]
    fn test_entropy_instances_differ() {
        let a = Rand48::from_entropy();
        let b = Rand48::from_entropy();
        assert_ne!(a.state(), b.state());
    }
}
