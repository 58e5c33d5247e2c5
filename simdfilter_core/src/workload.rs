//! Synthetic IN-list workloads.
//!
//! The literal set is `{0, 1000, 2000, ...}`. The dense column draws from
//! three times the literal range, so about a third of its values hit; the
//! sparse one draws from a hundred times the range and mostly misses.

use rand::{Rng, SeedableRng, rngs::StdRng};

pub const STEP: i64 = 1000;
pub const DENSE_SPREAD: u64 = 3000;
pub const SPARSE_SPREAD: u64 = 100_000;

/// `{0, STEP, ..., (count - 1) * STEP}`
pub fn filter_literals(count: usize) -> Vec<i64> {
    (0..count as i64).map(|i| i * STEP).collect()
}

/// `len` multiples of [`STEP`] below `spread * STEP`.
pub fn stepped_values(len: usize, spread: u64, seed: u64) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| rng.random_range(0..spread) as i64 * STEP)
        .collect()
}

pub fn dense_values(len: usize, seed: u64) -> Vec<i64> {
    stepped_values(len, DENSE_SPREAD, seed)
}

pub fn sparse_values(len: usize, seed: u64) -> Vec<i64> {
    stepped_values(len, SPARSE_SPREAD, seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_are_stepped() {
        assert_eq!(filter_literals(4), vec![0, 1000, 2000, 3000]);
        assert!(filter_literals(0).is_empty());
    }

    #[test]
    fn values_stay_on_the_grid() {
        let values = dense_values(10_000, 7);
        assert_eq!(values.len(), 10_000);
        assert!(values.iter().all(|v| v % STEP == 0 && *v >= 0 && *v < 3_000_000));
    }

    #[test]
    fn seed_makes_workload_reproducible() {
        assert_eq!(sparse_values(64, 42), sparse_values(64, 42));
    }
}
