//! Seeded train/test partitioning

use crate::error::{Result, SalesError};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Row indices of a train/test partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with a seeded generator and hold out `ceil(n * test_size)`
/// rows. The same `(n, test_size, seed)` always yields the same partition.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(SalesError::Config(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    if n == 0 {
        return Err(SalesError::EmptyDataset);
    }

    let n_test = ((n as f64) * test_size).ceil() as usize;
    if n_test >= n {
        return Err(SalesError::Training(format!(
            "{} usable records are too few for a {:.0}% hold-out",
            n,
            test_size * 100.0
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(TrainTestSplit {
        train,
        test: indices,
    })
}
