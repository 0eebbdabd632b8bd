use rand::Rng;
use rand::seq::SliceRandom;
use tracing::info;

use crate::error::{Error, Result};
use crate::types::Dataset;

/// Disjoint train/test partitions of one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train: Dataset,
    pub test: Dataset,
}

/// Shuffle rows with `rng` and hold out `ceil(test_fraction * N)` of them for testing.
///
/// `test_fraction` must lie strictly between 0 and 1, and both partitions must end up
/// non-empty.
pub fn train_test_split<R: Rng + ?Sized>(
    dataset: &Dataset,
    test_fraction: f64,
    rng: &mut R,
) -> Result<TrainTestSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::invalid("test_fraction", test_fraction));
    }
    let n = dataset.n_samples();
    if n == 0 {
        return Err(Error::EmptyInput("dataset"));
    }
    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test >= n {
        return Err(Error::InsufficientSamples {
            requested: n_test + 1,
            available: n,
        });
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);
    let (test_rows, train_rows) = order.split_at(n_test);

    let split = TrainTestSplit {
        train: dataset.take_rows(train_rows),
        test: dataset.take_rows(test_rows),
    };
    info!(
        "split {} samples into {} train / {} test",
        n,
        split.train.n_samples(),
        split.test.n_samples()
    );
    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ndarray::{Array1, Array2};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn indexed(n: usize) -> Dataset {
        let x = Array2::from_shape_fn((n, 2), |(i, c)| (i * 10 + c) as f64);
        let y = Array1::from_shape_fn(n, |i| i as f64);
        Dataset::new(x, y).unwrap()
    }

    #[test]
    fn partitions_are_disjoint_and_complete() {
        let d = indexed(101);
        let split = train_test_split(&d, 0.2, &mut ChaCha8Rng::seed_from_u64(7)).unwrap();

        assert_eq!(split.test.n_samples(), 21);
        assert_eq!(split.train.n_samples(), 80);

        let mut seen: Vec<usize> = split
            .train
            .y()
            .iter()
            .chain(split.test.y().iter())
            .map(|&v| v as usize)
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..101).collect::<Vec<_>>());

        for (row, &target) in split.test.x().outer_iter().zip(split.test.y()) {
            assert_eq!(row[0], target * 10.0);
        }
    }

    #[test]
    fn same_seed_same_split() {
        let d = indexed(50);
        let a = train_test_split(&d, 0.3, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();
        let b = train_test_split(&d, 0.3, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_splits_are_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(train_test_split(&indexed(10), 0.0, &mut rng).is_err());
        assert!(train_test_split(&indexed(10), 1.0, &mut rng).is_err());
        assert!(train_test_split(&indexed(10), f64::NAN, &mut rng).is_err());
        assert_eq!(
            train_test_split(&indexed(0), 0.2, &mut rng).unwrap_err().kind(),
            ErrorKind::EmptyInput
        );
        assert_eq!(
            train_test_split(&indexed(1), 0.2, &mut rng).unwrap_err().kind(),
            ErrorKind::InsufficientSamples
        );
    }
}
