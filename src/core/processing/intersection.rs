use ndarray::{Array1, Array2};
use tracing::info;

use crate::core::params::ChannelCriterion;
use crate::core::processing::histogram::{check_filter_input, criterion_mask};
use crate::error::{Error, Result};
use crate::types::{Population, SampleMask};

/// Logical AND of the per-channel dominant-bin masks. All criteria are validated
/// before any histogram is computed.
pub fn intersection_mask(
    x: &Array2<f64>,
    y: &Array1<f64>,
    criteria: &[ChannelCriterion],
) -> Result<SampleMask> {
    if criteria.is_empty() {
        return Err(Error::invalid("channels", "[]"));
    }
    for criterion in criteria {
        check_filter_input(x, y, criterion)?;
    }

    let mut mask = vec![true; x.nrows()];
    for criterion in criteria {
        let channel_mask = criterion_mask(x, criterion);
        for (keep, hit) in mask.iter_mut().zip(channel_mask) {
            *keep &= hit;
        }
    }
    Ok(mask)
}

/// Rows that are dominant in every listed channel, each channel with its own criterion.
pub fn intersection_filter_with(
    x: &Array2<f64>,
    y: &Array1<f64>,
    criteria: &[ChannelCriterion],
) -> Result<Population> {
    let mask = intersection_mask(x, y, criteria)?;
    let population = Population::from_mask(x, y, &mask)?;
    info!(
        "intersection over channels {:?}: kept {}/{} rows",
        criteria.iter().map(|c| c.channel).collect::<Vec<_>>(),
        population.len(),
        x.nrows()
    );
    Ok(population)
}

/// Rows that are dominant in every channel of `channels`, sharing `bins` and `top_k`.
pub fn intersection_filter(
    x: &Array2<f64>,
    y: &Array1<f64>,
    channels: &[usize],
    bins: usize,
    top_k: usize,
) -> Result<Population> {
    let criteria: Vec<ChannelCriterion> = channels
        .iter()
        .map(|&c| ChannelCriterion::new(c, bins, top_k))
        .collect();
    intersection_filter_with(x, y, &criteria)
}

/// Broader single-channel population used to reinject coverage into the blend.
pub fn prior_filter(
    x: &Array2<f64>,
    y: &Array1<f64>,
    channel: usize,
    bins: usize,
    top_k: usize,
) -> Result<Population> {
    let criterion = ChannelCriterion::new(channel, bins, top_k);
    let mask = intersection_mask(x, y, &[criterion])?;
    let population = Population::from_mask(x, y, &mask)?;
    info!(
        "prior on channel {}: kept {}/{} rows",
        channel,
        population.len(),
        x.nrows()
    );
    Ok(population)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::processing::histogram::dominant_bin_mask;
    use crate::error::ErrorKind;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_stack(seed: u64, n: usize) -> (Array2<f64>, Array1<f64>) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let x = Array2::from_shape_fn((n, 3), |(_, c)| match c {
            0 => rng.gen_range(0.0..1.0_f64),
            1 => rng.gen_range(0.0..1.0_f64).powi(3) * 50.0,
            _ => rng.gen_range(0..7) as f64,
        });
        let y = Array1::from_shape_fn(n, |i| i as f64);
        (x, y)
    }

    fn is_subset(inner: &[bool], outer: &[bool]) -> bool {
        inner.iter().zip(outer).all(|(&i, &o)| !i || o)
    }

    #[test]
    fn single_channel_matches_dominant_bin_mask() {
        for seed in 0..5 {
            let (x, y) = random_stack(seed, 400);
            let single = intersection_mask(&x, &y, &[ChannelCriterion::new(1, 12, 3)]).unwrap();
            assert_eq!(single, dominant_bin_mask(&x, &y, 1, 12, 3).unwrap());
        }
    }

    #[test]
    fn intersection_is_subset_of_each_channel() {
        for seed in 0..5 {
            let (x, y) = random_stack(seed, 500);
            let a = dominant_bin_mask(&x, &y, 0, 10, 4).unwrap();
            let b = dominant_bin_mask(&x, &y, 2, 10, 2).unwrap();
            let both = intersection_mask(
                &x,
                &y,
                &[ChannelCriterion::new(0, 10, 4), ChannelCriterion::new(2, 10, 2)],
            )
            .unwrap();
            assert!(is_subset(&both, &a));
            assert!(is_subset(&both, &b));
            let expected: Vec<bool> = a.iter().zip(&b).map(|(&p, &q)| p && q).collect();
            assert_eq!(both, expected);
        }
    }

    #[test]
    fn filter_returns_aligned_rows() {
        let (x, y) = random_stack(3, 300);
        let pop = intersection_filter(&x, &y, &[0, 2], 8, 3).unwrap();
        for (row, &target) in pop.x().outer_iter().zip(pop.y().iter()) {
            let original = x.row(target as usize);
            assert_eq!(row, original);
        }
    }

    #[test]
    fn disjoint_criteria_give_empty_population() {
        // channel 0 is dominant in rows 0..4, channel 1 in rows 4..9
        let x = ndarray::array![
            [0.0, 0.0],
            [0.0, 0.0],
            [0.0, 0.0],
            [0.0, 0.0],
            [0.5, 1.0],
            [0.5, 1.0],
            [0.5, 1.0],
            [1.0, 1.0],
            [1.0, 1.0],
            [1.0, 0.5],
        ];
        let y = Array1::zeros(10);
        let pop = intersection_filter(&x, &y, &[0, 1], 3, 1).unwrap();
        assert!(pop.is_empty());
        assert_eq!(pop.n_channels(), 2);
    }

    #[test]
    fn prior_is_single_channel_intersection() {
        let (x, y) = random_stack(9, 250);
        let prior = prior_filter(&x, &y, 2, 100, 3).unwrap();
        let single = intersection_filter(&x, &y, &[2], 100, 3).unwrap();
        assert_eq!(prior, single);
    }

    #[test]
    fn empty_channel_list_and_unknown_channel_are_rejected() {
        let (x, y) = random_stack(1, 20);
        let err = intersection_filter(&x, &y, &[], 10, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        let err = intersection_filter(&x, &y, &[0, 3], 10, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }
}
