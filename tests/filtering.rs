use std::collections::HashSet;

use approx::assert_abs_diff_eq;
use biomass_prep::{
    DatasetParams, Population, blend, clean_samples, dominant_bin_mask, intersection_filter,
    prepare_dataset, prior_filter,
};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Channel 0 sits in buckets 2, 5 and 7 of [0, 10]; channel 1 is uniform on [0, 1].
/// Rows 0 and 1 pin both histogram ranges.
fn concentrated_and_uniform(seed: u64) -> (Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n = 1000;
    let mut x = Array2::<f64>::zeros((n, 2));
    for i in 0..n {
        let (c0, c1) = match i {
            0 => (0.0, 0.0),
            1 => (10.0, 1.0),
            _ => {
                let bucket = [2.0, 5.0, 7.0][i % 3];
                (bucket + rng.gen_range(0.05..0.95), rng.gen_range(0.0..1.0))
            }
        };
        x[[i, 0]] = c0;
        x[[i, 1]] = c1;
    }
    let y = Array1::from_shape_fn(n, |i| 50.0 + i as f64);
    (x, y)
}

#[test]
fn intersection_keeps_about_a_third_of_a_uniform_channel() {
    let (x, y) = concentrated_and_uniform(2024);

    let concentrated = dominant_bin_mask(&x, &y, 0, 10, 3).unwrap();
    assert_eq!(concentrated.iter().filter(|&&m| m).count(), 998);

    let core = intersection_filter(&x, &y, &[0, 1], 10, 3).unwrap();
    assert!(
        (240..=420).contains(&core.len()),
        "kept {} of 1000 rows",
        core.len()
    );
    for v in core.x().column(0) {
        assert!([2.0, 5.0, 7.0].contains(&v.floor()), "row outside dominant buckets: {v}");
    }
}

#[test]
fn intersection_is_a_subset_of_each_channel_filter() {
    let (x, y) = concentrated_and_uniform(5);
    let rows = |p: &Population| -> HashSet<u64> { p.y().iter().map(|v| *v as u64).collect() };

    let both = rows(&intersection_filter(&x, &y, &[0, 1], 10, 3).unwrap());
    let only_0 = rows(&prior_filter(&x, &y, 0, 10, 3).unwrap());
    let only_1 = rows(&prior_filter(&x, &y, 1, 10, 3).unwrap());

    assert!(both.is_subset(&only_0));
    assert!(both.is_subset(&only_1));
    assert_eq!(both, only_0.intersection(&only_1).copied().collect());
}

#[test]
fn noise_free_full_blend_reproduces_the_population() {
    let (x, y) = concentrated_and_uniform(9);
    let cleaned = clean_samples(&x, &y, &[]).unwrap();
    let empty = cleaned.masked(&vec![false; cleaned.len()]).unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let (dataset, counts) = blend(&cleaned, &empty, 1.0, 0.0, 0.0, &mut rng).unwrap();
    assert_eq!((counts.from_a, counts.from_b), (1000, 0));

    let mut drawn: Vec<f64> = dataset.y().to_vec();
    drawn.sort_by(f64::total_cmp);
    assert_eq!(drawn, y.to_vec());
    for (row, target) in dataset.x().outer_iter().zip(dataset.y()) {
        let i = (*target - 50.0) as usize;
        assert_abs_diff_eq!(row[0], x[[i, 0]]);
        assert_abs_diff_eq!(row[1], x[[i, 1]]);
    }
}

#[test]
fn seeds_control_the_assembled_dataset() {
    let (x, y) = concentrated_and_uniform(77);
    let mut params = DatasetParams::default();
    params.intersection.channels = vec![0, 1];
    params.intersection.bins = 10;
    params.intersection.top_k = 3;
    params.prior.channel = 1;
    params.prior.bins = 10;
    params.prior.top_k = 5;

    let (a, counts_a) = prepare_dataset("r", &x, &y, &params).unwrap();
    let (b, counts_b) = prepare_dataset("r", &x, &y, &params).unwrap();
    assert_eq!(a, b);
    assert_eq!(counts_a, counts_b);

    params.seed += 1;
    let (c, counts_c) = prepare_dataset("r", &x, &y, &params).unwrap();
    assert_eq!(counts_a, counts_c);
    assert_eq!(a.x().dim(), c.x().dim());
    assert_ne!(a.y(), c.y());
}
