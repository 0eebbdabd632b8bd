use ndarray::{Axis, concatenate};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::info;

use crate::error::{Error, Result};
use crate::types::{Dataset, Population};

/// Number of rows drawn from a population of `available` rows: `round(fraction * available)`.
/// `fraction` must lie in `[0, 1]`.
pub fn draw_count(fraction: f64, available: usize) -> Result<usize> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(Error::invalid("fraction", fraction));
    }
    let requested = (fraction * available as f64).round() as usize;
    if requested > available {
        return Err(Error::InsufficientSamples {
            requested,
            available,
        });
    }
    Ok(requested)
}

/// Uniform draw of `fraction` of the rows, without replacement.
fn draw<R: Rng + ?Sized>(population: &Population, fraction: f64, rng: &mut R) -> Result<Population> {
    let amount = draw_count(fraction, population.len())?;
    let rows = index::sample(rng, population.len(), amount).into_vec();
    Ok(population.take_rows(&rows))
}

/// Counts of the rows drawn from each population by [`blend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlendCounts {
    pub from_a: usize,
    pub from_b: usize,
}

/// Draw `fraction_a` of `a` and `fraction_b` of `b` without replacement, stack the draws
/// (rows of `a` first) and add `N(0, noise_std)` noise to every target.
///
/// All randomness comes from `rng`, in this order: rows of `a`, rows of `b`, noise.
/// A zero `noise_std` leaves the targets untouched.
pub fn blend<R: Rng + ?Sized>(
    a: &Population,
    b: &Population,
    fraction_a: f64,
    fraction_b: f64,
    noise_std: f64,
    rng: &mut R,
) -> Result<(Dataset, BlendCounts)> {
    if a.n_channels() != b.n_channels() {
        return Err(Error::ShapeMismatch {
            what: "second population column count",
            expected: a.n_channels(),
            found: b.n_channels(),
        });
    }
    if !noise_std.is_finite() || noise_std < 0.0 {
        return Err(Error::invalid("noise_std", noise_std));
    }
    // Fail on either fraction before drawing anything.
    draw_count(fraction_a, a.len())?;
    draw_count(fraction_b, b.len())?;

    let drawn_a = draw(a, fraction_a, rng)?;
    let drawn_b = draw(b, fraction_b, rng)?;
    let counts = BlendCounts {
        from_a: drawn_a.len(),
        from_b: drawn_b.len(),
    };

    let x = concatenate(Axis(0), &[drawn_a.x().view(), drawn_b.x().view()]).map_err(|_| {
        Error::ShapeMismatch {
            what: "second population column count",
            expected: a.n_channels(),
            found: b.n_channels(),
        }
    })?;
    let mut y = concatenate(Axis(0), &[drawn_a.y().view(), drawn_b.y().view()]).map_err(|_| {
        Error::ShapeMismatch {
            what: "target vector length",
            expected: x.nrows(),
            found: drawn_a.len() + drawn_b.len(),
        }
    })?;

    if noise_std > 0.0 {
        let noise = Normal::new(0.0, noise_std).map_err(|_| Error::invalid("noise_std", noise_std))?;
        for v in y.iter_mut() {
            *v += noise.sample(rng);
        }
    }

    info!(
        "blend: {} of {} + {} of {} rows, noise_std={}",
        counts.from_a,
        a.len(),
        counts.from_b,
        b.len(),
        noise_std
    );
    Ok((Dataset::new(x, y)?, counts))
}

/// [`blend`] with a fresh generator seeded from `seed`.
pub fn blend_seeded(
    a: &Population,
    b: &Population,
    fraction_a: f64,
    fraction_b: f64,
    noise_std: f64,
    seed: u64,
) -> Result<Dataset> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    blend(a, b, fraction_a, fraction_b, noise_std, &mut rng).map(|(dataset, _)| dataset)
}
