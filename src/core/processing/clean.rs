use ndarray::{Array1, Array2};
use tracing::info;

use crate::error::{Error, Result};
use crate::types::{Population, SampleMask};

/// Rows where every feature and the target are finite and the target is no sentinel.
pub fn valid_row_mask(x: &Array2<f64>, y: &Array1<f64>, sentinels: &[f64]) -> Result<SampleMask> {
    if x.nrows() != y.len() {
        return Err(Error::ShapeMismatch {
            what: "target vector length",
            expected: x.nrows(),
            found: y.len(),
        });
    }
    Ok(x.outer_iter()
        .zip(y.iter())
        .map(|(row, &target)| {
            target.is_finite()
                && !sentinels.contains(&target)
                && row.iter().all(|v| v.is_finite())
        })
        .collect())
}

/// Drop invalid rows. Column layout and row order are preserved; an input without
/// any valid row yields an empty population rather than an error.
pub fn clean_samples(x: &Array2<f64>, y: &Array1<f64>, sentinels: &[f64]) -> Result<Population> {
    let mask = valid_row_mask(x, y, sentinels)?;
    let cleaned = Population::from_mask(x, y, &mask)?;
    info!(
        "clean: kept {}/{} rows ({} channels)",
        cleaned.len(),
        x.nrows(),
        x.ncols()
    );
    Ok(cleaned)
}
