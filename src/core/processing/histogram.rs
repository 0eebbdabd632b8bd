use ndarray::{Array1, Array2, ArrayView1};
use tracing::debug;

use crate::core::params::ChannelCriterion;
use crate::error::{Error, Result};
use crate::types::SampleMask;

/// Equal-width histogram over the finite values of one channel.
///
/// Buckets are left-inclusive and right-exclusive, except the last one which also
/// includes the upper edge. A constant channel is binned over `[v - 0.5, v + 0.5]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelHistogram {
    lo: f64,
    hi: f64,
    counts: Vec<usize>,
}

impl ChannelHistogram {
    /// Two passes: finite min/max, then counts. `None` when no value is finite.
    pub fn compute(values: ArrayView1<'_, f64>, bins: usize) -> Option<Self> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &v in values.iter().filter(|v| v.is_finite()) {
            if v < lo {
                lo = v;
            }
            if v > hi {
                hi = v;
            }
        }
        if lo > hi || bins == 0 {
            return None;
        }
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let mut hist = ChannelHistogram {
            lo,
            hi,
            counts: vec![0; bins],
        };
        for &v in values.iter() {
            if let Some(b) = hist.bucket_of(v) {
                hist.counts[b] += 1;
            }
        }
        Some(hist)
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn range(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    fn edge(&self, i: usize) -> f64 {
        if i >= self.bins() {
            self.hi
        } else {
            self.lo + (i as f64) * (self.hi - self.lo) / (self.bins() as f64)
        }
    }

    /// Bucket edges, `bins + 1` values from the lower to the upper bound.
    pub fn edges(&self) -> Vec<f64> {
        (0..=self.bins()).map(|i| self.edge(i)).collect()
    }

    /// Bucket holding `v`, or `None` for non-finite or out-of-range values.
    pub fn bucket_of(&self, v: f64) -> Option<usize> {
        if !v.is_finite() || v < self.lo || v > self.hi {
            return None;
        }
        let bins = self.bins();
        let t = (v - self.lo) / (self.hi - self.lo);
        let mut idx = ((t * bins as f64) as usize).min(bins - 1);
        // The scaled guess can land one bucket off near an edge; the edges decide.
        if v < self.edge(idx) {
            idx -= 1;
        } else if idx + 1 < bins && v >= self.edge(idx + 1) {
            idx += 1;
        }
        Some(idx)
    }

    /// The `top_k` most populated buckets. Equal counts go to the lower bucket index;
    /// empty buckets are never selected, so the set saturates at the non-empty count.
    pub fn dominant(&self, top_k: usize) -> DominantBinSet {
        let mut order: Vec<usize> = (0..self.bins()).filter(|&b| self.counts[b] > 0).collect();
        order.sort_by(|&a, &b| self.counts[b].cmp(&self.counts[a]).then(a.cmp(&b)));
        order.truncate(top_k);

        let mut selected = vec![false; self.bins()];
        for &b in &order {
            selected[b] = true;
        }
        DominantBinSet {
            buckets: order,
            selected,
        }
    }
}

/// Dominant buckets of one channel, in selection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DominantBinSet {
    buckets: Vec<usize>,
    selected: Vec<bool>,
}

impl DominantBinSet {
    pub fn buckets(&self) -> &[usize] {
        &self.buckets
    }

    pub fn contains(&self, bucket: usize) -> bool {
        self.selected.get(bucket).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

pub(crate) fn check_filter_input(
    x: &Array2<f64>,
    y: &Array1<f64>,
    criterion: &ChannelCriterion,
) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(Error::ShapeMismatch {
            what: "target vector length",
            expected: x.nrows(),
            found: y.len(),
        });
    }
    criterion.validate(x.ncols())?;
    if x.nrows() == 0 {
        return Err(Error::EmptyInput("feature matrix"));
    }
    Ok(())
}

pub(crate) fn criterion_mask(x: &Array2<f64>, criterion: &ChannelCriterion) -> SampleMask {
    let column = x.column(criterion.channel);
    let Some(hist) = ChannelHistogram::compute(column, criterion.bins) else {
        debug!("channel {}: no finite values", criterion.channel);
        return vec![false; x.nrows()];
    };
    let dominant = hist.dominant(criterion.top_k);
    let mask: SampleMask = column
        .iter()
        .map(|&v| hist.bucket_of(v).is_some_and(|b| dominant.contains(b)))
        .collect();

    debug!(
        "channel {}: range=[{:.4}, {:.4}] bins={} dominant={:?} kept={}/{}",
        criterion.channel,
        hist.lo,
        hist.hi,
        hist.bins(),
        dominant.buckets(),
        mask.iter().filter(|&&m| m).count(),
        mask.len()
    );
    mask
}

/// Mask of rows whose `channel` value falls in one of the `top_k` most populated of
/// `bins` equal-width buckets.
pub fn dominant_bin_mask(
    x: &Array2<f64>,
    y: &Array1<f64>,
    channel: usize,
    bins: usize,
    top_k: usize,
) -> Result<SampleMask> {
    let criterion = ChannelCriterion::new(channel, bins, top_k);
    check_filter_input(x, y, &criterion)?;
    Ok(criterion_mask(x, &criterion))
}
