//! Shared types used across the crate.
//! Includes the pipeline `Stage`, the `Population`/`Dataset` sample pairs, the transient
//! `SampleMask`, and `FeatureSubset` presets for channel ablations.
use clap::ValueEnum;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Boolean row selector, one entry per sample.
pub type SampleMask = Vec<bool>;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Configure,
    Load,
    Clean,
    Intersection,
    Prior,
    Blend,
    Persist,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Configure => "configure",
            Stage::Load => "load",
            Stage::Clean => "clean",
            Stage::Intersection => "intersection",
            Stage::Prior => "prior",
            Stage::Blend => "blend",
            Stage::Persist => "persist",
        };
        write!(f, "{}", s)
    }
}

fn check_rows(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(Error::ShapeMismatch {
            what: "target vector length",
            expected: x.nrows(),
            found: y.len(),
        });
    }
    Ok(())
}

fn apply_mask(x: &Array2<f64>, y: &Array1<f64>, mask: &[bool]) -> Result<(Array2<f64>, Array1<f64>)> {
    if mask.len() != x.nrows() {
        return Err(Error::ShapeMismatch {
            what: "sample mask length",
            expected: x.nrows(),
            found: mask.len(),
        });
    }
    let rows: Vec<usize> = mask
        .iter()
        .enumerate()
        .filter_map(|(i, &keep)| if keep { Some(i) } else { None })
        .collect();
    Ok((x.select(Axis(0), &rows), y.select(Axis(0), &rows)))
}

/// A filtered (X, y) pair produced by one stage. Rows of `x` and `y` are index-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    x: Array2<f64>,
    y: Array1<f64>,
}

impl Population {
    pub fn new(x: Array2<f64>, y: Array1<f64>) -> Result<Self> {
        check_rows(&x, &y)?;
        Ok(Self { x, y })
    }

    /// Rows of (`x`, `y`) whose mask entry is `true`, in their original order.
    pub fn from_mask(x: &Array2<f64>, y: &Array1<f64>, mask: &[bool]) -> Result<Self> {
        check_rows(x, y)?;
        let (x, y) = apply_mask(x, y, mask)?;
        Ok(Self { x, y })
    }

    pub fn x(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn n_channels(&self) -> usize {
        self.x.ncols()
    }

    /// Keep the rows whose mask entry is `true`, preserving their order.
    pub fn masked(&self, mask: &[bool]) -> Result<Population> {
        let (x, y) = apply_mask(&self.x, &self.y, mask)?;
        Ok(Population { x, y })
    }

    /// Gather rows by index, in the order given. Indices must be in range.
    pub(crate) fn take_rows(&self, rows: &[usize]) -> Population {
        Population {
            x: self.x.select(Axis(0), rows),
            y: self.y.select(Axis(0), rows),
        }
    }

    pub fn into_parts(self) -> (Array2<f64>, Array1<f64>) {
        (self.x, self.y)
    }
}

/// The final (X, y) pair handed to model training.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    x: Array2<f64>,
    y: Array1<f64>,
}

impl Dataset {
    pub fn new(x: Array2<f64>, y: Array1<f64>) -> Result<Self> {
        check_rows(&x, &y)?;
        Ok(Self { x, y })
    }

    pub fn x(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn n_samples(&self) -> usize {
        self.y.len()
    }

    pub fn n_channels(&self) -> usize {
        self.x.ncols()
    }

    /// Project onto the given channel indices, in order.
    pub fn select_channels(&self, channels: &[usize]) -> Result<Dataset> {
        if let Some(&bad) = channels.iter().find(|&&c| c >= self.n_channels()) {
            return Err(Error::invalid("channel", bad));
        }
        Ok(Dataset {
            x: self.x.select(Axis(1), channels),
            y: self.y.clone(),
        })
    }

    pub(crate) fn take_rows(&self, rows: &[usize]) -> Dataset {
        Dataset {
            x: self.x.select(Axis(0), rows),
            y: self.y.select(Axis(0), rows),
        }
    }

    pub fn into_parts(self) -> (Array2<f64>, Array1<f64>) {
        (self.x, self.y)
    }
}

impl From<Population> for Dataset {
    fn from(p: Population) -> Self {
        Dataset { x: p.x, y: p.y }
    }
}

/// Channel ablation presets over the 12-channel stack
/// (R, G, B, C-HH, C-HV, C-VV, L-HH, L-HV, L-VV, H, h_c, h_t).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureSubset {
    Full,
    NoH,
    NoHcHt,
    NoAllHeights,
}

impl FeatureSubset {
    const LABEL: usize = 9;
    const CANOPY_BASE: usize = 10;
    const CANOPY_TOP: usize = 11;

    pub fn dropped(&self) -> &'static [usize] {
        match self {
            FeatureSubset::Full => &[],
            FeatureSubset::NoH => &[Self::LABEL],
            FeatureSubset::NoHcHt => &[Self::CANOPY_BASE, Self::CANOPY_TOP],
            FeatureSubset::NoAllHeights => &[Self::LABEL, Self::CANOPY_BASE, Self::CANOPY_TOP],
        }
    }

    /// Channel indices kept by this preset for a stack of `n_channels`.
    pub fn channels(&self, n_channels: usize) -> Result<Vec<usize>> {
        if let Some(&bad) = self.dropped().iter().find(|&&c| c >= n_channels) {
            return Err(Error::invalid("subset", format!("{self} drops channel {bad} of {n_channels}")));
        }
        Ok((0..n_channels)
            .filter(|c| !self.dropped().contains(c))
            .collect())
    }
}

impl std::fmt::Display for FeatureSubset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureSubset::Full => write!(f, "full"),
            FeatureSubset::NoH => write!(f, "no-h"),
            FeatureSubset::NoHcHt => write!(f, "no-hc-ht"),
            FeatureSubset::NoAllHeights => write!(f, "no-all-heights"),
        }
    }
}
