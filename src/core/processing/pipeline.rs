use std::path::Path;

use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::params::DatasetParams;
use crate::core::processing::blend::blend;
use crate::core::processing::clean::clean_samples;
use crate::core::processing::intersection::{intersection_filter_with, prior_filter};
use crate::error::{Error, Result, StageExt};
use crate::io::writers::npy::{DatasetPaths, write_dataset};
use crate::io::writers::report::{BuildReport, write_report};
use crate::types::{Dataset, Stage};

/// Row counts after each stage of one dataset build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageCounts {
    pub input: usize,
    pub cleaned: usize,
    pub intersection: usize,
    pub prior: usize,
    pub drawn_intersection: usize,
    pub drawn_prior: usize,
    pub output: usize,
}

/// Runs clean → {intersection, prior} → blend for one region, and optionally persists
/// the result. Both filters always see the same cleaned samples, and every random draw
/// comes from one generator seeded with `params.seed`.
pub struct DatasetAssembler<'a> {
    region: &'a str,
    params: &'a DatasetParams,
}

impl<'a> DatasetAssembler<'a> {
    pub fn new(region: &'a str, params: &'a DatasetParams) -> Self {
        Self { region, params }
    }

    pub fn region(&self) -> &str {
        self.region
    }

    /// Build the dataset in memory. Errors carry the stage that raised them.
    pub fn build(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(Dataset, StageCounts)> {
        let params = self.params;
        params.validate(x.ncols()).stage(Stage::Configure)?;
        if x.nrows() != y.len() {
            return Err(Error::ShapeMismatch {
                what: "target vector length",
                expected: x.nrows(),
                found: y.len(),
            }
            .at_stage(Stage::Load));
        }
        info!(
            "[{}] building dataset from {} samples x {} channels (seed={})",
            self.region,
            x.nrows(),
            x.ncols(),
            params.seed
        );

        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);

        let cleaned = clean_samples(x, y, &params.sentinels).stage(Stage::Clean)?;
        if cleaned.is_empty() {
            warn!("[{}] no valid samples survived cleaning", self.region);
        }

        let core = intersection_filter_with(cleaned.x(), cleaned.y(), &params.intersection.criteria())
            .stage(Stage::Intersection)?;
        let prior = prior_filter(
            cleaned.x(),
            cleaned.y(),
            params.prior.channel,
            params.prior.bins,
            params.prior.top_k,
        )
        .stage(Stage::Prior)?;

        let (dataset, drawn) = blend(
            &core,
            &prior,
            params.blend.intersection_fraction,
            params.blend.prior_fraction,
            params.noise_std,
            &mut rng,
        )
        .stage(Stage::Blend)?;

        let counts = StageCounts {
            input: x.nrows(),
            cleaned: cleaned.len(),
            intersection: core.len(),
            prior: prior.len(),
            drawn_intersection: drawn.from_a,
            drawn_prior: drawn.from_b,
            output: dataset.n_samples(),
        };
        info!("[{}] stage counts: {:?}", self.region, counts);
        Ok((dataset, counts))
    }

    /// Build, then write `{region}_X.npy`, `{region}_y.npy` and the JSON report into
    /// `output_dir`. Nothing is written unless the build succeeds, and the pair is
    /// removed again if its report cannot be written.
    pub fn assemble(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        channel_names: &[String],
        output_dir: &Path,
    ) -> Result<BuildReport> {
        let (dataset, counts) = self.build(x, y)?;

        let paths = write_dataset(&dataset, output_dir, self.region).stage(Stage::Persist)?;
        let report = BuildReport::new(self.region, self.params, counts, dataset.n_channels(), channel_names);
        if let Err(e) = write_report(&report, &DatasetPaths::report_path(output_dir, self.region)) {
            warn!("[{}] report write failed, removing {:?} and {:?}", self.region, paths.x, paths.y);
            paths.remove().stage(Stage::Persist)?;
            return Err(e.at_stage(Stage::Persist));
        }

        info!(
            "[{}] dataset saved: {} samples, {} features -> {:?}, {:?}",
            self.region,
            dataset.n_samples(),
            dataset.n_channels(),
            paths.x,
            paths.y
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::{BlendParams, IntersectionParams, PriorParams};
    use crate::error::ErrorKind;
    use rand::Rng;

    fn synthetic(seed: u64, n: usize) -> (Array2<f64>, Array1<f64>) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let x = Array2::from_shape_fn((n, 4), |(_, c)| match c {
            0 => rng.gen_range(0.0..1.0_f64),
            1 => rng.gen_range(0..5) as f64,
            2 => rng.gen_range(0.0..30.0_f64),
            _ => rng.gen_range(-20.0..0.0_f64),
        });
        let y = Array1::from_shape_fn(n, |i| if i % 50 == 0 { -1.0 } else { i as f64 });
        (x, y)
    }

    fn params() -> DatasetParams {
        DatasetParams {
            sentinels: vec![-1.0],
            intersection: IntersectionParams {
                channels: vec![0, 2],
                bins: 10,
                top_k: 5,
                overrides: Vec::new(),
            },
            prior: PriorParams {
                channel: 1,
                bins: 5,
                top_k: 2,
            },
            blend: BlendParams {
                intersection_fraction: 0.9,
                prior_fraction: 0.1,
            },
            noise_std: 0.5,
            seed: 42,
        }
    }

    #[test]
    fn counts_follow_the_stages() {
        let (x, y) = synthetic(1, 1000);
        let (dataset, counts) = DatasetAssembler::new("test", &params()).build(&x, &y).unwrap();

        assert_eq!(counts.input, 1000);
        assert_eq!(counts.cleaned, 980);
        assert!(counts.intersection <= counts.cleaned);
        assert!(counts.prior <= counts.cleaned);
        assert_eq!(counts.drawn_intersection, (0.9 * counts.intersection as f64).round() as usize);
        assert_eq!(counts.drawn_prior, (0.1 * counts.prior as f64).round() as usize);
        assert_eq!(counts.output, dataset.n_samples());
        assert_eq!(dataset.n_channels(), 4);
    }

    #[test]
    fn build_is_reproducible() {
        let (x, y) = synthetic(2, 600);
        let p = params();
        let (a, _) = DatasetAssembler::new("r", &p).build(&x, &y).unwrap();
        let (b, _) = DatasetAssembler::new("r", &p).build(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn errors_name_the_offending_stage() {
        let (x, y) = synthetic(3, 100);

        let mut p = params();
        p.prior.channel = 7;
        let err = DatasetAssembler::new("r", &p).build(&x, &y).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Configure));
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);

        let err = DatasetAssembler::new("r", &params())
            .build(&x, &Array1::zeros(99))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);

        let mut nothing_valid = y.clone();
        nothing_valid.fill(-1.0);
        let err = DatasetAssembler::new("r", &params())
            .build(&x, &nothing_valid)
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Intersection));
        assert_eq!(err.kind(), ErrorKind::EmptyInput);
    }

    #[test]
    fn failed_report_write_removes_the_pair() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(DatasetPaths::report_path(dir.path(), "r").join("occupied")).unwrap();
        let (x, y) = synthetic(5, 300);

        let err = DatasetAssembler::new("r", &params())
            .assemble(&x, &y, &[], dir.path())
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Persist));
        let paths = DatasetPaths::new(dir.path(), "r");
        assert!(!paths.x.exists());
        assert!(!paths.y.exists());
    }

    #[test]
    fn failed_build_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (x, y) = synthetic(4, 100);
        let mut p = params();
        p.blend.prior_fraction = 1.5;
        let err = DatasetAssembler::new("r", &p)
            .assemble(&x, &y, &[], dir.path())
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Configure));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
