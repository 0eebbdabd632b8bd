//! High-level library API: build a region's dataset in memory or from its configured
//! sources to disk, batch over every configured region, and split persisted datasets
//! into train/test files. Prefer these entrypoints over the low-level processing
//! modules when integrating the crate.
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, info, warn};

use crate::config::RunConfig;
use crate::core::params::DatasetParams;
use crate::core::processing::pipeline::{DatasetAssembler, StageCounts};
use crate::core::processing::split::train_test_split;
use crate::error::{Result, StageExt};
use crate::io::writers::npy::{DatasetPaths, read_dataset, write_named_dataset};
use crate::io::writers::report::BuildReport;
use crate::types::{Dataset, FeatureSubset, Stage};

/// Build one dataset from in-memory arrays without touching the filesystem.
pub fn prepare_dataset(
    region: &str,
    x: &Array2<f64>,
    y: &Array1<f64>,
    params: &DatasetParams,
) -> Result<(Dataset, StageCounts)> {
    DatasetAssembler::new(region, params).build(x, y)
}

/// Overrides applied on top of the configuration file for a build run.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub output_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    /// Leave regions whose X/y pair already exists untouched.
    pub skip_existing: bool,
    pub continue_on_error: bool,
}

fn output_dir(config: &RunConfig, region: &str, base_dir: &Path, options: &BuildOptions) -> Result<PathBuf> {
    match &options.output_dir {
        Some(dir) => Ok(dir.clone()),
        None => config.output_dir_for(region, base_dir),
    }
}

/// Load a configured region's rasters, build its dataset, and persist it with its report.
///
/// Relative source and output paths are resolved against `base_dir`, normally the
/// directory holding the configuration file.
pub fn prepare_region(
    config: &RunConfig,
    region: &str,
    base_dir: &Path,
    options: &BuildOptions,
) -> Result<BuildReport> {
    let region_config = config.region(region).stage(Stage::Configure)?;
    let mut params = region_config.params.clone();
    if let Some(seed) = options.seed {
        params.seed = seed;
    }
    let out = output_dir(config, region, base_dir, options)?;

    let loaded = region_config.sources.load(base_dir).stage(Stage::Load)?;
    DatasetAssembler::new(region, &params).assemble(&loaded.x, &loaded.y, &loaded.channel_names, &out)
}

/// Batch build report
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub reports: Vec<BuildReport>,
}

/// Build every configured region in name order.
/// If `continue_on_error` is set, failures are logged and counted and the remaining
/// regions still run; otherwise the first error is returned.
pub fn prepare_all_regions(config: &RunConfig, base_dir: &Path, options: &BuildOptions) -> Result<BatchReport> {
    let mut batch = BatchReport::default();
    for region in config.region_names() {
        if options.skip_existing {
            let out = output_dir(config, region, base_dir, options)?;
            if DatasetPaths::new(&out, region).exists() {
                info!("[{}] outputs exist in {:?}, skipping", region, out);
                batch.skipped += 1;
                continue;
            }
        }
        match prepare_region(config, region, base_dir, options) {
            Ok(report) => {
                batch.processed += 1;
                batch.reports.push(report);
            }
            Err(e) => {
                batch.errors += 1;
                if !options.continue_on_error {
                    return Err(e);
                }
                error!("[{}] {}", region, e);
            }
        }
    }
    if batch.errors > 0 {
        warn!("{} of {} regions failed", batch.errors, config.regions.len());
    }
    Ok(batch)
}

/// Files written by [`split_dataset`].
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutput {
    pub train: DatasetPaths,
    pub test: DatasetPaths,
    pub n_train: usize,
    pub n_test: usize,
}

/// Load `{region}_X.npy`/`{region}_y.npy` from `data_dir`, keep the subset's channels,
/// and write `{region}_{subset}_{train,test}_{X,y}.npy` into `output_dir`.
pub fn split_dataset(
    data_dir: &Path,
    region: &str,
    subset: FeatureSubset,
    test_fraction: f64,
    seed: u64,
    output_dir: &Path,
) -> Result<SplitOutput> {
    let dataset = read_dataset(data_dir, region)?;
    let channels = subset.channels(dataset.n_channels())?;
    let projected = dataset.select_channels(&channels)?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let split = train_test_split(&projected, test_fraction, &mut rng)?;

    let stem = format!("{}_{}", region, subset);
    let train = write_named_dataset(&split.train, output_dir, &format!("{}_train", stem))?;
    let test = write_named_dataset(&split.test, output_dir, &format!("{}_test", stem))?;
    info!(
        "[{}] {} split: {} train / {} test over {} channels",
        region,
        subset,
        split.train.n_samples(),
        split.test.n_samples(),
        projected.n_channels()
    );
    Ok(SplitOutput {
        train,
        test,
        n_train: split.train.n_samples(),
        n_test: split.test.n_samples(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::io::writers::npy::{read_named_dataset, write_dataset};

    #[test]
    fn split_writes_subset_files() {
        let dir = tempfile::tempdir().unwrap();
        let x = Array2::from_shape_fn((40, 12), |(i, c)| (i * 12 + c) as f64);
        let y = Array1::from_shape_fn(40, |i| i as f64);
        write_dataset(&Dataset::new(x, y).unwrap(), dir.path(), "gzl").unwrap();

        let out = split_dataset(dir.path(), "gzl", FeatureSubset::NoHcHt, 0.25, 3, dir.path()).unwrap();
        assert_eq!((out.n_train, out.n_test), (30, 10));
        assert!(out.train.x.ends_with("gzl_no-hc-ht_train_X.npy"));

        let test = read_named_dataset(dir.path(), "gzl_no-hc-ht_test").unwrap();
        assert_eq!(test.n_channels(), 10);
        for (row, &target) in test.x().outer_iter().zip(test.y()) {
            assert_eq!(row[0], target * 12.0);
        }
    }

    #[test]
    fn missing_region_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = split_dataset(dir.path(), "nowhere", FeatureSubset::Full, 0.2, 0, dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
