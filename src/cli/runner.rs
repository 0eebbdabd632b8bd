use std::path::{Path, PathBuf};

use tracing::info;
use tracing_subscriber::EnvFilter;

use biomass_prep::{BuildOptions, FeatureSubset, RunConfig, prepare_all_regions, prepare_region, split_dataset};

use super::args::{CliArgs, Command};
use super::errors::AppError;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn config_base_dir(config: &Path) -> PathBuf {
    match config.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn build(
    config_path: &Path,
    region: Option<&str>,
    all: bool,
    options: BuildOptions,
) -> Result<(), AppError> {
    let config = RunConfig::from_path(config_path)?;
    let base_dir = config_base_dir(config_path);

    match region {
        Some(region) => {
            let report = prepare_region(&config, region, &base_dir, &options)?;
            info!(
                "[{}] {} samples x {} channels (seed={})",
                report.region, report.counts.output, report.n_channels, report.seed
            );
        }
        None if all => {
            info!("Building {} regions from {:?}", config.regions.len(), config_path);
            let batch = prepare_all_regions(&config, &base_dir, &options)?;
            info!("Batch build complete!");
            info!("Processed: {}", batch.processed);
            info!("Skipped: {}", batch.skipped);
            info!("Errors: {}", batch.errors);
            if batch.errors > 0 {
                return Err(AppError::RegionsFailed {
                    failed: batch.errors,
                    total: config.regions.len(),
                });
            }
        }
        None => {
            return Err(AppError::MissingArgument {
                arg: "--region or --all".to_string(),
            });
        }
    }
    Ok(())
}

fn split(
    data_dir: &Path,
    region: &str,
    subset: FeatureSubset,
    test_fraction: f64,
    seed: u64,
    output_dir: Option<&Path>,
) -> Result<(), AppError> {
    let out = split_dataset(
        data_dir,
        region,
        subset,
        test_fraction,
        seed,
        output_dir.unwrap_or(data_dir),
    )?;
    info!(
        "Wrote {:?} ({} rows) and {:?} ({} rows)",
        out.train.x, out.n_train, out.test.x, out.n_test
    );
    Ok(())
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        init_logging();
    }

    match args.command {
        Command::Build {
            config,
            region,
            all,
            output_dir,
            seed,
            skip_existing,
            continue_on_error,
        } => build(
            &config,
            region.as_deref(),
            all,
            BuildOptions {
                output_dir,
                seed,
                skip_existing,
                continue_on_error,
            },
        )?,
        Command::Split {
            data_dir,
            region,
            subset,
            test_fraction,
            seed,
            output_dir,
        } => split(
            &data_dir,
            &region,
            subset,
            test_fraction,
            seed,
            output_dir.as_deref(),
        )?,
    }

    Ok(())
}
