use clap::{Parser, Subcommand};
use std::path::PathBuf;

use biomass_prep::FeatureSubset;

#[derive(Parser)]
#[command(
    name = "biomass-prep",
    version,
    about = "Forest biomass training-set builder"
)]
pub struct CliArgs {
    /// Enable logging (DEBUG unless RUST_LOG says otherwise)
    #[arg(long, global = true, default_value_t = false)]
    pub log: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Filter, blend and persist the dataset of one or every configured region
    Build {
        /// JSON run configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Region to build
        #[arg(short, long, conflicts_with = "all")]
        region: Option<String>,

        /// Build every region in the configuration
        #[arg(long, default_value_t = false)]
        all: bool,

        /// Output directory, overriding the configuration
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Seed overriding every region's configured seed
        #[arg(long)]
        seed: Option<u64>,

        /// With --all: leave regions whose X/y files already exist untouched
        #[arg(long, default_value_t = false)]
        skip_existing: bool,

        /// With --all: keep building the remaining regions after a failure
        #[arg(long, default_value_t = false)]
        continue_on_error: bool,
    },

    /// Split a persisted dataset into train/test files for one feature subset
    Split {
        /// Directory holding {region}_X.npy and {region}_y.npy
        #[arg(short, long)]
        data_dir: PathBuf,

        #[arg(short, long)]
        region: String,

        /// Channel ablation preset
        #[arg(long, value_enum, default_value_t = FeatureSubset::Full)]
        subset: FeatureSubset,

        /// Share of samples held out for testing
        #[arg(long, default_value_t = 0.2)]
        test_fraction: f64,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Defaults to --data-dir
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}
