#![doc = r#"
biomass-prep — training-set builder for forest biomass regression.

This crate turns a co-registered multi-sensor raster stack (optical, multi-band SAR,
canopy height) and a biomass label raster into the `(X, y)` arrays a regressor is
trained on. Samples are kept when their values fall in the most populated histogram
buckets of several channels at once (the *intersection*), blended with a small share
drawn from a single diagnostic channel's dominant buckets (the *prior*), and the
blended targets are perturbed with Gaussian noise. Every random draw comes from one
seeded generator, so a region's dataset is reproducible byte for byte.

Stability
---------
The public library API is experimental in initial releases and may evolve.

Requirements
------------
- Rust 2024 edition toolchain.
- With the `gdal` feature: GDAL development headers and runtime on your system.

Add dependency
--------------
```toml
[dependencies]
biomass-prep = { version = "0.1" }
# or, for GDAL-backed raster sources
biomass-prep = { version = "0.1", features = ["full"] }
```

Quick start: build a region from its configuration
--------------------------------------------------
```rust,no_run
use std::path::Path;
use biomass_prep::{BuildOptions, RunConfig, prepare_region};

fn main() -> biomass_prep::Result<()> {
    let config = RunConfig::from_path(Path::new("/data/run.json"))?;
    let report = prepare_region(&config, "wenchang", Path::new("/data"), &BuildOptions::default())?;

    println!(
        "{} samples ({} from the intersection, {} from the prior)",
        report.counts.output, report.counts.drawn_intersection, report.counts.drawn_prior
    );
    Ok(())
}
```

Build in memory
---------------
```rust,no_run
use ndarray::{Array1, Array2};
use biomass_prep::{DatasetParams, prepare_dataset};

fn build(x: &Array2<f64>, y: &Array1<f64>) -> biomass_prep::Result<()> {
    let mut params = DatasetParams::default();
    params.intersection.channels = vec![0, 2];
    params.prior.channel = 1;
    params.seed = 7;

    let (dataset, counts) = prepare_dataset("demo", x, y, &params)?;
    assert_eq!(counts.output, dataset.n_samples());
    Ok(())
}
```

Low-level filters
-----------------
```rust
use ndarray::array;
use biomass_prep::{dominant_bin_mask, intersection_filter};

let x = array![[0.1, 5.0], [0.2, 5.1], [0.9, 9.0], [0.15, 5.05]];
let y = array![1.0, 2.0, 3.0, 4.0];

let mask = dominant_bin_mask(&x, &y, 0, 4, 1).unwrap();
assert_eq!(mask, vec![true, true, false, true]);

let core = intersection_filter(&x, &y, &[0, 1], 4, 1).unwrap();
assert_eq!(core.len(), 3);
```

Error handling
--------------
All public functions return `biomass_prep::Result<T>`. Errors raised while assembling a
dataset carry the stage that produced them; `Error::kind()` classifies the root cause.

```rust,no_run
use ndarray::{Array1, Array2};
use biomass_prep::{DatasetParams, ErrorKind, prepare_dataset};

fn main() {
    let x = Array2::<f64>::zeros((10, 3));
    let y = Array1::<f64>::zeros(10);
    match prepare_dataset("demo", &x, &y, &DatasetParams::default()) {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::InvalidConfiguration => eprintln!("bad config: {e}"),
        Err(e) => eprintln!("{:?} failed: {e}", e.stage()),
    }
}
```

Feature flags
-------------
- `gdal`: read `raster` sources through GDAL.
- `full`: enables every optional feature.

Useful modules
--------------
- [`api`] — high-level entry points (build, batch, split).
- [`core`] — parameters and the processing stages.
- [`io`] — input sources and dataset/report writers.
- [`config`] — JSON run configuration.
- [`error`] — crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use config::{RegionConfig, RunConfig};
pub use core::params::{BlendParams, ChannelCriterion, DatasetParams, IntersectionParams, PriorParams};
pub use error::{Error, ErrorKind, Result};
pub use types::{Dataset, FeatureSubset, Population, SampleMask, Stage};

// Processing stages
pub use core::processing::{
    BlendCounts, ChannelHistogram, DatasetAssembler, DominantBinSet, StageCounts, TrainTestSplit,
    blend, blend_seeded, clean_samples, dominant_bin_mask, intersection_filter,
    intersection_filter_with, prior_filter, train_test_split,
};

// Sources and writers
pub use io::sources::{LayerSource, RegionSources, SourceFormat};
pub use io::writers::npy::{DatasetPaths, read_dataset, write_dataset};
pub use io::writers::report::BuildReport;

// High-level API re-exports
pub use api::{
    BatchReport, BuildOptions, SplitOutput, prepare_all_regions, prepare_dataset, prepare_region,
    split_dataset,
};
