//! I/O layer: configured input sources (NPY, TIFF and, with the `gdal` feature,
//! any GDAL raster), plus `writers` for the persisted dataset pair and its report.
pub mod sources;
pub use sources::{LayerSource, LoadedRegion, RegionSources, SourceFormat};

#[cfg(feature = "gdal")]
pub mod gdal;
#[cfg(feature = "gdal")]
pub use self::gdal::{GdalError, GdalRasterReader, RasterInfo};

pub mod writers;
