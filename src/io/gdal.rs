use gdal::raster::ResampleAlg;
use gdal::{Dataset, errors::GdalError as GdalCrateError};
use ndarray::{Array2, Array3, Axis, stack};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors encountered when reading rasters through GDAL
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Unsupported raster: {0}")]
    UnsupportedFormat(String),
    #[error("Band {index} out of range (raster has {bands} bands)")]
    BandOutOfRange { index: usize, bands: usize },
    #[error("Dimension mismatch: expected {0}x{1}, got {2} values")]
    DimensionMismatch(usize, usize, usize),
}

/// Grid description of a GDAL raster
#[derive(Debug, Clone, PartialEq)]
pub struct RasterInfo {
    /// Width (pixels)
    pub size_x: usize,
    /// Height (lines)
    pub size_y: usize,
    pub bands: usize,
    /// [origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height]
    pub geotransform: [f64; 6],
    /// `EPSG:nnnn` when an authority code is present, otherwise the raw WKT
    pub projection: String,
}

/// Band reader for co-registered feature and label rasters (GeoTIFF, ENVI, VRT, ...)
pub struct GdalRasterReader {
    dataset: Dataset,
    pub info: RasterInfo,
}

fn parse_epsg(wkt: &str) -> Option<String> {
    const KEY: &str = "AUTHORITY[\"EPSG\",\"";
    let start = wkt.rfind(KEY)? + KEY.len();
    let end = wkt[start..].find('"')?;
    Some(format!("EPSG:{}", &wkt[start..start + end]))
}

impl GdalRasterReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GdalError> {
        let dataset = Dataset::open(path.as_ref())?;
        let (size_x, size_y) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;
        if bands == 0 {
            return Err(GdalError::UnsupportedFormat(format!(
                "{} has no raster bands",
                path.as_ref().display()
            )));
        }
        // Identity transform for plain arrays without georeferencing
        let geotransform = dataset
            .geo_transform()
            .unwrap_or([0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        let wkt = dataset.projection();
        let projection = parse_epsg(&wkt).unwrap_or(wkt);

        debug!(
            "opened {:?}: {}x{} px, {} bands, {}",
            path.as_ref(),
            size_x,
            size_y,
            bands,
            projection
        );
        Ok(GdalRasterReader {
            dataset,
            info: RasterInfo {
                size_x: size_x as usize,
                size_y: size_y as usize,
                bands,
                geotransform,
                projection,
            },
        })
    }

    /// Read a single band (1-based index) as (height, width)
    pub fn read_band(&self, index: usize) -> Result<Array2<f64>, GdalError> {
        if index == 0 || index > self.info.bands {
            return Err(GdalError::BandOutOfRange {
                index,
                bands: self.info.bands,
            });
        }
        let band = self.dataset.rasterband(index)?;
        let window = (self.info.size_x, self.info.size_y);
        let buf = band.read_as::<f64>((0, 0), window, window, Some(ResampleAlg::NearestNeighbour))?;
        let data = buf.data().to_vec();
        let found = data.len();
        Array2::from_shape_vec((self.info.size_y, self.info.size_x), data).map_err(|_| {
            GdalError::DimensionMismatch(self.info.size_y, self.info.size_x, found)
        })
    }

    /// Read every band into a (height, width, bands) cube
    pub fn read_all_bands(&self) -> Result<Array3<f64>, GdalError> {
        let planes = (1..=self.info.bands)
            .map(|idx| self.read_band(idx))
            .collect::<Result<Vec<_>, _>>()?;
        let views: Vec<_> = planes.iter().map(|p| p.view()).collect();
        stack(Axis(2), &views).map_err(|e| GdalError::UnsupportedFormat(e.to_string()))
    }
}
