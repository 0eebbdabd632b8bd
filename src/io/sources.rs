use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, ArrayD, IxDyn};
use ndarray_npy::{ReadNpyError, ReadNpyExt, ReadableElement};
use serde::{Deserialize, Serialize};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tracing::{debug, info};

use crate::core::processing::stack::{RasterLayer, flatten_target, stack_layers};
use crate::error::{Error, Result};

/// On-disk encoding of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Npy,
    Tiff,
    /// Anything GDAL can open. Needs the `gdal` feature.
    Raster,
}

impl SourceFormat {
    pub fn infer(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("npy") => SourceFormat::Npy,
            Some("tif") | Some("tiff") => SourceFormat::Tiff,
            _ => SourceFormat::Raster,
        }
    }
}

fn unit_scale() -> f64 {
    1.0
}

/// One pixel-aligned input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSource {
    pub path: PathBuf,
    /// Inferred from the extension when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<SourceFormat>,
    #[serde(default = "unit_scale")]
    pub scale: f64,
    /// Expected channel count, checked after decoding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
}

impl LayerSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            format: None,
            scale: 1.0,
            channels: None,
            names: Vec::new(),
        }
    }

    pub fn format(&self) -> SourceFormat {
        self.format.unwrap_or_else(|| SourceFormat::infer(&self.path))
    }

    fn resolve(&self, base_dir: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            base_dir.join(&self.path)
        }
    }

    /// Decode, check and scale the layer. Relative paths are taken from `base_dir`.
    pub fn load(&self, base_dir: &Path) -> Result<RasterLayer> {
        if !self.scale.is_finite() {
            return Err(Error::invalid("scale", self.scale));
        }
        let path = self.resolve(base_dir);
        let array = match self.format() {
            SourceFormat::Npy => read_npy_array(&path)?,
            SourceFormat::Tiff => read_tiff_array(&path)?,
            SourceFormat::Raster => read_raster_array(&path)?,
        };
        let layer = RasterLayer::from_array(array)?;
        if let Some(expected) = self.channels {
            if layer.channels() != expected {
                return Err(Error::ShapeMismatch {
                    what: "layer channel count",
                    expected,
                    found: layer.channels(),
                });
            }
        }
        if !self.names.is_empty() && self.names.len() != layer.channels() {
            return Err(Error::ShapeMismatch {
                what: "layer name count",
                expected: layer.channels(),
                found: self.names.len(),
            });
        }
        debug!(
            "loaded {:?}: {}x{} px, {} channels",
            path,
            layer.rows,
            layer.cols,
            layer.channels()
        );
        Ok(layer.scaled(self.scale))
    }

    /// Configured names, or `{file stem}` / `{file stem}_{i}` when none are given.
    pub fn channel_names(&self, channels: usize) -> Vec<String> {
        if !self.names.is_empty() {
            return self.names.clone();
        }
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "layer".to_string());
        if channels == 1 {
            vec![stem]
        } else {
            (0..channels).map(|i| format!("{}_{}", stem, i)).collect()
        }
    }
}

/// Feature layers (stacked in order) and the label raster of one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSources {
    pub layers: Vec<LayerSource>,
    pub target: LayerSource,
}

/// Inputs of one region, flattened to samples.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRegion {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub channel_names: Vec<String>,
    /// (rows, cols) of the shared pixel grid
    pub grid: (usize, usize),
}

impl RegionSources {
    pub fn load(&self, base_dir: &Path) -> Result<LoadedRegion> {
        let mut layers = Vec::with_capacity(self.layers.len());
        let mut channel_names = Vec::new();
        for source in &self.layers {
            let layer = source.load(base_dir)?;
            channel_names.extend(source.channel_names(layer.channels()));
            layers.push(layer);
        }
        let x = stack_layers(&layers)?;
        let grid = layers
            .first()
            .map(|l| (l.rows, l.cols))
            .unwrap_or((0, 0));
        let y = flatten_target(self.target.load(base_dir)?, x.nrows())?;

        info!(
            "loaded {} layers: {} samples x {} channels on a {}x{} grid",
            layers.len(),
            x.nrows(),
            x.ncols(),
            grid.0,
            grid.1
        );
        Ok(LoadedRegion {
            x,
            y,
            channel_names,
            grid,
        })
    }
}

/// Read `path` as element type `T`, or `None` if the file holds another dtype.
fn try_read_npy<T>(path: &Path) -> Result<Option<ArrayD<f64>>>
where
    T: ReadableElement + Copy + Into<f64>,
{
    let reader = BufReader::new(File::open(path)?);
    match ArrayD::<T>::read_npy(reader) {
        Ok(array) => Ok(Some(array.mapv(Into::into))),
        Err(ReadNpyError::WrongDescriptor(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Load an `.npy` array of any common numeric dtype as `f64`.
pub fn read_npy_array(path: &Path) -> Result<ArrayD<f64>> {
    if let Some(a) = try_read_npy::<f64>(path)? {
        return Ok(a);
    }
    if let Some(a) = try_read_npy::<f32>(path)? {
        return Ok(a);
    }
    if let Some(a) = try_read_npy::<u8>(path)? {
        return Ok(a);
    }
    if let Some(a) = try_read_npy::<u16>(path)? {
        return Ok(a);
    }
    if let Some(a) = try_read_npy::<i16>(path)? {
        return Ok(a);
    }
    if let Some(a) = try_read_npy::<i32>(path)? {
        return Ok(a);
    }
    if let Some(a) = try_read_npy::<u32>(path)? {
        return Ok(a);
    }
    Err(Error::UnsupportedInput(format!(
        "{}: unsupported npy dtype",
        path.display()
    )))
}

fn widen<T: Copy + Into<f64>>(values: Vec<T>) -> Vec<f64> {
    values.into_iter().map(Into::into).collect()
}

/// Decode the first image of a TIFF into (height, width) or (height, width, samples).
pub fn read_tiff_array(path: &Path) -> Result<ArrayD<f64>> {
    let reader = BufReader::new(File::open(path)?);
    let mut decoder = Decoder::new(reader)?.with_limits(Limits::unlimited());
    let (width, height) = decoder.dimensions()?;
    let values = match decoder.read_image()? {
        DecodingResult::U8(v) => widen(v),
        DecodingResult::U16(v) => widen(v),
        DecodingResult::U32(v) => widen(v),
        DecodingResult::I8(v) => widen(v),
        DecodingResult::I16(v) => widen(v),
        DecodingResult::I32(v) => widen(v),
        DecodingResult::F32(v) => widen(v),
        DecodingResult::F64(v) => v,
        _ => {
            return Err(Error::UnsupportedInput(format!(
                "{}: unsupported TIFF sample type",
                path.display()
            )));
        }
    };
    let (rows, cols) = (height as usize, width as usize);
    let pixels = rows * cols;
    if pixels == 0 || values.len() % pixels != 0 {
        return Err(Error::ShapeMismatch {
            what: "TIFF sample count",
            expected: pixels,
            found: values.len(),
        });
    }
    let samples = values.len() / pixels;
    let shape = if samples == 1 {
        IxDyn(&[rows, cols])
    } else {
        IxDyn(&[rows, cols, samples])
    };
    ArrayD::from_shape_vec(shape, values).map_err(|e| Error::UnsupportedInput(e.to_string()))
}

#[cfg(feature = "gdal")]
pub fn read_raster_array(path: &Path) -> Result<ArrayD<f64>> {
    let reader = crate::io::gdal::GdalRasterReader::open(path)?;
    let cube = reader.read_all_bands()?;
    if cube.len_of(ndarray::Axis(2)) == 1 {
        return Ok(cube.index_axis_move(ndarray::Axis(2), 0).into_dyn());
    }
    Ok(cube.into_dyn())
}

#[cfg(not(feature = "gdal"))]
pub fn read_raster_array(path: &Path) -> Result<ArrayD<f64>> {
    Err(Error::UnsupportedInput(format!(
        "{}: raster sources need the `gdal` feature",
        path.display()
    )))
}
