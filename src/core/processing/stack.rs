use ndarray::{Array1, Array2, ArrayD, Axis, Ix2, Ix3, concatenate};
use tracing::debug;

use crate::error::{Error, Result};

/// One pixel-aligned raster layer flattened to `(pixels, channels)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterLayer {
    pub rows: usize,
    pub cols: usize,
    pub data: Array2<f64>,
}

impl RasterLayer {
    /// `(H, W)` arrays become one channel; `(H, W, C)` arrays become `C` channels.
    /// Pixels are taken in row-major order.
    pub fn from_array(array: ArrayD<f64>) -> Result<Self> {
        match array.ndim() {
            2 => {
                let grid = array
                    .into_dimensionality::<Ix2>()
                    .map_err(|e| Error::UnsupportedInput(e.to_string()))?;
                let (rows, cols) = grid.dim();
                let data = grid
                    .as_standard_layout()
                    .to_owned()
                    .into_shape((rows * cols, 1))
                    .map_err(|e| Error::UnsupportedInput(e.to_string()))?;
                Ok(Self { rows, cols, data })
            }
            3 => {
                let cube = array
                    .into_dimensionality::<Ix3>()
                    .map_err(|e| Error::UnsupportedInput(e.to_string()))?;
                let (rows, cols, channels) = cube.dim();
                let data = cube
                    .as_standard_layout()
                    .to_owned()
                    .into_shape((rows * cols, channels))
                    .map_err(|e| Error::UnsupportedInput(e.to_string()))?;
                Ok(Self { rows, cols, data })
            }
            n => Err(Error::UnsupportedInput(format!(
                "raster layers must be 2-D or 3-D, got {} dimensions",
                n
            ))),
        }
    }

    pub fn pixels(&self) -> usize {
        self.data.nrows()
    }

    pub fn channels(&self) -> usize {
        self.data.ncols()
    }

    /// Multiply every value, e.g. `1/255` for 8-bit optical bands.
    pub fn scaled(mut self, factor: f64) -> Self {
        if factor != 1.0 {
            self.data.mapv_inplace(|v| v * factor);
        }
        self
    }
}

/// Concatenate layers channel-wise into the `(N, M)` feature matrix.
pub fn stack_layers(layers: &[RasterLayer]) -> Result<Array2<f64>> {
    let Some(first) = layers.first() else {
        return Err(Error::EmptyInput("layer list"));
    };
    for layer in layers {
        if layer.pixels() != first.pixels() {
            return Err(Error::ShapeMismatch {
                what: "layer pixel count",
                expected: first.pixels(),
                found: layer.pixels(),
            });
        }
    }
    let views: Vec<_> = layers.iter().map(|l| l.data.view()).collect();
    let stacked = concatenate(Axis(1), &views).map_err(|e| Error::UnsupportedInput(e.to_string()))?;
    debug!(
        "stacked {} layers into {} samples x {} channels",
        layers.len(),
        stacked.nrows(),
        stacked.ncols()
    );
    Ok(stacked)
}

/// Flatten a single-channel target layer to `(N,)`, checking it against `pixels`.
pub fn flatten_target(layer: RasterLayer, pixels: usize) -> Result<Array1<f64>> {
    if layer.channels() != 1 {
        return Err(Error::ShapeMismatch {
            what: "target channel count",
            expected: 1,
            found: layer.channels(),
        });
    }
    if layer.pixels() != pixels {
        return Err(Error::ShapeMismatch {
            what: "target pixel count",
            expected: pixels,
            found: layer.pixels(),
        });
    }
    Ok(layer.data.column(0).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, array};

    #[test]
    fn layers_stack_in_pixel_order() {
        let optical = Array3::from_shape_fn((2, 3, 2), |(r, c, b)| (r * 3 + c) as f64 + 0.5 * b as f64);
        let label = array![[10.0, 11.0, 12.0], [13.0, 14.0, 15.0]];
        let layers = vec![
            RasterLayer::from_array(optical.into_dyn()).unwrap(),
            RasterLayer::from_array(label.into_dyn()).unwrap(),
        ];
        let x = stack_layers(&layers).unwrap();

        assert_eq!(x.dim(), (6, 3));
        assert_eq!(x.row(4).to_vec(), vec![4.0, 4.5, 14.0]);
    }

    #[test]
    fn transposed_input_is_read_row_major() {
        let grid = array![[1.0, 2.0], [3.0, 4.0]].reversed_axes();
        let layer = RasterLayer::from_array(grid.into_dyn()).unwrap();
        assert_eq!(layer.data.column(0).to_vec(), vec![1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn scale_applies_to_every_value() {
        let layer = RasterLayer::from_array(array![[255.0, 51.0]].into_dyn())
            .unwrap()
            .scaled(1.0 / 255.0);
        assert_eq!(layer.data.column(0).to_vec(), vec![1.0, 0.2]);
    }

    #[test]
    fn mismatched_layers_are_rejected() {
        let a = RasterLayer::from_array(Array2::<f64>::zeros((2, 2)).into_dyn()).unwrap();
        let b = RasterLayer::from_array(Array2::<f64>::zeros((2, 3)).into_dyn()).unwrap();
        assert!(matches!(
            stack_layers(&[a.clone(), b]).unwrap_err(),
            Error::ShapeMismatch { expected: 4, found: 6, .. }
        ));
        assert!(flatten_target(a.clone(), 5).is_err());
        assert_eq!(flatten_target(a, 4).unwrap().len(), 4);
    }

    #[test]
    fn one_dimensional_layers_are_unsupported() {
        let err = RasterLayer::from_array(Array1::<f64>::zeros(4).into_dyn()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedInput(_)));
    }
}
