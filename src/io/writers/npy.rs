use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::types::Dataset;

/// File locations of one persisted dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub x: PathBuf,
    pub y: PathBuf,
}

impl DatasetPaths {
    pub fn new(dir: &Path, stem: &str) -> Self {
        Self {
            x: dir.join(format!("{}_X.npy", stem)),
            y: dir.join(format!("{}_y.npy", stem)),
        }
    }

    pub fn report_path(dir: &Path, region: &str) -> PathBuf {
        dir.join(format!("{}_report.json", region))
    }

    pub fn exists(&self) -> bool {
        self.x.is_file() && self.y.is_file()
    }

    /// Delete X, then y. Missing files are not an error.
    pub fn remove(&self) -> Result<()> {
        remove_if_present(&self.x)?;
        remove_if_present(&self.y)
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Serialize an array into a temp file created next to its destination.
fn stage_array<T: WriteNpyExt>(array: &T, dir: &Path, name: &str) -> Result<NamedTempFile> {
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{}_", name))
        .suffix(".npy.tmp")
        .tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        array.write_npy(&mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    debug!("staged {} at {:?}", name, tmp.path());
    Ok(tmp)
}

/// Write a dataset pair under `stem` in `dir`.
///
/// Both arrays are fully written to temp files before either is renamed into place.
/// Any previous X is removed first, then y is renamed and X last, so an X file on disk
/// always has a matching y. If a rename fails, the files of this write are removed and
/// unrenamed temp files are dropped.
pub fn write_named_dataset(dataset: &Dataset, dir: &Path, stem: &str) -> Result<DatasetPaths> {
    std::fs::create_dir_all(dir)?;
    let paths = DatasetPaths::new(dir, stem);

    let tmp_x = stage_array(dataset.x(), dir, &format!("{}_X", stem))?;
    let tmp_y = stage_array(dataset.y(), dir, &format!("{}_y", stem))?;

    remove_if_present(&paths.x)?;
    tmp_y.persist(&paths.y).map_err(|e| Error::Io(e.error))?;
    if let Err(e) = tmp_x.persist(&paths.x) {
        warn!("could not move {:?} into place, removing {:?}", paths.x, paths.y);
        remove_if_present(&paths.y)?;
        return Err(Error::Io(e.error));
    }

    info!(
        "wrote {:?} ({}x{}) and {:?} ({})",
        paths.x,
        dataset.n_samples(),
        dataset.n_channels(),
        paths.y,
        dataset.n_samples()
    );
    Ok(paths)
}

/// Write `{region}_X.npy` and `{region}_y.npy` into `dir`.
pub fn write_dataset(dataset: &Dataset, dir: &Path, region: &str) -> Result<DatasetPaths> {
    write_named_dataset(dataset, dir, region)
}

/// Load a persisted pair, rejecting pairs whose row counts disagree.
pub fn read_named_dataset(dir: &Path, stem: &str) -> Result<Dataset> {
    let paths = DatasetPaths::new(dir, stem);
    let x = Array2::<f64>::read_npy(BufReader::new(File::open(&paths.x)?))?;
    let y = Array1::<f64>::read_npy(BufReader::new(File::open(&paths.y)?))?;
    Dataset::new(x, y)
}

pub fn read_dataset(dir: &Path, region: &str) -> Result<Dataset> {
    read_named_dataset(dir, region)
}
