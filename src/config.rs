//! JSON run configuration: where each region's rasters live and how its dataset is built.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::params::DatasetParams;
use crate::error::{Error, Result};
use crate::io::sources::RegionSources;

fn default_output_dir() -> PathBuf {
    PathBuf::from("data")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub sources: RegionSources,
    #[serde(default)]
    pub params: DatasetParams,
    /// Overrides the run-level output directory for this region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    pub regions: BTreeMap<String, RegionConfig>,
}

impl RunConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        debug!(
            "loaded config {:?} with regions {:?}",
            path,
            config.regions.keys().collect::<Vec<_>>()
        );
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn region(&self, name: &str) -> Result<&RegionConfig> {
        self.regions
            .get(name)
            .ok_or_else(|| Error::UnknownRegion(name.to_string()))
    }

    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    /// Output directory for `region`, relative paths resolved against `base_dir`.
    pub fn output_dir_for(&self, region: &str, base_dir: &Path) -> Result<PathBuf> {
        let dir = self
            .region(region)?
            .output_dir
            .as_ref()
            .unwrap_or(&self.output_dir);
        Ok(if dir.is_absolute() {
            dir.clone()
        } else {
            base_dir.join(dir)
        })
    }
}
