use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::params::DatasetParams;
use crate::core::processing::pipeline::StageCounts;
use crate::error::Result;

/// JSON sidecar describing how a persisted dataset was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub region: String,
    pub seed: u64,
    pub params: DatasetParams,
    pub counts: StageCounts,
    pub n_channels: usize,
    #[serde(default)]
    pub channel_names: Vec<String>,
    pub tool: String,
    pub version: String,
    pub created: String,
}

impl BuildReport {
    pub fn new(
        region: &str,
        params: &DatasetParams,
        counts: StageCounts,
        n_channels: usize,
        channel_names: &[String],
    ) -> Self {
        Self {
            region: region.to_string(),
            seed: params.seed,
            params: params.clone(),
            counts,
            n_channels,
            channel_names: channel_names.to_vec(),
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            created: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Write the report through a temp file renamed into place.
pub fn write_report(report: &BuildReport, path: &Path) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".report_")
        .suffix(".json.tmp")
        .tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, report)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    info!("build report written to {:?}", path);
    Ok(())
}

pub fn read_report(path: &Path) -> Result<BuildReport> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
