//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, NPY, TIFF, config and (optionally) GDAL errors, and provides
//! the semantic variants raised by the filtering and sampling stages. Errors raised while
//! assembling a dataset are wrapped with the [`Stage`] that produced them.
use thiserror::Error;

use crate::types::Stage;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("NPY read error: {0}")]
    NpyRead(#[from] ndarray_npy::ReadNpyError),

    #[error("NPY write error: {0}")]
    NpyWrite(#[from] ndarray_npy::WriteNpyError),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] crate::io::gdal::GdalError),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Shape mismatch: {what} is {found}, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Empty input: {0} has no rows")]
    EmptyInput(&'static str),

    #[error("Insufficient samples: requested {requested} rows from a population of {available}")]
    InsufficientSamples { requested: usize, available: usize },

    #[error("Invalid configuration: {field}={value}")]
    InvalidConfiguration { field: &'static str, value: String },

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },
}

/// Coarse classification of an [`Error`], looking through stage wrappers.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    ShapeMismatch,
    EmptyInput,
    InsufficientSamples,
    InvalidConfiguration,
    Io,
    Input,
}

impl Error {
    pub fn invalid<V: std::fmt::Display>(field: &'static str, value: V) -> Self {
        Error::InvalidConfiguration {
            field,
            value: value.to_string(),
        }
    }

    /// Attach the pipeline stage. An error that already carries a stage keeps it.
    pub fn at_stage(self, stage: Stage) -> Self {
        match self {
            Error::Stage { .. } => self,
            other => Error::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Stage that raised this error, if it was produced inside the assembler.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The error underneath any stage wrapper.
    pub fn root(&self) -> &Error {
        match self {
            Error::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            Error::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            Error::EmptyInput(_) => ErrorKind::EmptyInput,
            Error::InsufficientSamples { .. } => ErrorKind::InsufficientSamples,
            Error::InvalidConfiguration { .. } | Error::UnknownRegion(_) | Error::Config(_) => {
                ErrorKind::InvalidConfiguration
            }
            Error::Io(_) | Error::NpyWrite(_) => ErrorKind::Io,
            _ => ErrorKind::Input,
        }
    }
}

/// `Result` helper for tagging failures with the stage that produced them.
pub trait StageExt<T> {
    fn stage(self, stage: Stage) -> Result<T>;
}

impl<T> StageExt<T> for Result<T> {
    fn stage(self, stage: Stage) -> Result<T> {
        self.map_err(|e| e.at_stage(stage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_wrapping_keeps_innermost_stage_and_kind() {
        let err = Error::InsufficientSamples {
            requested: 10,
            available: 3,
        }
        .at_stage(Stage::Blend)
        .at_stage(Stage::Persist);

        assert_eq!(err.stage(), Some(Stage::Blend));
        assert_eq!(err.kind(), ErrorKind::InsufficientSamples);
        assert!(err.to_string().contains("blend"));
    }

    #[test]
    fn unwrapped_error_has_no_stage() {
        let err = Error::EmptyInput("feature matrix");
        assert_eq!(err.stage(), None);
        assert_eq!(err.kind(), ErrorKind::EmptyInput);
    }
}
