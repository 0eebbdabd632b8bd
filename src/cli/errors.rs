use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },

    #[error("{failed} of {total} regions failed to build")]
    RegionsFailed { failed: usize, total: usize },

    #[error(transparent)]
    Library(#[from] biomass_prep::Error),
}
