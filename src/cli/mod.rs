//! Command Line Interface (CLI) layer.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for the `build` and `split`
//! subcommands. It wires user-provided options to the library functions
//! exposed via `biomass_prep::api`.
//!
//! If you are embedding the dataset builder into another application, prefer
//! the high-level `biomass_prep::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
