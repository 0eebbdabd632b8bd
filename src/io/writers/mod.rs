//! Output writers: atomic NPY dataset pairs and the JSON build report sidecar.
pub mod npy;
pub mod report;
