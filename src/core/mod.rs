//! Core building blocks: validated run parameters and the processing stages
//! (layer stacking, cleaning, histogram filters, blending and splitting).
//! These are the primitives the high-level `api` module composes.
pub mod params;
pub mod processing;
