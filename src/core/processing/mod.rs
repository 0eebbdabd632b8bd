//! Processing stages for dataset assembly.
pub mod blend;
pub mod clean;
pub mod histogram;
pub mod intersection;
pub mod pipeline;
pub mod split;
pub mod stack;

pub use blend::{BlendCounts, blend, blend_seeded};
pub use clean::{clean_samples, valid_row_mask};
pub use histogram::{ChannelHistogram, DominantBinSet, dominant_bin_mask};
pub use intersection::{intersection_filter, intersection_filter_with, intersection_mask, prior_filter};
pub use pipeline::{DatasetAssembler, StageCounts};
pub use split::{TrainTestSplit, train_test_split};
pub use stack::{RasterLayer, flatten_target, stack_layers};
