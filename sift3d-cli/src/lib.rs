//! Command-line SIFT3D descriptor extraction
//!
//! Reads an image volume and a CSV list of keypoint coordinates, computes a
//! descriptor at every keypoint and writes the descriptors to a file.
//!
//! ```text
//! featsift3d [OPTIONS] <IMAGE_PATH> <KEYPOINTS_PATH> <OUTPUT_DESCRIPTORS_PATH>
//! ```
//!
//! The [`pipeline`] module is independent of the concrete image, extractor
//! and writer types; [`cli`] wires in the implementations from `sift3d-io`
//! and `sift3d-algorithms`.

pub mod cli;
pub mod config;
pub mod logging;
pub mod pipeline;

pub use cli::{run, CliArgs, EXIT_FAILURE, EXIT_SUCCESS};
pub use config::{load_config, CliError, FeatConfig, LogLevel};
pub use pipeline::{ExtractionPipeline, PipelineError, Stage};
