//! I/O operations for sift3d
//!
//! This crate reads keypoint coordinate files and image volumes, and writes
//! descriptor files. The volume reader and descriptor writer implement the
//! collaborator traits from `sift3d-core`.

pub mod keypoints_csv;
pub mod volume;
pub mod descriptors;

pub use keypoints_csv::{BlankLines, KeypointCsvOptions, KeypointCsvReader};
pub use volume::ImageVolumeReader;
pub use descriptors::{Delimiter, DescriptorCsvWriter, DescriptorWriteOptions};

use sift3d_core::{KeypointStore, Result};
use std::path::Path;

/// Read a keypoint coordinate file with default options
pub fn read_keypoints<P: AsRef<Path>>(path: P) -> Result<KeypointStore> {
    KeypointCsvReader::read_keypoints(path)
}
