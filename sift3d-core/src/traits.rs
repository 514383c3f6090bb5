//! Collaborator traits for the extraction pipeline
//!
//! The pipeline only talks to image decoding, descriptor extraction and
//! descriptor serialization through these traits. Implementations own any
//! native state they allocate and release it in `Drop`.

use crate::{DescriptorStore, KeypointStore, Result};
use std::path::Path;

/// Decodes an image file into an in-memory volume
pub trait VolumeReader {
    /// Decoded image type, opaque to the pipeline
    type Volume;

    /// Read the volume stored at `path`
    fn read_volume(&self, path: &Path) -> Result<Self::Volume>;
}

/// Builds one extractor context per run
pub trait ExtractorFactory {
    type Extractor: DescriptorExtractor;

    /// Construct and configure a fresh extractor context
    fn create(&self) -> Result<Self::Extractor>;
}

/// An extractor context computing descriptors at supplied keypoints
pub trait DescriptorExtractor {
    /// Volume type this extractor samples
    type Volume;

    /// Compute one descriptor per keypoint, in keypoint order, from the raw
    /// input volume.
    fn extract_raw(
        &mut self,
        volume: &Self::Volume,
        keypoints: &KeypointStore,
    ) -> Result<DescriptorStore>;
}

/// Serializes a descriptor collection
pub trait DescriptorWriter {
    /// Write `descriptors` to `path`, replacing any existing file
    fn write_descriptors(&self, path: &Path, descriptors: &DescriptorStore) -> Result<()>;

    /// Get the format name this writer produces
    fn format_name(&self) -> &'static str;
}
