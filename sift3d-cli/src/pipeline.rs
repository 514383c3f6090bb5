//! Extraction pipeline
//!
//! One run reads the image, loads the keypoints, extracts descriptors and
//! writes them out, stopping at the first stage that fails. Every working
//! structure is a local of [`ExtractionPipeline::run`], so whichever way the
//! run ends each one is released exactly once.

use sift3d_core::{
    DescriptorExtractor, DescriptorWriter, Error, ExtractorFactory, VolumeReader,
};
use sift3d_io::{KeypointCsvOptions, KeypointCsvReader};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    ReadImage,
    LoadKeypoints,
    Extract,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::ReadImage => "read_image",
            Stage::LoadKeypoints => "load_keypoints",
            Stage::Extract => "extract",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

/// Failure of one pipeline stage
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to initialize SIFT3D extractor: {0}")]
    Init(#[source] Error),

    #[error("Failed to read image {}: {source}", .path.display())]
    ImageRead { path: PathBuf, source: Error },

    #[error("Failed to read keypoints from {}: {source}", .path.display())]
    KeypointLoad { path: PathBuf, source: Error },

    #[error("Failed to extract descriptors: {0}")]
    Extraction(#[source] Error),

    #[error("Failed to write descriptors to {}: {source}", .path.display())]
    Write { path: PathBuf, source: Error },
}

impl PipelineError {
    /// The stage that failed
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Init(_) => Stage::Init,
            PipelineError::ImageRead { .. } => Stage::ReadImage,
            PipelineError::KeypointLoad { .. } => Stage::LoadKeypoints,
            PipelineError::Extraction(_) => Stage::Extract,
            PipelineError::Write { .. } => Stage::Write,
        }
    }
}

/// Image reader, extractor factory and descriptor writer wired into one run
#[derive(Debug, Clone)]
pub struct ExtractionPipeline<R, F, W> {
    reader: R,
    factory: F,
    writer: W,
    keypoint_options: KeypointCsvOptions,
}

impl<R, F, W> ExtractionPipeline<R, F, W>
where
    R: VolumeReader,
    F: ExtractorFactory,
    F::Extractor: DescriptorExtractor<Volume = R::Volume>,
    W: DescriptorWriter,
{
    pub fn new(reader: R, factory: F, writer: W) -> Self {
        Self {
            reader,
            factory,
            writer,
            keypoint_options: KeypointCsvOptions::default(),
        }
    }

    /// Set how the keypoint file is parsed
    pub fn with_keypoint_options(mut self, options: KeypointCsvOptions) -> Self {
        self.keypoint_options = options;
        self
    }

    /// Extract descriptors at the keypoints in `keypoints_path` from the
    /// image at `image_path` and write them to `output_path`.
    ///
    /// Failures are returned rather than logged; reporting them is left to
    /// the caller.
    pub fn run(
        &self,
        image_path: &Path,
        keypoints_path: &Path,
        output_path: &Path,
    ) -> Result<(), PipelineError> {
        self.run_stages(image_path, keypoints_path, output_path)
            .inspect_err(|e| debug!("Run stopped at stage {}", e.stage()))
    }

    fn run_stages(
        &self,
        image_path: &Path,
        keypoints_path: &Path,
        output_path: &Path,
    ) -> Result<(), PipelineError> {
        let mut extractor = self.factory.create().map_err(PipelineError::Init)?;
        debug!("Extractor ready");

        let volume = self
            .reader
            .read_volume(image_path)
            .map_err(|source| PipelineError::ImageRead {
                path: image_path.to_path_buf(),
                source,
            })?;

        let keypoints = KeypointCsvReader::read_keypoints_with_options(
            keypoints_path,
            &self.keypoint_options,
        )
        .map_err(|source| PipelineError::KeypointLoad {
            path: keypoints_path.to_path_buf(),
            source,
        })?;
        debug!("Loaded {} keypoints", keypoints.len());

        let descriptors = extractor
            .extract_raw(&volume, &keypoints)
            .and_then(|descriptors| {
                if descriptors.len() == keypoints.len() {
                    Ok(descriptors)
                } else {
                    Err(Error::Algorithm(format!(
                        "extractor returned {} descriptors for {} keypoints",
                        descriptors.len(),
                        keypoints.len()
                    )))
                }
            })
            .map_err(PipelineError::Extraction)?;

        self.writer
            .write_descriptors(output_path, &descriptors)
            .map_err(|source| PipelineError::Write {
                path: output_path.to_path_buf(),
                source,
            })?;

        info!(
            "Wrote {} descriptors ({}) to {}",
            descriptors.len(),
            self.writer.format_name(),
            output_path.display()
        );
        Ok(())
    }
}
