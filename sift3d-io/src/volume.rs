//! Volume decoding on top of the `image` crate
//!
//! A regular file is decoded as a single slice. A directory is read as a
//! stack of slices: every file the `image` crate recognises by extension is
//! decoded in lexicographic file-name order and becomes one z plane.

use image::ImageFormat;
use sift3d_core::{Error, Result, Vector3d, Volume, VolumeReader};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads 2D images and slice directories into grayscale volumes in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageVolumeReader {
    /// Voxel spacing assigned to decoded volumes
    pub units: Vector3d,
}

impl Default for ImageVolumeReader {
    fn default() -> Self {
        Self {
            units: Vector3d::new(1.0, 1.0, 1.0),
        }
    }
}

struct Slice {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl ImageVolumeReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the voxel spacing of decoded volumes
    pub fn with_units(mut self, units: Vector3d) -> Self {
        self.units = units;
        self
    }

    fn read_slice(path: &Path) -> Result<Slice> {
        let decoded = image::open(path)
            .map_err(|e| Error::Image(format!("{}: {}", path.display(), e)))?;
        let gray = decoded.to_luma32f();
        let (width, height) = gray.dimensions();
        debug!("Decoded {} x {} slice from {}", width, height, path.display());
        Ok(Slice {
            width: width as usize,
            height: height as usize,
            data: gray.into_raw(),
        })
    }

    /// Slice files in a directory, sorted by file name
    fn slice_paths(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && ImageFormat::from_path(&path).is_ok() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn read_slice_directory(dir: &Path) -> Result<Volume> {
        let paths = Self::slice_paths(dir)?;
        let Some(first) = paths.first() else {
            return Err(Error::InvalidData(format!(
                "no image slices found in {}",
                dir.display()
            )));
        };

        let first = Self::read_slice(first)?;
        let (width, height) = (first.width, first.height);
        let mut data = Vec::new();
        data.try_reserve_exact(width * height * paths.len())?;
        data.extend_from_slice(&first.data);

        for path in &paths[1..] {
            let slice = Self::read_slice(path)?;
            if slice.width != width || slice.height != height {
                return Err(Error::InvalidData(format!(
                    "slice {} is {} x {}, expected {} x {}",
                    path.display(),
                    slice.width,
                    slice.height,
                    width,
                    height
                )));
            }
            data.extend_from_slice(&slice.data);
        }

        Volume::from_data(width, height, paths.len(), data)
    }
}

impl VolumeReader for ImageVolumeReader {
    type Volume = Volume;

    fn read_volume(&self, path: &Path) -> Result<Volume> {
        let metadata = fs::metadata(path)?;
        let mut volume = if metadata.is_dir() {
            Self::read_slice_directory(path)?
        } else {
            let slice = Self::read_slice(path)?;
            Volume::from_data(slice.width, slice.height, 1, slice.data)?
        };
        volume.units = self.units;

        let (nx, ny, nz) = volume.dims();
        info!("Read {} x {} x {} volume from {}", nx, ny, nz, path.display());
        Ok(volume)
    }
}
