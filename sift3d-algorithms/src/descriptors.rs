//! Raw SIFT3D descriptor extraction
//!
//! Descriptors are computed directly on the input volume, without building a
//! scale-space pyramid. Around each keypoint the voxels inside a sphere of
//! radius `scale * window_factor` contribute their gradient to a 4x4x4 grid
//! of orientation histograms expressed in the keypoint's frame.

use crate::config::{ExtractorConfig, NHIST, NHIST_PER_DIM};
use crate::icosahedron::{Icosahedron, ICOS_NVERT};
use nalgebra::Vector3;
use sift3d_core::{
    Descriptor, DescriptorExtractor, DescriptorStore, Error, ExtractorFactory, Keypoint,
    KeypointStore, Result, Volume,
};
use tracing::{debug, info};

/// Number of values in one descriptor
pub const DESC_NUMEL: usize = NHIST * ICOS_NVERT;

/// Extractor context holding the configuration and orientation bins
#[derive(Debug, Clone)]
pub struct Sift3dExtractor {
    config: ExtractorConfig,
    icosahedron: Icosahedron,
}

impl Sift3dExtractor {
    /// Build an extractor, rejecting invalid configuration
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        config.validate()?;
        let icosahedron = Icosahedron::new()?;
        debug!("Created SIFT3D extractor with {:?}", config);
        Ok(Self {
            config,
            icosahedron,
        })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Compute the descriptor of a single keypoint
    pub fn describe(&self, volume: &Volume, key: &Keypoint) -> Result<Descriptor> {
        let p = key.position;
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) || !volume.contains(&p) {
            return Err(Error::Algorithm(format!(
                "keypoint ({}, {}, {}) lies outside the volume",
                p.x, p.y, p.z
            )));
        }
        if !(key.scale.is_finite() && key.scale > 0.0) {
            return Err(Error::Algorithm(format!(
                "keypoint scale must be positive, got {}",
                key.scale
            )));
        }
        let units = volume.units;
        if !units.iter().all(|u| u.is_finite() && *u > 0.0) {
            return Err(Error::Algorithm(format!(
                "voxel units must be positive, got ({}, {}, {})",
                units.x, units.y, units.z
            )));
        }

        let radius = key.scale * self.config.window_factor;
        let sigma = radius * self.config.gaussian_fraction;
        let (nx, ny, nz) = volume.dims();
        let frame = key.orientation.transpose();

        let axis_range = |center: f64, unit: f64, len: usize| {
            let extent = radius / unit;
            let lo = (center - extent).floor().max(0.0) as usize;
            let hi = ((center + extent).ceil() as usize).min(len - 1);
            lo..=hi
        };

        let mut hist = vec![0.0f32; DESC_NUMEL];
        for z in axis_range(p.z, units.z, nz) {
            for y in axis_range(p.y, units.y, ny) {
                for x in axis_range(p.x, units.x, nx) {
                    let offset = Vector3::new(
                        (x as f64 - p.x) * units.x,
                        (y as f64 - p.y) * units.y,
                        (z as f64 - p.z) * units.z,
                    );
                    let dist_sq = offset.norm_squared();
                    if dist_sq > radius * radius {
                        continue;
                    }

                    let grad = gradient(volume, x, y, z);
                    let magnitude = grad.norm();
                    if magnitude <= f32::EPSILON {
                        continue;
                    }
                    let Some(votes) = self.icosahedron.bin(&(frame * grad)) else {
                        continue;
                    };

                    let weight = (-dist_sq / (2.0 * sigma * sigma)).exp() as f32 * magnitude;
                    let local = frame * offset.cast::<f32>();
                    let cells = spatial_cells(&local, radius as f32);

                    for (cell, cell_weight) in cells.iter().flatten() {
                        for (vertex, vertex_weight) in votes {
                            hist[cell * ICOS_NVERT + vertex] +=
                                weight * cell_weight * vertex_weight;
                        }
                    }
                }
            }
        }

        normalize_truncate(&mut hist, self.config.truncation);
        Ok(Descriptor::new(p, key.scale, hist))
    }
}

impl ExtractorFactory for ExtractorConfig {
    type Extractor = Sift3dExtractor;

    fn create(&self) -> Result<Sift3dExtractor> {
        Sift3dExtractor::new(*self)
    }
}

impl DescriptorExtractor for Sift3dExtractor {
    type Volume = Volume;

    fn extract_raw(
        &mut self,
        volume: &Volume,
        keypoints: &KeypointStore,
    ) -> Result<DescriptorStore> {
        info!("Extracting {} descriptors", keypoints.len());
        let mut store = DescriptorStore::with_capacity(keypoints.len());
        for (i, key) in keypoints.iter().enumerate() {
            let descriptor = self.describe(volume, key).map_err(|e| match e {
                Error::Algorithm(msg) => Error::Algorithm(format!("keypoint {}: {}", i, msg)),
                other => other,
            })?;
            store.push(descriptor);
        }
        Ok(store)
    }
}

/// Central-difference gradient in physical units, clamped at the border
fn gradient(volume: &Volume, x: usize, y: usize, z: usize) -> Vector3<f32> {
    let (x, y, z) = (x as isize, y as isize, z as isize);
    let units = volume.units;
    let dx = volume.get_clamped(x + 1, y, z) - volume.get_clamped(x - 1, y, z);
    let dy = volume.get_clamped(x, y + 1, z) - volume.get_clamped(x, y - 1, z);
    let dz = volume.get_clamped(x, y, z + 1) - volume.get_clamped(x, y, z - 1);
    Vector3::new(
        dx / (2.0 * units.x as f32),
        dy / (2.0 * units.y as f32),
        dz / (2.0 * units.z as f32),
    )
}

/// Trilinear weights of a local offset over the spatial histogram grid.
///
/// Each axis maps `[-radius, radius]` onto cell coordinates `[-0.5, N - 0.5]`
/// so cell centres sit at integer coordinates.
fn spatial_cells(local: &Vector3<f32>, radius: f32) -> [Option<(usize, f32)>; 8] {
    let n = NHIST_PER_DIM as f32;
    let coord = local.map(|c| (c / radius + 1.0) * 0.5 * n - 0.5);
    let base = coord.map(f32::floor);
    let frac = coord - base;

    std::array::from_fn(|corner| {
        let mut index = 0usize;
        let mut weight = 1.0f32;
        for axis in 0..3 {
            let upper = (corner >> axis) & 1 == 1;
            let cell = base[axis] as i32 + upper as i32;
            if cell < 0 || cell >= NHIST_PER_DIM as i32 {
                return None;
            }
            weight *= if upper { frac[axis] } else { 1.0 - frac[axis] };
            index = index * NHIST_PER_DIM + cell as usize;
        }
        (weight > 0.0).then_some((index, weight))
    })
}

/// L2-normalize, clamp at `truncation`, then normalize again.
/// An all-zero histogram is left untouched.
fn normalize_truncate(hist: &mut [f32], truncation: f32) {
    let normalize = |hist: &mut [f32]| {
        let norm = hist.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            hist.iter_mut().for_each(|v| *v /= norm);
        }
    };
    normalize(hist);
    hist.iter_mut().for_each(|v| *v = v.min(truncation));
    normalize(hist);
}
