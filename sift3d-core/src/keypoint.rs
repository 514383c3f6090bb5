//! Keypoint types and related functionality

use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A 3x3 orientation frame, rows are the local axes
pub type Frame3f = Matrix3<f32>;

/// Scale assigned to keypoints that are supplied rather than detected
pub const DEFAULT_SCALE: f64 = 1.0;

/// An anchor in a volume at which a descriptor is computed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Position in voxel coordinates
    pub position: Point3d,
    /// Scale-space octave index
    pub octave: i32,
    /// Scale, in voxels of the octave
    pub scale: f64,
    /// Local orientation frame
    pub orientation: Frame3f,
}

impl Keypoint {
    /// Create a base-octave keypoint with default scale and identity frame
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        let mut key = Self::default();
        key.position = Point3d::new(x, y, z);
        key.octave = 0;
        key.scale = DEFAULT_SCALE;
        key.set_identity_frame();
        key
    }

    /// Overwrite the orientation frame with the identity, element by element
    /// in row-major order.
    pub fn set_identity_frame(&mut self) {
        for r in 0..3 {
            for c in 0..3 {
                self.orientation[(r, c)] = if r == c { 1.0 } else { 0.0 };
            }
        }
    }

    /// Whether the orientation frame is orthonormal within `tolerance`
    pub fn has_orthonormal_frame(&self, tolerance: f32) -> bool {
        let gram = self.orientation * self.orientation.transpose();
        (gram - Frame3f::identity()).abs().max() <= tolerance
    }
}

impl Default for Keypoint {
    /// An unpopulated slot: origin, base octave, zero scale and a zeroed frame
    fn default() -> Self {
        Self {
            position: Point3d::origin(),
            octave: 0,
            scale: 0.0,
            orientation: Frame3f::zeros(),
        }
    }
}
