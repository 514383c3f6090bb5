//! Single-channel 3D image

use crate::error::Error;
use crate::keypoint::{Point3d, Vector3d};
use crate::Result;

/// A dense `nx * ny * nz` volume of `f32` voxels, x varying fastest
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    nx: usize,
    ny: usize,
    nz: usize,
    /// Physical size of one voxel along each axis
    pub units: Vector3d,
    data: Vec<f32>,
}

impl Volume {
    /// Create a zero-filled volume with unit voxel spacing
    pub fn zeros(nx: usize, ny: usize, nz: usize) -> Result<Self> {
        let len = Self::checked_len(nx, ny, nz)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)?;
        data.resize(len, 0.0);
        Ok(Self {
            nx,
            ny,
            nz,
            units: Vector3d::new(1.0, 1.0, 1.0),
            data,
        })
    }

    /// Wrap existing voxel data, which must hold exactly `nx * ny * nz` values
    pub fn from_data(nx: usize, ny: usize, nz: usize, data: Vec<f32>) -> Result<Self> {
        let len = Self::checked_len(nx, ny, nz)?;
        if data.len() != len {
            return Err(Error::InvalidData(format!(
                "volume of {}x{}x{} needs {} voxels, got {}",
                nx,
                ny,
                nz,
                len,
                data.len()
            )));
        }
        Ok(Self {
            nx,
            ny,
            nz,
            units: Vector3d::new(1.0, 1.0, 1.0),
            data,
        })
    }

    /// Build a volume by evaluating `f(x, y, z)` at every voxel
    pub fn from_fn<F>(nx: usize, ny: usize, nz: usize, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize, usize) -> f32,
    {
        let mut volume = Self::zeros(nx, ny, nz)?;
        for z in 0..nz {
            for y in 0..ny {
                for x in 0..nx {
                    let idx = volume.index_of(x, y, z);
                    volume.data[idx] = f(x, y, z);
                }
            }
        }
        Ok(volume)
    }

    fn checked_len(nx: usize, ny: usize, nz: usize) -> Result<usize> {
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(Error::InvalidData(format!(
                "volume dimensions must be positive, got {}x{}x{}",
                nx, ny, nz
            )));
        }
        nx.checked_mul(ny)
            .and_then(|n| n.checked_mul(nz))
            .ok_or_else(|| Error::InvalidData(format!("volume {}x{}x{} is too large", nx, ny, nz)))
    }

    /// Dimensions as `(nx, ny, nz)`
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    fn index_of(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.ny + y) * self.nx + x
    }

    /// Voxel value, `None` outside the volume
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<f32> {
        if x < self.nx && y < self.ny && z < self.nz {
            Some(self.data[self.index_of(x, y, z)])
        } else {
            None
        }
    }

    /// Voxel value with coordinates clamped to the border
    pub fn get_clamped(&self, x: isize, y: isize, z: isize) -> f32 {
        let cx = x.clamp(0, self.nx as isize - 1) as usize;
        let cy = y.clamp(0, self.ny as isize - 1) as usize;
        let cz = z.clamp(0, self.nz as isize - 1) as usize;
        self.data[self.index_of(cx, cy, cz)]
    }

    /// Whether a continuous position lies inside the voxel grid
    pub fn contains(&self, p: &Point3d) -> bool {
        p.x >= 0.0
            && p.y >= 0.0
            && p.z >= 0.0
            && p.x <= (self.nx - 1) as f64
            && p.y <= (self.ny - 1) as f64
            && p.z <= (self.nz - 1) as f64
    }
}
