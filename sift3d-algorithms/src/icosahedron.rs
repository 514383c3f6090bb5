//! Orientation binning on the icosahedron
//!
//! Gradient directions vote for the 12 icosahedron vertices. A direction
//! falls inside exactly one face (up to shared edges) and its vote is split
//! among that face's three vertices by barycentric weight.

use nalgebra::{Matrix3, Vector3};
use sift3d_core::{Error, Result};

/// Number of orientation bins
pub const ICOS_NVERT: usize = 12;

/// Number of icosahedron faces
pub const ICOS_NFACES: usize = 20;

/// Precomputed icosahedron for barycentric orientation binning
#[derive(Debug, Clone)]
pub struct Icosahedron {
    vertices: [Vector3<f32>; ICOS_NVERT],
    faces: Vec<[usize; 3]>,
    /// Inverse of the matrix whose columns are a face's vertices
    inverses: Vec<Matrix3<f32>>,
}

impl Icosahedron {
    pub fn new() -> Result<Self> {
        let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;
        let raw = [
            [0.0, 1.0, phi],
            [0.0, -1.0, phi],
            [0.0, 1.0, -phi],
            [0.0, -1.0, -phi],
            [1.0, phi, 0.0],
            [-1.0, phi, 0.0],
            [1.0, -phi, 0.0],
            [-1.0, -phi, 0.0],
            [phi, 0.0, 1.0],
            [-phi, 0.0, 1.0],
            [phi, 0.0, -1.0],
            [-phi, 0.0, -1.0],
        ];
        let unscaled: Vec<Vector3<f32>> = raw
            .iter()
            .map(|v| Vector3::new(v[0], v[1], v[2]))
            .collect();
        let vertices: [Vector3<f32>; ICOS_NVERT] =
            std::array::from_fn(|i| unscaled[i].normalize());

        // Unscaled neighbours are exactly 2 apart
        let adjacent =
            |i: usize, j: usize| ((unscaled[i] - unscaled[j]).norm_squared() - 4.0).abs() < 1e-3;

        let mut faces = Vec::with_capacity(ICOS_NFACES);
        for i in 0..ICOS_NVERT {
            for j in (i + 1)..ICOS_NVERT {
                if !adjacent(i, j) {
                    continue;
                }
                for k in (j + 1)..ICOS_NVERT {
                    if adjacent(i, k) && adjacent(j, k) {
                        faces.push([i, j, k]);
                    }
                }
            }
        }
        if faces.len() != ICOS_NFACES {
            return Err(Error::Algorithm(format!(
                "icosahedron construction found {} faces",
                faces.len()
            )));
        }

        let inverses = faces
            .iter()
            .map(|&[a, b, c]| {
                Matrix3::from_columns(&[vertices[a], vertices[b], vertices[c]])
                    .try_inverse()
                    .ok_or_else(|| Error::Algorithm("degenerate icosahedron face".to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            vertices,
            faces,
            inverses,
        })
    }

    pub fn vertices(&self) -> &[Vector3<f32>; ICOS_NVERT] {
        &self.vertices
    }

    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Split a unit direction into `(vertex, weight)` votes summing to one.
    ///
    /// Returns `None` for a zero or non-finite direction.
    pub fn bin(&self, direction: &Vector3<f32>) -> Option<[(usize, f32); 3]> {
        let norm = direction.norm();
        if !(norm.is_finite() && norm > f32::EPSILON) {
            return None;
        }
        let dir = direction / norm;

        // The containing face has all-positive barycentric coordinates; pick
        // the face whose smallest coordinate is largest to absorb rounding.
        let (face, lambda) = self
            .inverses
            .iter()
            .enumerate()
            .map(|(f, inv)| (f, inv * dir))
            .max_by(|(_, a), (_, b)| a.min().total_cmp(&b.min()))?;

        let lambda = lambda.map(|l| l.max(0.0));
        let sum = lambda.sum();
        if sum <= 0.0 {
            return None;
        }
        let [a, b, c] = self.faces[face];
        Some([(a, lambda[0] / sum), (b, lambda[1] / sum), (c, lambda[2] / sum)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_structure() {
        let ico = Icosahedron::new().unwrap();
        assert_eq!(ico.vertices().len(), ICOS_NVERT);
        assert_eq!(ico.faces().len(), ICOS_NFACES);
        for v in ico.vertices() {
            assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-6);
        }
        // Every vertex touches five faces
        for v in 0..ICOS_NVERT {
            let count = ico.faces().iter().filter(|f| f.contains(&v)).count();
            assert_eq!(count, 5);
        }
    }

    #[test]
    fn test_weights_are_convex() {
        let ico = Icosahedron::new().unwrap();
        let directions = [
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            Vector3::new(0.3, 0.4, -0.5),
            Vector3::new(-2.0, 1.0, 7.0),
            Vector3::new(1.0, 1.0, 1.0),
        ];
        for dir in directions {
            let votes = ico.bin(&dir).unwrap();
            let total: f32 = votes.iter().map(|(_, w)| w).sum();
            assert_relative_eq!(total, 1.0, epsilon = 1e-5);
            assert!(votes.iter().all(|(_, w)| *w >= 0.0));

            // The weighted vertices reproduce the direction up to scale
            let blended: Vector3<f32> = votes
                .iter()
                .map(|(v, w)| ico.vertices()[*v] * *w)
                .sum();
            assert_relative_eq!(blended.normalize(), dir.normalize(), epsilon = 1e-4);
        }
    }

    #[test]
    fn test_vertex_direction_gets_full_vote() {
        let ico = Icosahedron::new().unwrap();
        let target = ico.vertices()[4];
        let votes = ico.bin(&(target * 3.0)).unwrap();
        let weight: f32 = votes.iter().filter(|(v, _)| *v == 4).map(|(_, w)| w).sum();
        assert_relative_eq!(weight, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_zero_direction() {
        let ico = Icosahedron::new().unwrap();
        assert!(ico.bin(&Vector3::zeros()).is_none());
        assert!(ico.bin(&Vector3::new(f32::NAN, 0.0, 0.0)).is_none());
    }
}
