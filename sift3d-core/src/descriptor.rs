//! Descriptor collection produced by an extractor

use crate::keypoint::Point3d;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// A fixed-size numeric signature computed at one keypoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Position of the source keypoint
    pub position: Point3d,
    /// Scale of the source keypoint
    pub scale: f64,
    /// Histogram values
    pub histogram: Vec<f32>,
}

impl Descriptor {
    pub fn new(position: Point3d, scale: f64, histogram: Vec<f32>) -> Self {
        Self {
            position,
            scale,
            histogram,
        }
    }

    /// Number of histogram values
    pub fn dimension(&self) -> usize {
        self.histogram.len()
    }
}

/// Descriptors in the order of the keypoints they were computed from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptorStore {
    pub descriptors: Vec<Descriptor>,
}

impl DescriptorStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
        }
    }

    /// Create a new store with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            descriptors: Vec::with_capacity(capacity),
        }
    }

    /// Get the number of descriptors
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Add a descriptor to the store
    pub fn push(&mut self, descriptor: Descriptor) {
        self.descriptors.push(descriptor);
    }

    /// Get an iterator over the descriptors
    pub fn iter(&self) -> std::slice::Iter<'_, Descriptor> {
        self.descriptors.iter()
    }

    /// Histogram length shared by every descriptor, `None` when empty or mixed
    pub fn dimension(&self) -> Option<usize> {
        let first = self.descriptors.first()?.dimension();
        self.descriptors
            .iter()
            .all(|d| d.dimension() == first)
            .then_some(first)
    }
}

impl Index<usize> for DescriptorStore {
    type Output = Descriptor;

    fn index(&self, index: usize) -> &Self::Output {
        &self.descriptors[index]
    }
}

impl<'a> IntoIterator for &'a DescriptorStore {
    type Item = &'a Descriptor;
    type IntoIter = std::slice::Iter<'a, Descriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

impl FromIterator<Descriptor> for DescriptorStore {
    fn from_iter<I: IntoIterator<Item = Descriptor>>(iter: I) -> Self {
        Self {
            descriptors: Vec::from_iter(iter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_uniform() {
        let store: DescriptorStore = (0..3)
            .map(|i| Descriptor::new(Point3d::new(i as f64, 0.0, 0.0), 1.0, vec![0.0; 8]))
            .collect();
        assert_eq!(store.len(), 3);
        assert_eq!(store.dimension(), Some(8));
    }

    #[test]
    fn test_dimension_mixed_or_empty() {
        let mut store = DescriptorStore::new();
        assert_eq!(store.dimension(), None);
        store.push(Descriptor::new(Point3d::origin(), 1.0, vec![0.0; 4]));
        store.push(Descriptor::new(Point3d::origin(), 1.0, vec![0.0; 5]));
        assert_eq!(store.dimension(), None);
    }
}
