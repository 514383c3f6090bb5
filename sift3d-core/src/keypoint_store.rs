//! Keypoint collection

use crate::error::Error;
use crate::keypoint::Keypoint;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// An owned, contiguous collection of keypoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeypointStore {
    pub keypoints: Vec<Keypoint>,
}

impl KeypointStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            keypoints: Vec::new(),
        }
    }

    /// Create a store from a vector of keypoints
    pub fn from_keypoints(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    /// Size an empty store to exactly `len` default-initialized slots.
    ///
    /// The store must be empty: a populated store is never resized.
    pub fn resize(&mut self, len: usize) -> Result<()> {
        if !self.keypoints.is_empty() {
            return Err(Error::InvalidData(format!(
                "cannot resize a populated keypoint store ({} keypoints)",
                self.keypoints.len()
            )));
        }
        self.keypoints.try_reserve_exact(len)?;
        self.keypoints.resize(len, Keypoint::default());
        Ok(())
    }

    /// Get the number of keypoints
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn as_slice(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn as_mut_slice(&mut self) -> &mut [Keypoint] {
        &mut self.keypoints
    }

    /// Get an iterator over the keypoints
    pub fn iter(&self) -> std::slice::Iter<'_, Keypoint> {
        self.keypoints.iter()
    }
}

impl Index<usize> for KeypointStore {
    type Output = Keypoint;

    fn index(&self, index: usize) -> &Self::Output {
        &self.keypoints[index]
    }
}

impl IndexMut<usize> for KeypointStore {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.keypoints[index]
    }
}

impl IntoIterator for KeypointStore {
    type Item = Keypoint;
    type IntoIter = std::vec::IntoIter<Keypoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.keypoints.into_iter()
    }
}

impl<'a> IntoIterator for &'a KeypointStore {
    type Item = &'a Keypoint;
    type IntoIter = std::slice::Iter<'a, Keypoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.keypoints.iter()
    }
}

impl FromIterator<Keypoint> for KeypointStore {
    fn from_iter<I: IntoIterator<Item = Keypoint>>(iter: I) -> Self {
        Self {
            keypoints: Vec::from_iter(iter),
        }
    }
}
