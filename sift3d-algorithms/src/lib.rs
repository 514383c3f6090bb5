//! # SIFT3D Algorithms
//!
//! Descriptor extraction for volumetric images.
//!
//! This crate provides the native extractor context used by the command-line
//! pipeline: raw SIFT3D-style descriptors computed at supplied keypoints,
//! with orientation histograms binned on the icosahedron.

pub mod config;
pub mod icosahedron;
pub mod descriptors;

// Re-export commonly used items
pub use config::*;
pub use icosahedron::*;
pub use descriptors::*;
