//! Core data structures and traits for sift3d
//!
//! This crate provides the keypoint, descriptor and volume types shared by
//! the loader, the extractor and the command-line pipeline, together with
//! the collaborator traits the pipeline is written against.

pub mod keypoint;
pub mod keypoint_store;
pub mod descriptor;
pub mod volume;
pub mod traits;
pub mod error;

pub use keypoint::*;
pub use keypoint_store::*;
pub use descriptor::*;
pub use volume::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix3, Point3, Vector3};

/// Common result type for sift3d operations
pub type Result<T> = std::result::Result<T, Error>;
