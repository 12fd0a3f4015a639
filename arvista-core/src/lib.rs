//! Core data structures and traits for arvista
//!
//! This crate provides the geometry shared by the placement and tour crates
//! (poses, bounding boxes, asset metrics), the traits through which the
//! render engine, the asset loader and the platform AR session are
//! consumed, an in-memory scene graph, and the experience configuration.

pub mod point;
pub mod pose;
pub mod bounds;
pub mod traits;
pub mod scene;
pub mod camera;
pub mod picking;
pub mod config;
pub mod error;

pub use point::*;
pub use pose::*;
pub use bounds::*;
pub use traits::*;
pub use scene::*;
pub use camera::*;
pub use picking::*;
pub use config::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};
