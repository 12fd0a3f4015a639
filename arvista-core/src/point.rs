//! Point and vector aliases

use nalgebra::{Point3, UnitQuaternion, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A unit quaternion orientation
pub type Orientation = UnitQuaternion<f32>;
