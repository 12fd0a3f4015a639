//! Rigid poses exchanged with the platform and the render engine

use nalgebra::{Isometry3, Matrix3, Matrix4, Rotation3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use crate::point::{Orientation, Point3f, Vector3f};

/// Smallest determinant / column length accepted for a rotation block
const DEGENERATE_EPSILON: f32 = 1e-6;

/// Max deviation of the normalized rotation block from orthonormal
const ORTHONORMAL_TOLERANCE: f32 = 1e-3;

/// A position plus orientation in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point3f,
    pub orientation: Orientation,
}

impl Pose {
    /// Create a pose from its parts
    pub fn new(position: Point3f, orientation: Orientation) -> Self {
        Self { position, orientation }
    }

    /// The pose at the origin with no rotation
    pub fn identity() -> Self {
        Self {
            position: Point3f::origin(),
            orientation: UnitQuaternion::identity(),
        }
    }

    /// Create a translation-only pose
    pub fn from_position(position: Point3f) -> Self {
        Self {
            position,
            orientation: UnitQuaternion::identity(),
        }
    }

    /// Decode a column-major homogeneous matrix as handed out by the platform.
    ///
    /// Returns `None` for matrices that do not describe a usable pose: any
    /// non-finite entry, a projective bottom row, or a rotation block that is
    /// singular, mirrored or sheared. Uniform or per-axis scale baked into
    /// the rotation block is stripped.
    pub fn from_matrix(matrix: &Matrix4<f32>) -> Option<Self> {
        if matrix.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let bottom = matrix.fixed_view::<1, 4>(3, 0);
        if bottom[0].abs() > DEGENERATE_EPSILON
            || bottom[1].abs() > DEGENERATE_EPSILON
            || bottom[2].abs() > DEGENERATE_EPSILON
            || (bottom[3] - 1.0).abs() > DEGENERATE_EPSILON
        {
            return None;
        }

        let mut basis: Matrix3<f32> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        if basis.determinant() <= DEGENERATE_EPSILON {
            return None;
        }
        for i in 0..3 {
            let norm = basis.column(i).norm();
            if norm < DEGENERATE_EPSILON {
                return None;
            }
            basis.column_mut(i).unscale_mut(norm);
        }
        if (basis.transpose() * basis - Matrix3::identity()).norm() > ORTHONORMAL_TOLERANCE {
            return None;
        }

        let rotation = Rotation3::from_matrix(&basis);
        let position = Point3f::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]);

        Some(Self {
            position,
            orientation: UnitQuaternion::from_rotation_matrix(&rotation),
        })
    }

    /// Homogeneous matrix of this pose
    pub fn to_homogeneous(&self) -> Matrix4<f32> {
        self.to_isometry().to_homogeneous()
    }

    /// Homogeneous matrix of this pose with a uniform scale applied first
    pub fn to_homogeneous_scaled(&self, scale: f32) -> Matrix4<f32> {
        self.to_homogeneous() * Matrix4::new_scaling(scale)
    }

    /// Convert to an isometry
    pub fn to_isometry(&self) -> Isometry3<f32> {
        Isometry3::from_parts(Translation3::from(self.position.coords), self.orientation)
    }

    /// Apply this pose to a vector expressed in the pose's local frame
    pub fn transform_vector(&self, vector: &Vector3f) -> Vector3f {
        self.orientation * vector
    }

    /// Whether every component is finite
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.orientation.coords.iter().all(|v| v.is_finite())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Isometry3<f32>> for Pose {
    fn from(isometry: Isometry3<f32>) -> Self {
        Self {
            position: isometry.translation.vector.into(),
            orientation: isometry.rotation,
        }
    }
}
