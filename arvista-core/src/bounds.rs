//! Axis-aligned bounding volumes and the per-asset metrics derived from them

use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

use crate::point::{Point3f, Vector3f};
use crate::{Error, Result};

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Point3f,
    pub max: Point3f,
}

impl Aabb {
    /// Create a box from two corners, ordering the components
    pub fn new(a: Point3f, b: Point3f) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Box centred on `center` with the given half extents
    pub fn from_center_half_extents(center: Point3f, half_extents: Vector3f) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Tightest box around a set of points
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3f>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = Self { min: first, max: first };
        for p in iter {
            bounds.min = bounds.min.inf(p);
            bounds.max = bounds.max.sup(p);
        }
        Some(bounds)
    }

    /// Smallest box containing both
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Geometric centre
    pub fn center(&self) -> Point3f {
        nalgebra::center(&self.min, &self.max)
    }

    /// Edge lengths along each axis
    pub fn size(&self) -> Vector3f {
        self.max - self.min
    }

    /// Longest edge
    pub fn max_dimension(&self) -> f32 {
        self.size().max()
    }

    /// The eight corners
    pub fn corners(&self) -> [Point3f; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3f::new(a.x, a.y, a.z),
            Point3f::new(b.x, a.y, a.z),
            Point3f::new(a.x, b.y, a.z),
            Point3f::new(b.x, b.y, a.z),
            Point3f::new(a.x, a.y, b.z),
            Point3f::new(b.x, a.y, b.z),
            Point3f::new(a.x, b.y, b.z),
            Point3f::new(b.x, b.y, b.z),
        ]
    }

    /// Axis-aligned box around this box after an affine transform
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Self {
        let corners = self.corners().map(|c| matrix.transform_point(&c));
        // eight corners, never empty
        Self::from_points(corners.iter()).unwrap_or(*self)
    }

    /// Whether all coordinates are finite and min <= max
    pub fn is_valid(&self) -> bool {
        self.min.iter().chain(self.max.iter()).all(|v| v.is_finite())
            && self.min.x <= self.max.x
            && self.min.y <= self.max.y
            && self.min.z <= self.max.z
    }
}

/// Scale-relevant facts about a loaded asset, captured once before any
/// placement scaling is applied and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetMetrics {
    center: Point3f,
    max_dimension: f32,
}

impl AssetMetrics {
    /// Capture the metrics of an asset's pre-scale bounding box
    pub fn from_bounds(bounds: &Aabb) -> Result<Self> {
        if !bounds.is_valid() {
            return Err(Error::InvalidAsset(format!(
                "bounding box is not finite: {:?}",
                bounds
            )));
        }
        let max_dimension = bounds.max_dimension();
        if max_dimension <= 0.0 {
            return Err(Error::InvalidAsset(
                "bounding box has zero extent".to_string(),
            ));
        }
        Ok(Self {
            center: bounds.center(),
            max_dimension,
        })
    }

    /// Geometric centre of the asset in its own coordinates
    pub fn center(&self) -> Point3f {
        self.center
    }

    /// Longest bounding-box edge before any placement scale
    pub fn max_dimension(&self) -> f32 {
        self.max_dimension
    }

    /// Uniform scale that makes the asset's longest edge `target_size` long
    pub fn scale_for(&self, target_size: f32) -> f32 {
        target_size / self.max_dimension
    }

    /// Normalize an asset-space point into a scale-invariant offset
    pub fn normalize(&self, point: &Point3f) -> Vector3f {
        (point - self.center) / self.max_dimension
    }

    /// Map a normalized offset back into asset space
    pub fn denormalize(&self, offset: &Vector3f) -> Point3f {
        self.center + offset * self.max_dimension
    }
}
