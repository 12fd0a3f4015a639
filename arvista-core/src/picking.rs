//! Screen-space picking of marker nodes

use crate::bounds::Aabb;
use crate::camera::PreviewCamera;
use crate::point::{Point3f, Vector3f};
use crate::traits::{NodeId, Picker, SceneGraph};

/// A half-line in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3f,
    pub direction: Vector3f,
}

/// Slab-method ray/AABB intersection, returns the entry distance
/// (or the exit distance when the origin is inside the box)
pub fn ray_aabb_hit_t(ray: &Ray, bounds: &Aabb) -> Option<f32> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let direction = ray.direction[axis];
        if direction == 0.0 {
            if origin < bounds.min[axis] || origin > bounds.max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / direction;
        let mut t0 = (bounds.min[axis] - origin) * inv;
        let mut t1 = (bounds.max[axis] - origin) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }

    if t_max < 0.0 {
        return None;
    }
    Some(if t_min >= 0.0 { t_min } else { t_max })
}

/// Picks visible marker nodes by testing a camera ray against a cube of
/// fixed half extent around each marker's world position
#[derive(Debug, Clone)]
pub struct MarkerPicker {
    camera: PreviewCamera,
    viewport: (f32, f32),
    half_extent: f32,
    targets: Vec<NodeId>,
}

impl MarkerPicker {
    pub fn new(camera: PreviewCamera, viewport: (f32, f32), half_extent: f32) -> Self {
        Self {
            camera,
            viewport,
            half_extent,
            targets: Vec::new(),
        }
    }

    /// Replace the set of pickable nodes
    pub fn set_targets(&mut self, targets: impl IntoIterator<Item = NodeId>) {
        self.targets = targets.into_iter().collect();
    }

    /// Follow the viewer's camera
    pub fn set_camera(&mut self, camera: PreviewCamera) {
        self.camera = camera;
    }

    pub fn camera(&self) -> &PreviewCamera {
        &self.camera
    }
}

impl Picker for MarkerPicker {
    fn pick(&self, scene: &dyn SceneGraph, screen_x: f32, screen_y: f32) -> Option<NodeId> {
        let ray = self
            .camera
            .screen_ray(screen_x, screen_y, self.viewport.0, self.viewport.1)?;
        let half = Vector3f::repeat(self.half_extent);

        self.targets
            .iter()
            .filter(|node| scene.is_visible(**node))
            .filter_map(|node| {
                let center = scene.world_position(*node)?;
                let t = ray_aabb_hit_t(&ray, &Aabb::from_center_half_extents(center, half))?;
                Some((*node, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(node, _)| node)
    }
}
