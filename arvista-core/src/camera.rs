//! Preview camera used outside of AR and for screen-space picking

use nalgebra::{Matrix4, Perspective3, Point3, Rotation3, Unit, Vector3};

use crate::bounds::Aabb;
use crate::picking::Ray;

/// Direction (before normalization) from the target towards the camera in
/// the canonical preview framing: slightly above, in front
const PREVIEW_DIRECTION: [f32; 3] = [0.0, 0.6, 1.0];

const DEFAULT_NEAR: f32 = 0.01;
const DEFAULT_FAR: f32 = 20.0;

/// Perspective camera orbiting a target point; `vertical_fov` in radians
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewCamera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub vertical_fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PreviewCamera {
    /// Camera at `position` looking at `target` with a y-up frame and the
    /// default clip planes
    pub fn looking_at(position: Point3<f32>, target: Point3<f32>, vertical_fov: f32, aspect: f32) -> Self {
        Self {
            position,
            target,
            up: Vector3::y(),
            vertical_fov,
            aspect,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }

    /// Clip-space transform: projection after view
    pub fn view_projection(&self) -> Matrix4<f32> {
        let view = Matrix4::look_at_rh(&self.position, &self.target, &self.up);
        Perspective3::new(self.aspect, self.vertical_fov, self.near, self.far).as_matrix() * view
    }

    /// Rotate the camera around the target by yaw (about `up`) and pitch
    /// (about the camera's right axis), in radians
    pub fn orbit(&mut self, horizontal: f32, vertical: f32) {
        let offset = self.position - self.target;
        let Some(up) = Unit::try_new(self.up, f32::EPSILON) else {
            return;
        };
        let yaw = Rotation3::from_axis_angle(&up, horizontal);
        let mut offset = yaw * offset;

        if let Some(right) = Unit::try_new(offset.cross(&*up), f32::EPSILON) {
            let pitched = Rotation3::from_axis_angle(&right, vertical) * offset;
            // stop short of the poles so look_at stays defined
            if pitched.normalize().dot(&*up).abs() < 0.99 {
                offset = pitched;
            }
        }
        self.position = self.target + offset;
    }

    /// Canonical framing of `bounds`: looking at its centre from above and
    /// in front, `distance` bounding-box lengths away
    pub fn frame_bounds(&mut self, bounds: &Aabb, distance: f32) {
        let radius = bounds.max_dimension().max(f32::EPSILON);
        let direction = Vector3::from(PREVIEW_DIRECTION).normalize();
        self.target = bounds.center();
        self.position = self.target + direction * radius * distance;
        self.up = Vector3::y();
        self.near = (radius * 0.01).min(DEFAULT_NEAR);
        self.far = (radius * distance * 4.0).max(DEFAULT_FAR);
    }

    /// World-space ray through a pixel of a `width` x `height` viewport
    pub fn screen_ray(&self, x: f32, y: f32, width: f32, height: f32) -> Option<Ray> {
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let ndc_x = 2.0 * x / width - 1.0;
        let ndc_y = 1.0 - 2.0 * y / height;
        let inverse = self.view_projection().try_inverse()?;

        let near = inverse.transform_point(&Point3::new(ndc_x, ndc_y, -1.0));
        let far = inverse.transform_point(&Point3::new(ndc_x, ndc_y, 1.0));
        let direction = (far - near).try_normalize(f32::EPSILON)?;
        Some(Ray { origin: near, direction })
    }
}

impl Default for PreviewCamera {
    fn default() -> Self {
        Self::looking_at(Point3::new(0.0, 1.6, 3.0), Point3::origin(), 70.0_f32.to_radians(), 16.0 / 9.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frame_bounds_looks_at_center() {
        let mut camera = PreviewCamera::default();
        camera.orbit(1.0, 0.3);
        let bounds = Aabb::new(Point3::new(-1.0, 0.0, -1.0), Point3::new(1.0, 0.5, 1.0));

        camera.frame_bounds(&bounds, 2.5);

        assert_relative_eq!(camera.target, Point3::new(0.0, 0.25, 0.0));
        assert_relative_eq!((camera.position - camera.target).norm(), 5.0, epsilon = 1e-5);
        assert!(camera.position.y > camera.target.y);
    }

    #[test]
    fn test_orbit_keeps_distance() {
        let mut camera = PreviewCamera::default();
        let before = (camera.position - camera.target).norm();
        camera.orbit(0.5, -0.2);
        assert_relative_eq!((camera.position - camera.target).norm(), before, epsilon = 1e-4);
    }

    #[test]
    fn test_center_pixel_ray_points_at_target() {
        let camera = PreviewCamera::default();
        let ray = camera.screen_ray(400.0, 225.0, 800.0, 450.0).unwrap();
        let expected = (camera.target - camera.position).normalize();
        assert_relative_eq!(ray.direction, expected, epsilon = 1e-4);
    }
}
