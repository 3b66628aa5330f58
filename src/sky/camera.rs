//! Perspective camera rig
//!
//! Owns the projection used for drawing, picking and for sizing the visible
//! slice of the frustum at a given depth (props are placed and recycled
//! against that slice).

use macroquad::math::{Mat4, Vec2, Vec3};

use super::ray::Ray;
use crate::config::CameraConfig;

/// A world point projected onto the render surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    /// Surface pixel coordinates (origin top-left)
    pub screen: Vec2,
    /// Distance along the view axis
    pub depth: f32,
}

/// Camera state for the 3D layer
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl CameraRig {
    pub fn new(config: &CameraConfig, width: f32, height: f32) -> Self {
        let mut rig = Self {
            fov_degrees: config.fov_degrees,
            aspect: 1.0,
            near: config.near,
            far: config.far,
            position: config.position(),
            target: config.target(),
        };
        rig.set_viewport(width, height);
        rig
    }

    /// Keep the aspect ratio in sync with the viewport
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.aspect = if width > 0.0 && height > 0.0 { width / height } else { 1.0 };
    }

    pub fn fov_radians(&self) -> f32 {
        self.fov_degrees.to_radians()
    }

    /// Width and height of the frustum slice at world depth `z`
    pub fn visible_extent(&self, z: f32) -> Vec2 {
        let distance = self.position.z - z;
        let height = 2.0 * (self.fov_radians() / 2.0).tan() * distance;
        Vec2::new(height * self.aspect, height)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Normalized device coordinates (with NDC depth) back to world space
    pub fn unproject(&self, ndc: Vec3) -> Vec3 {
        self.view_projection().inverse().project_point3(ndc)
    }

    /// World-space ray from the camera through a point in NDC
    pub fn ndc_ray(&self, ndc: Vec2) -> Ray {
        let through = self.unproject(ndc.extend(0.5));
        Ray::new(self.position, through - self.position)
    }

    /// Project a world point onto a surface of `viewport` pixels.
    /// None when the point is behind the near plane.
    pub fn project(&self, world: Vec3, viewport: Vec2) -> Option<Projected> {
        let clip = self.view_projection() * world.extend(1.0);
        if clip.w <= self.near {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Projected {
            screen: Vec2::new((ndc.x + 1.0) * 0.5 * viewport.x, (1.0 - ndc.y) * 0.5 * viewport.y),
            depth: clip.w,
        })
    }

    /// Pixels per world unit at unit depth, for sizing sprites
    pub fn focal_length_px(&self, viewport_height: f32) -> f32 {
        viewport_height / (2.0 * (self.fov_radians() / 2.0).tan())
    }
}

/// Pixel coordinates (origin top-left) to NDC (y up)
pub fn pixel_to_ndc(pixel: Vec2, viewport: Vec2) -> Vec2 {
    if viewport.x <= 0.0 || viewport.y <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new(pixel.x / viewport.x * 2.0 - 1.0, -(pixel.y / viewport.y) * 2.0 + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> CameraRig {
        CameraRig::new(&CameraConfig::default(), 1600.0, 900.0)
    }

    #[test]
    fn test_aspect_follows_viewport() {
        let mut cam = rig();
        assert!((cam.aspect - 16.0 / 9.0).abs() < 1e-5);
        cam.set_viewport(500.0, 1000.0);
        assert!((cam.aspect - 0.5).abs() < 1e-5);
        cam.set_viewport(0.0, 0.0);
        assert_eq!(cam.aspect, 1.0);
    }

    #[test]
    fn test_visible_extent() {
        let cam = rig();
        // 60 degree fov, 40 units away: height = 2 * tan(30deg) * 40
        let extent = cam.visible_extent(-10.0);
        let expected_h = 2.0 * (30.0f32).to_radians().tan() * 40.0;
        assert!((extent.y - expected_h).abs() < 1e-3);
        assert!((extent.x - expected_h * 16.0 / 9.0).abs() < 1e-3);
        // Further away is wider
        assert!(cam.visible_extent(-60.0).x > extent.x);
    }

    #[test]
    fn test_project_unproject_roundtrip() {
        let cam = rig();
        let viewport = Vec2::new(1600.0, 900.0);
        let world = Vec3::new(4.0, -2.0, -15.0);
        let projected = cam.project(world, viewport).expect("in front of camera");
        let ndc = pixel_to_ndc(projected.screen, viewport);
        let ray = cam.ndc_ray(ndc);
        let to_point = world - ray.origin;
        let closest = ray.at(to_point.dot(ray.direction));
        assert!((closest - world).length() < 0.01, "off by {}", (closest - world).length());
    }

    #[test]
    fn test_target_projects_to_center() {
        let cam = rig();
        let viewport = Vec2::new(1600.0, 900.0);
        let projected = cam.project(cam.target, viewport).unwrap();
        assert!((projected.screen - viewport / 2.0).length() < 0.5);
    }

    #[test]
    fn test_behind_camera_not_projected() {
        let cam = rig();
        assert!(cam.project(Vec3::new(0.0, 5.0, 60.0), Vec2::new(800.0, 600.0)).is_none());
    }

    #[test]
    fn test_pixel_to_ndc() {
        let viewport = Vec2::new(800.0, 600.0);
        assert_eq!(pixel_to_ndc(Vec2::new(400.0, 300.0), viewport), Vec2::ZERO);
        assert_eq!(pixel_to_ndc(Vec2::ZERO, viewport), Vec2::new(-1.0, 1.0));
        assert_eq!(pixel_to_ndc(viewport, viewport), Vec2::new(1.0, -1.0));
        assert_eq!(pixel_to_ndc(Vec2::ONE, Vec2::ZERO), Vec2::ZERO);
    }
}
