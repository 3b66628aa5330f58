//! Studio lighting for the props
//!
//! One ambient term plus key, fill and rim directional lights. The key and
//! fill follow the camera each frame so the props stay lit from the same
//! angle wherever the rig sits. Faces are shaded flat (one colour per
//! triangle), which suits the low-poly rocks.

use macroquad::color::Color;
use macroquad::math::Vec3;

use super::ray::{ray_sphere_intersection, Ray};

/// Key light offset from the camera
pub const KEY_OFFSET: Vec3 = Vec3::new(10.0, 20.0, 10.0);
/// Fill light offset from the camera
pub const FILL_OFFSET: Vec3 = Vec3::new(-15.0, 0.0, 15.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub casts_shadow: bool,
}

impl DirectionalLight {
    /// Unit vector from the lit surface towards the light
    pub fn direction(&self) -> Vec3 {
        (self.position - self.target).normalize_or_zero()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lighting {
    pub ambient_color: Color,
    pub ambient_intensity: f32,
    pub key: DirectionalLight,
    pub fill: DirectionalLight,
    pub rim: DirectionalLight,
}

impl Lighting {
    /// The default rig; `shadows` is decided by the viewport profile
    pub fn studio(shadows: bool) -> Self {
        Self {
            ambient_color: Color::new(1.0, 1.0, 1.0, 1.0),
            ambient_intensity: 0.4,
            key: DirectionalLight {
                color: Color::new(1.0, 1.0, 1.0, 1.0),
                intensity: 1.2,
                position: KEY_OFFSET,
                target: Vec3::ZERO,
                casts_shadow: shadows,
            },
            fill: DirectionalLight {
                color: Color::from_hex(0xccccff),
                intensity: 0.7,
                position: FILL_OFFSET,
                target: Vec3::ZERO,
                casts_shadow: false,
            },
            rim: DirectionalLight {
                color: Color::from_hex(0xffffee),
                intensity: 0.8,
                position: Vec3::new(0.0, -10.0, -15.0),
                target: Vec3::ZERO,
                casts_shadow: false,
            },
        }
    }

    pub fn shadows_enabled(&self) -> bool {
        self.key.casts_shadow
    }

    pub fn set_shadows(&mut self, enabled: bool) {
        self.key.casts_shadow = enabled;
    }

    /// Key and fill track the camera and aim at it
    pub fn follow_camera(&mut self, camera_position: Vec3) {
        self.key.position = camera_position + KEY_OFFSET;
        self.key.target = camera_position;
        self.fill.position = camera_position + FILL_OFFSET;
    }

    /// Flat shade one face. `key_visibility` scales the key light (1.0 lit,
    /// lower when another prop is in the way).
    pub fn shade(&self, base: Color, normal: Vec3, key_visibility: f32) -> Color {
        let mut r = self.ambient_color.r * self.ambient_intensity;
        let mut g = self.ambient_color.g * self.ambient_intensity;
        let mut b = self.ambient_color.b * self.ambient_intensity;

        for (light, visibility) in [
            (&self.key, key_visibility),
            (&self.fill, 1.0),
            (&self.rim, 1.0),
        ] {
            let lambert = normal.dot(light.direction()).max(0.0) * light.intensity * visibility;
            r += light.color.r * lambert;
            g += light.color.g * lambert;
            b += light.color.b * lambert;
        }

        Color::new(
            (base.r * r).min(1.0),
            (base.g * g).min(1.0),
            (base.b * b).min(1.0),
            base.a,
        )
    }
}

/// Whether any occluder sphere sits between `point` and the light along
/// `to_light`. Spheres containing `point` are skipped (that's the face's
/// own prop).
pub fn occluded<I>(point: Vec3, to_light: Vec3, occluders: I) -> bool
where
    I: IntoIterator<Item = (Vec3, f32)>,
{
    let ray = Ray::new(point, to_light);
    occluders.into_iter().any(|(center, radius)| {
        (point - center).length() > radius && ray_sphere_intersection(&ray, center, radius).is_some()
    })
}
