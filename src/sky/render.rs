//! Drawing the 3D layer
//!
//! Props are projected on the CPU through the camera rig, shaded flat, depth
//! sorted (far to near) and drawn as 2D triangles into an offscreen render
//! target. The target is then composited over the starfield at the scene's
//! fade-in alpha. Building the draw list needs no graphics context; only
//! `RenderSurface` and `draw_scene` touch the GPU.

use macroquad::prelude::*;

use super::lighting::occluded;
use super::particles::Bursts;
use super::scene::{Scene3d, SurfaceSpec};
use crate::config::SkyConfig;

/// One primitive to paint, in surface pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawItem {
    Triangle { points: [Vec2; 3], depth: f32, color: Color },
    Disc { center: Vec2, radius: f32, depth: f32, color: Color },
}

impl DrawItem {
    pub fn depth(&self) -> f32 {
        match self {
            DrawItem::Triangle { depth, .. } | DrawItem::Disc { depth, .. } => *depth,
        }
    }
}

/// Project, cull, shade and sort everything in the scene
pub fn build_draw_list(scene: &Scene3d, bursts: &Bursts, config: &SkyConfig) -> Vec<DrawItem> {
    let (pw, ph) = scene.surface.pixel_size();
    let viewport = Vec2::new(pw as f32, ph as f32);
    let camera = &scene.camera;
    let shadows = scene.lights.shadows_enabled();
    let to_key = scene.lights.key.direction();

    // Bounding spheres for key-light occlusion
    let spheres: Vec<(Vec3, f32)> = scene
        .pool
        .iter()
        .filter_map(|(_, o)| scene.models.get(o.kind).map(|m| (o.position, m.radius * o.scale)))
        .collect();

    let mut items = Vec::new();

    for (_, object) in scene.pool.iter() {
        let Some(model) = scene.models.get(object.kind) else {
            continue;
        };
        let base = config
            .props
            .get(object.kind)
            .map(|p| p.base_color())
            .unwrap_or(GRAY);
        let transform = object.transform();

        for part in &model.parts {
            for i in 0..part.triangles.len() {
                let [a, b, c] = part.triangle(i).map(|v| transform.transform_point3(v));
                let normal = (b - a).cross(c - a).normalize_or_zero();
                let centroid = (a + b + c) / 3.0;

                // Backface
                if normal.dot(centroid - camera.position) >= 0.0 {
                    continue;
                }

                let (Some(pa), Some(pb), Some(pc)) = (
                    camera.project(a, viewport),
                    camera.project(b, viewport),
                    camera.project(c, viewport),
                ) else {
                    continue;
                };

                let key_visibility = if shadows
                    && normal.dot(to_key) > 0.0
                    && occluded(centroid, to_key, spheres.iter().copied())
                {
                    config.scene.shadow_strength
                } else {
                    1.0
                };

                items.push(DrawItem::Triangle {
                    points: [pa.screen, pb.screen, pc.screen],
                    depth: (pa.depth + pb.depth + pc.depth) / 3.0,
                    color: scene.lights.shade(base, normal, key_visibility),
                });
            }
        }
    }

    let focal = camera.focal_length_px(viewport.y);
    for burst in bursts.iter() {
        let alpha = burst.current_opacity();
        if alpha <= 0.0 {
            continue;
        }
        let color = Color::new(burst.color.r, burst.color.g, burst.color.b, alpha);
        for particle in &burst.particles {
            if let Some(p) = camera.project(particle.position, viewport) {
                items.push(DrawItem::Disc {
                    center: p.screen,
                    radius: (burst.radius * focal / p.depth).max(1.0),
                    depth: p.depth,
                    color,
                });
            }
        }
    }

    // Painter's order: far first
    items.sort_by(|x, y| y.depth().total_cmp(&x.depth()));
    items
}

/// The offscreen target the 3D layer is drawn into
pub struct RenderSurface {
    target: RenderTarget,
    size: (u32, u32),
}

impl RenderSurface {
    pub fn attach(spec: &SurfaceSpec) -> Self {
        let (w, h) = spec.pixel_size();
        let target = render_target(w, h);
        target.texture.set_filter(FilterMode::Linear);
        log::debug!("Render surface attached ({}x{})", w, h);
        Self { target, size: (w, h) }
    }

    /// Recreate the backing texture if the surface size changed
    pub fn sync(&mut self, spec: &SurfaceSpec) {
        if spec.pixel_size() != self.size {
            *self = Self::attach(spec);
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

/// Paint the scene into the surface and composite it onto the screen
pub fn draw_scene(surface: &mut RenderSurface, scene: &Scene3d, bursts: &Bursts, config: &SkyConfig) {
    if !scene.ready || scene.fade <= 0.0 {
        return;
    }
    surface.sync(&scene.surface);
    let (w, h) = surface.size();
    let (w, h) = (w as f32, h as f32);

    set_camera(&Camera2D {
        zoom: vec2(2.0 / w, 2.0 / h),
        target: vec2(w / 2.0, h / 2.0),
        render_target: Some(surface.target.clone()),
        ..Default::default()
    });
    clear_background(Color::new(0.0, 0.0, 0.0, 0.0));

    for item in build_draw_list(scene, bursts, config) {
        match item {
            DrawItem::Triangle { points: [a, b, c], color, .. } => draw_triangle(a, b, c, color),
            DrawItem::Disc { center, radius, color, .. } => draw_circle(center.x, center.y, radius, color),
        }
    }

    set_default_camera();
    draw_texture_ex(
        &surface.target.texture,
        0.0,
        0.0,
        Color::new(1.0, 1.0, 1.0, scene.fade),
        DrawTextureParams {
            dest_size: Some(scene.surface.logical_size()),
            ..Default::default()
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sky::loader::{LoadOutcome, PLACEHOLDER_LUMPINESS};
    use crate::sky::model::ModelAsset;
    use ::rand::rngs::SmallRng;
    use ::rand::SeedableRng;

    fn ready_scene(width: f32) -> (Scene3d, SkyConfig) {
        let config = SkyConfig::default();
        let mut rng = SmallRng::seed_from_u64(21);
        let mut scene = Scene3d::initialize(&config, width, 800.0, 1.0).unwrap();
        let model = ModelAsset::placeholder("asteroid", PLACEHOLDER_LUMPINESS, &mut rng);
        scene.install_models(vec![LoadOutcome::Loaded { kind: 0, model }], &config, &mut rng);
        (scene, config)
    }

    #[test]
    fn test_draw_list_sorted_far_to_near() {
        let (scene, config) = ready_scene(1280.0);
        let items = build_draw_list(&scene, &Bursts::new(), &config);
        assert!(!items.is_empty());
        for pair in items.windows(2) {
            assert!(pair[0].depth() >= pair[1].depth());
        }
    }

    #[test]
    fn test_backfaces_culled() {
        let (scene, config) = ready_scene(1280.0);
        let items = build_draw_list(&scene, &Bursts::new(), &config);
        let total: usize = scene.models[0].triangle_count() * scene.pool.len();
        // A closed convex-ish rock shows roughly half its faces
        assert!(items.len() < total);
        assert!(items.len() > total / 4);
    }

    #[test]
    fn test_bursts_become_discs() {
        let (scene, config) = ready_scene(1280.0);
        let mut rng = SmallRng::seed_from_u64(22);
        let mut bursts = Bursts::new();
        bursts.spawn(&config.burst, Vec3::new(0.0, 0.0, -20.0), &mut rng);
        let items = build_draw_list(&scene, &bursts, &config);
        let discs = items.iter().filter(|i| matches!(i, DrawItem::Disc { .. })).count();
        assert_eq!(discs, 20);
    }

    #[test]
    fn test_empty_scene_draws_nothing() {
        let config = SkyConfig::default();
        let scene = Scene3d::initialize(&config, 1280.0, 800.0, 1.0).unwrap();
        assert!(build_draw_list(&scene, &Bursts::new(), &config).is_empty());
    }
}
