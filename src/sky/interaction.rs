//! Pick, drag and throw
//!
//! Pure helpers for the pointer state machine. The layer (see `mod.rs`)
//! drives the transitions; everything here is testable without a window.
//!
//! Per prop: Idle -> Selected -> Dragging -> Thrown -> Idle (on recycle).
//! At most one prop is Selected or Dragging at a time.

use macroquad::math::{Vec2, Vec3};
use rand::Rng;

use super::model::ModelAsset;
use super::pool::{ObjectId, ObjectPool};
use super::ray::{ray_plane_intersection, ray_sphere_intersection, ray_triangle_intersection, Ray};
use crate::config::ThrowConfig;

/// Pointer bookkeeping shared between events and frames
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerState {
    /// Last known position in CSS-style pixels (origin top-left)
    pub pixel: Vec2,
    /// Same position in normalized device coordinates
    pub ndc: Vec2,
    pub gesture_start_ms: f64,
    pub gesture_start: Vec2,
    /// The held prop. Refers into the pool; the pointer never owns it.
    pub selected: Option<ObjectId>,
    /// Moved since it was selected
    pub dragged: bool,
    /// Pointer is over a pickable prop (hover only)
    pub hovering: bool,
    /// At least one position has been reported since mount
    pub present: bool,
}

impl PointerState {
    pub fn select(&mut self, id: ObjectId, at: Vec2, now_ms: f64) {
        self.selected = Some(id);
        self.dragged = false;
        self.gesture_start = at;
        self.gesture_start_ms = now_ms;
    }

    pub fn release(&mut self) -> Option<ObjectId> {
        self.dragged = false;
        self.selected.take()
    }
}

/// Interaction phase of one prop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Selected,
    Dragging,
    Thrown,
}

pub fn phase_of(pool: &ObjectPool, pointer: &PointerState, id: ObjectId) -> Phase {
    match pool.get(id) {
        Some(object) if object.is_thrown() => Phase::Thrown,
        Some(_) if pointer.selected == Some(id) && pointer.dragged => Phase::Dragging,
        Some(_) if pointer.selected == Some(id) => Phase::Selected,
        _ => Phase::Idle,
    }
}

/// Nearest prop under a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub id: ObjectId,
    pub distance: f32,
    pub point: Vec3,
}

/// Cast `ray` against every prop's triangles (bounding sphere first)
pub fn pick(ray: &Ray, pool: &ObjectPool, models: &[ModelAsset]) -> Option<Hit> {
    let mut best: Option<Hit> = None;

    for (id, object) in pool.iter() {
        let Some(model) = models.get(object.kind) else {
            continue;
        };
        if ray_sphere_intersection(ray, object.position, model.radius * object.scale).is_none() {
            continue;
        }

        let transform = object.transform();
        let inverse = transform.inverse();
        let local_ray = Ray::new(
            inverse.transform_point3(ray.origin),
            inverse.transform_vector3(ray.direction),
        );

        for part in &model.parts {
            for i in 0..part.triangles.len() {
                let [v0, v1, v2] = part.triangle(i);
                let Some(t) = ray_triangle_intersection(&local_ray, v0, v1, v2) else {
                    continue;
                };
                let point = transform.transform_point3(local_ray.at(t));
                let distance = (point - ray.origin).length();
                if best.map_or(true, |b| distance < b.distance) {
                    best = Some(Hit { id, distance, point });
                }
            }
        }
    }

    best
}

/// Where a held prop goes: the pointer ray against the plane at its depth
pub fn drag_position(ray: &Ray, current: Vec3) -> Option<Vec3> {
    let t = ray_plane_intersection(ray, current, Vec3::Z)?;
    let hit = ray.at(t);
    Some(Vec3::new(hit.x, hit.y, current.z))
}

/// A finished press-move-release
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gesture {
    pub distance_px: f32,
    pub duration_ms: f32,
    /// Unit direction in pixel space (y down)
    pub direction: Vec2,
}

impl Gesture {
    pub fn new(start: Vec2, end: Vec2, start_ms: f64, end_ms: f64) -> Self {
        let delta = end - start;
        Self {
            distance_px: delta.length(),
            duration_ms: (end_ms - start_ms).max(0.0) as f32,
            direction: delta.normalize_or_zero(),
        }
    }

    /// Fast and long enough to count as a flick
    pub fn is_flick(&self, config: &ThrowConfig) -> bool {
        self.distance_px > config.min_distance_px && self.duration_ms < config.max_duration_ms
    }
}

/// Motion handed to a released prop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrowParams {
    pub speed: f32,
    pub velocity: Vec3,
    pub spin: Vec3,
    pub flick: bool,
}

/// Turn a release gesture into throw motion.
///
/// A flick throws along the gesture direction at `distance / duration *
/// speed_factor`, never slower than `speed_floor_ratio` of the prop's
/// ambient speed. Taps and slow drags get a plain rightward nudge at
/// that floor speed and no spin.
pub fn compute_throw<R: Rng>(
    config: &ThrowConfig,
    gesture: &Gesture,
    ambient_speed: f32,
    rng: &mut R,
) -> ThrowParams {
    let floor = ambient_speed * config.speed_floor_ratio;

    if !gesture.is_flick(config) {
        return ThrowParams {
            speed: floor,
            velocity: Vec3::new(floor, 0.0, 0.0),
            spin: Vec3::ZERO,
            flick: false,
        };
    }

    let raw = gesture.distance_px / gesture.duration_ms.max(1.0) * config.speed_factor;
    let speed = raw.max(floor);
    let dir = gesture.direction;
    let planar = speed * config.velocity_scale;

    ThrowParams {
        speed,
        velocity: Vec3::new(dir.x * planar, -dir.y * planar, config.depth_jitter.sample(rng)),
        spin: Vec3::new(
            config.spin_jitter.sample(rng) + dir.y * config.spin_bias,
            config.spin_jitter.sample(rng) - dir.x * config.spin_bias,
            config.spin_jitter.sample(rng),
        ),
        flick: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraConfig, SkyConfig};
    use crate::sky::camera::CameraRig;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn scene() -> (ObjectPool, Vec<ModelAsset>, CameraRig) {
        let config = SkyConfig::default();
        let camera = CameraRig::new(&CameraConfig::default(), 1280.0, 800.0);
        let mut rng = SmallRng::seed_from_u64(5);
        let model = ModelAsset::placeholder("asteroid", crate::config::Span(0.9, 1.0), &mut rng);
        let mut pool = ObjectPool::new();
        pool.populate(&config, &camera, 1280.0, &[true], &mut rng);
        (pool, vec![model], camera)
    }

    #[test]
    fn test_pick_hits_object_under_ray() {
        let (pool, models, camera) = scene();
        let target = pool.get(ObjectId(3)).unwrap().position;
        let ray = Ray::new(camera.position, target - camera.position);
        let hit = pick(&ray, &pool, &models).expect("ray through centre hits");
        // Something at least as close as the target was hit; usually the target itself
        assert!(hit.distance <= (target - camera.position).length());
    }

    #[test]
    fn test_pick_misses_empty_sky() {
        let (pool, models, camera) = scene();
        let ray = Ray::new(camera.position, Vec3::new(0.0, 0.0, 1.0));
        assert!(pick(&ray, &pool, &models).is_none());
        // No models loaded yet: nothing is pickable
        let target = pool.get(ObjectId(0)).unwrap().position;
        let ray = Ray::new(camera.position, target - camera.position);
        assert!(pick(&ray, &pool, &[]).is_none());
        assert!(pick(&ray, &ObjectPool::new(), &models).is_none());
    }

    #[test]
    fn test_drag_keeps_depth() {
        let ray = Ray::new(Vec3::new(0.0, 5.0, 30.0), Vec3::new(0.1, -0.1, -1.0));
        let current = Vec3::new(3.0, 3.0, -20.0);
        let moved = drag_position(&ray, current).unwrap();
        assert_eq!(moved.z, -20.0);
        assert!((moved.x - 5.0).abs() < 1e-3);
        assert!((moved.y - 0.0).abs() < 1e-3);
    }

    #[test]
    fn test_throw_speed_scenario() {
        let config = ThrowConfig::default();
        let mut rng = SmallRng::seed_from_u64(9);
        let gesture = Gesture::new(Vec2::ZERO, Vec2::new(50.0, 0.0), 1000.0, 1200.0);
        assert!(gesture.is_flick(&config));

        // 50px over 200ms = 2.5, above the 0.7 * 3 floor
        let slow_prop = compute_throw(&config, &gesture, 3.0, &mut rng);
        assert!((slow_prop.speed - 2.5).abs() < 1e-5);
        assert!((slow_prop.velocity.x - 1.25).abs() < 1e-5);
        assert!(slow_prop.velocity.y.abs() < 1e-5);
        assert!(config.depth_jitter.contains(slow_prop.velocity.z));

        // Below the 0.7 * 4 = 2.8 floor: clamped up
        let fast_prop = compute_throw(&config, &gesture, 4.0, &mut rng);
        assert!((fast_prop.speed - 2.8).abs() < 1e-5);
    }

    #[test]
    fn test_throw_floor_holds() {
        let config = ThrowConfig::default();
        let mut rng = SmallRng::seed_from_u64(10);
        for i in 0..200 {
            let ambient = 4.0 + (i % 5) as f32;
            let end = Vec2::new(rng.gen_range(-300.0..300.0), rng.gen_range(-300.0..300.0));
            let duration = rng.gen_range(1.0..2000.0);
            let gesture = Gesture::new(Vec2::ZERO, end, 0.0, duration);
            let params = compute_throw(&config, &gesture, ambient, &mut rng);
            assert!(params.speed >= ambient * 0.7 - 1e-5);
        }
    }

    #[test]
    fn test_tap_and_slow_drag_nudge_right() {
        let config = ThrowConfig::default();
        let mut rng = SmallRng::seed_from_u64(11);

        let tap = Gesture::new(Vec2::new(10.0, 10.0), Vec2::new(12.0, 11.0), 0.0, 80.0);
        let params = compute_throw(&config, &tap, 5.0, &mut rng);
        assert!(!params.flick);
        assert!((params.velocity - Vec3::new(3.5, 0.0, 0.0)).length() < 1e-5);
        assert_eq!(params.spin, Vec3::ZERO);

        let slow = Gesture::new(Vec2::ZERO, Vec2::new(200.0, 0.0), 0.0, 1500.0);
        assert!(!compute_throw(&config, &slow, 5.0, &mut rng).flick);
    }

    #[test]
    fn test_upward_flick_moves_up() {
        let config = ThrowConfig::default();
        let mut rng = SmallRng::seed_from_u64(12);
        let gesture = Gesture::new(Vec2::new(0.0, 100.0), Vec2::ZERO, 0.0, 100.0);
        let params = compute_throw(&config, &gesture, 4.0, &mut rng);
        assert!(params.velocity.y > 0.0);
        assert!(params.velocity.x.abs() < 1e-5);
    }

    #[test]
    fn test_phases() {
        let (mut pool, _, _) = scene();
        let mut pointer = PointerState::default();
        assert_eq!(phase_of(&pool, &pointer, ObjectId(0)), Phase::Idle);

        pointer.select(ObjectId(0), Vec2::ZERO, 0.0);
        assert_eq!(phase_of(&pool, &pointer, ObjectId(0)), Phase::Selected);
        assert_eq!(phase_of(&pool, &pointer, ObjectId(1)), Phase::Idle);
        pointer.dragged = true;
        assert_eq!(phase_of(&pool, &pointer, ObjectId(0)), Phase::Dragging);

        let released = pointer.release();
        assert_eq!(released, Some(ObjectId(0)));
        pool.throw(
            ObjectId(0),
            crate::sky::pool::ThrowMotion {
                velocity: Vec3::X,
                spin: Vec3::ZERO,
                thrown_at: 0.0,
            },
        );
        assert_eq!(phase_of(&pool, &pointer, ObjectId(0)), Phase::Thrown);
        assert!(pointer.selected.is_none());
    }
}
