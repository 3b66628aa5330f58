//! Floating prop pool
//!
//! A fixed set of props sized at load time. Props never die: once one drifts
//! off the left edge (or a thrown one escapes) it is recycled back to the
//! right edge with fresh random motion, so the pool length stays constant.

use macroquad::math::{EulerRot, Mat4, Quat, Vec3};
use rand::Rng;

use super::camera::CameraRig;
use crate::config::{PropSpec, SceneTuning, SkyConfig, Span, ThrowConfig};

/// Index of a prop in the pool. Stable for the pool's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub usize);

/// Motion applied after a throw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrowMotion {
    pub velocity: Vec3,
    /// Angular velocity (rad/s per axis)
    pub spin: Vec3,
    /// Simulated time of release, seconds
    pub thrown_at: f64,
}

/// One floating prop
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    /// Index into `SkyConfig::props` (and the loaded model list)
    pub kind: usize,
    pub position: Vec3,
    /// Euler angles, radians
    pub rotation: Vec3,
    pub scale: f32,
    /// Leftward drift, units/s
    pub speed: f32,
    pub vertical_speed: f32,
    pub rotation_speed: Vec3,
    /// Ambient drift is measured from here
    pub home: Vec3,
    pub drift_time: f32,
    pub throw: Option<ThrowMotion>,
}

impl SceneObject {
    pub fn is_thrown(&self) -> bool {
        self.throw.is_some()
    }

    pub fn transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z),
            self.position,
        )
    }

    /// Restart ambient drift from the current position (after a drag)
    pub fn rehome(&mut self) {
        self.home = self.position;
        self.drift_time = 0.0;
    }

    /// Place at the right edge with fresh random motion
    fn respawn<R: Rng>(
        &mut self,
        spec: &PropSpec,
        camera: &CameraRig,
        tuning: &SceneTuning,
        x_jitter: Span,
        rng: &mut R,
    ) {
        let z = tuning.spawn_depth.sample(rng);
        let extent = camera.visible_extent(z);
        self.position = Vec3::new(
            extent.x / 2.0 + x_jitter.sample(rng),
            Span(-0.5, 0.5).sample(rng) * extent.y,
            z,
        );
        let turn = Span(0.0, std::f32::consts::TAU);
        self.rotation = Vec3::new(turn.sample(rng), turn.sample(rng), turn.sample(rng));
        self.scale = spec.scale.sample(rng);
        self.speed = spec.speed.sample(rng);
        self.vertical_speed = spec.vertical_speed.sample(rng);
        self.rotation_speed = Vec3::new(
            spec.rotation_speed.sample(rng),
            spec.rotation_speed.sample(rng),
            spec.rotation_speed.sample(rng),
        );
        self.throw = None;
        self.rehome();
    }
}

/// Why a prop was sent back to the right edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecycleReason {
    DriftedOff,
    Escaped,
    TimedOut,
}

/// The live props
#[derive(Debug, Default)]
pub struct ObjectPool {
    objects: Vec<SceneObject>,
}

impl ObjectPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the pool for the given viewport, replacing anything already there.
    /// `available` says which prop kinds have a model to draw.
    pub fn populate<R: Rng>(
        &mut self,
        config: &SkyConfig,
        camera: &CameraRig,
        viewport_width: f32,
        available: &[bool],
        rng: &mut R,
    ) {
        let mobile = config.is_mobile(viewport_width);
        self.objects.clear();
        for (kind, spec) in config.props.iter().enumerate() {
            if !available.get(kind).copied().unwrap_or(false) {
                continue;
            }
            for _ in 0..spec.count(mobile) {
                let mut object = SceneObject {
                    kind,
                    position: Vec3::ZERO,
                    rotation: Vec3::ZERO,
                    scale: 1.0,
                    speed: 0.0,
                    vertical_speed: 0.0,
                    rotation_speed: Vec3::ZERO,
                    home: Vec3::ZERO,
                    drift_time: 0.0,
                    throw: None,
                };
                object.respawn(spec, camera, &config.scene, config.scene.spawn_x_jitter, rng);
                self.objects.push(object);
            }
        }
    }

    /// Advance every prop except the one held by the pointer.
    /// Returns the props recycled this frame.
    pub fn update<R: Rng>(
        &mut self,
        config: &SkyConfig,
        camera: &CameraRig,
        delta_time: f32,
        sim_time: f64,
        held: Option<ObjectId>,
        rng: &mut R,
    ) -> Vec<(ObjectId, RecycleReason)> {
        let mut recycled = Vec::new();

        for (index, object) in self.objects.iter_mut().enumerate() {
            let id = ObjectId(index);
            if held == Some(id) {
                continue;
            }

            let reason = match object.throw {
                Some(motion) => {
                    object.position += motion.velocity * delta_time;
                    object.rotation += motion.spin * delta_time * config.throw.spin_multiplier;
                    thrown_exit(object, motion, &config.throw, camera, sim_time)
                }
                None => {
                    object.drift_time += delta_time;
                    object.position = object.home
                        + Vec3::new(-object.speed, object.vertical_speed, 0.0) * object.drift_time;
                    object.rotation += object.rotation_speed * delta_time;

                    let extent = camera.visible_extent(object.position.z);
                    (object.position.x < -extent.x * config.scene.exit_margin)
                        .then_some(RecycleReason::DriftedOff)
                }
            };

            if let Some(reason) = reason {
                if let Some(spec) = config.props.get(object.kind) {
                    object.respawn(spec, camera, &config.scene, config.scene.recycle_x_jitter, rng);
                    recycled.push((id, reason));
                }
            }
        }

        recycled
    }

    /// Switch a prop to thrown motion
    pub fn throw(&mut self, id: ObjectId, motion: ThrowMotion) -> bool {
        match self.objects.get_mut(id.0) {
            Some(object) => {
                object.throw = Some(motion);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id.0)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.objects.iter().enumerate().map(|(i, o)| (ObjectId(i), o))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }
}

fn thrown_exit(
    object: &SceneObject,
    motion: ThrowMotion,
    throw: &ThrowConfig,
    camera: &CameraRig,
    sim_time: f64,
) -> Option<RecycleReason> {
    let z = object.position.z;
    if z > camera.position.z + throw.near_escape || z < throw.far_escape {
        return Some(RecycleReason::Escaped);
    }
    let extent = camera.visible_extent(z);
    if object.position.x.abs() > extent.x * throw.escape_margin
        || object.position.y.abs() > extent.y * throw.escape_margin
    {
        return Some(RecycleReason::Escaped);
    }
    if sim_time - motion.thrown_at > throw.timeout_secs {
        return Some(RecycleReason::TimedOut);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn setup(width: f32) -> (SkyConfig, CameraRig, ObjectPool, SmallRng) {
        let config = SkyConfig::default();
        let camera = CameraRig::new(&CameraConfig::default(), width, 800.0);
        let mut rng = SmallRng::seed_from_u64(42);
        let mut pool = ObjectPool::new();
        pool.populate(&config, &camera, width, &[true], &mut rng);
        (config, camera, pool, rng)
    }

    #[test]
    fn test_populate_uses_pool_target() {
        let (config, camera, mut pool, mut rng) = setup(1280.0);
        assert_eq!(pool.len(), 8);
        pool.populate(&config, &camera, 500.0, &[true], &mut rng);
        assert_eq!(pool.len(), 4);
        pool.populate(&config, &camera, 1280.0, &[false], &mut rng);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_spawn_ranges() {
        let (config, camera, pool, _) = setup(1280.0);
        let spec = &config.props[0];
        for (_, object) in pool.iter() {
            assert!(config.scene.spawn_depth.contains(object.position.z));
            let extent = camera.visible_extent(object.position.z);
            assert!(object.position.x >= extent.x / 2.0 - 1e-3);
            assert!(object.position.x <= extent.x / 2.0 + 50.0 + 1e-3);
            assert!(object.position.y.abs() <= extent.y / 2.0 + 1e-3);
            assert!(spec.scale.contains(object.scale));
            assert!(spec.speed.contains(object.speed));
            assert!(spec.vertical_speed.contains(object.vertical_speed));
            assert!(!object.is_thrown());
        }
    }

    #[test]
    fn test_ambient_drift_moves_left() {
        let (config, camera, mut pool, mut rng) = setup(1280.0);
        let before = pool.get(ObjectId(0)).unwrap().clone();
        pool.update(&config, &camera, 0.1, 0.1, None, &mut rng);
        let after = pool.get(ObjectId(0)).unwrap();
        assert!((after.position.x - (before.position.x - before.speed * 0.1)).abs() < 1e-4);
        assert!((after.position.y - (before.position.y + before.vertical_speed * 0.1)).abs() < 1e-4);
    }

    #[test]
    fn test_held_object_is_frozen() {
        let (config, camera, mut pool, mut rng) = setup(1280.0);
        let before = pool.get(ObjectId(2)).unwrap().clone();
        pool.update(&config, &camera, 0.1, 0.1, Some(ObjectId(2)), &mut rng);
        assert_eq!(pool.get(ObjectId(2)).unwrap(), &before);
    }

    #[test]
    fn test_drifted_off_is_recycled_and_pool_size_kept() {
        let (config, camera, mut pool, mut rng) = setup(1280.0);
        {
            let object = pool.get_mut(ObjectId(1)).unwrap();
            let extent = camera.visible_extent(object.position.z);
            object.home.x = -extent.x - 1.0;
        }
        let recycled = pool.update(&config, &camera, 0.016, 0.016, None, &mut rng);
        assert!(recycled.contains(&(ObjectId(1), RecycleReason::DriftedOff)));
        assert_eq!(pool.len(), 8);

        let object = pool.get(ObjectId(1)).unwrap();
        let extent = camera.visible_extent(object.position.z);
        assert!(object.position.x >= extent.x / 2.0 - 1e-3);
        assert_eq!(object.drift_time, 0.0);
    }

    #[test]
    fn test_thrown_object_recycled_within_timeout() {
        let (config, camera, mut pool, mut rng) = setup(1280.0);
        // Barely moving, so only the timeout can catch it
        pool.throw(
            ObjectId(0),
            ThrowMotion {
                velocity: Vec3::new(0.0, 0.0, 0.0001),
                spin: Vec3::ZERO,
                thrown_at: 0.0,
            },
        );

        let mut sim_time = 0.0;
        let mut reason = None;
        while sim_time < 31.0 {
            sim_time += 0.1;
            for (id, why) in pool.update(&config, &camera, 0.1, sim_time, None, &mut rng) {
                if id == ObjectId(0) {
                    reason = Some(why);
                }
            }
            if reason.is_some() {
                break;
            }
        }
        assert_eq!(reason, Some(RecycleReason::TimedOut));
        assert!(sim_time > 30.0 && sim_time < 30.3);
        assert!(!pool.get(ObjectId(0)).unwrap().is_thrown());
        assert_eq!(pool.len(), 8);
    }

    #[test]
    fn test_thrown_object_escapes_box() {
        let (config, camera, mut pool, mut rng) = setup(1280.0);
        pool.throw(
            ObjectId(3),
            ThrowMotion {
                velocity: Vec3::new(0.0, 0.0, -2000.0),
                spin: Vec3::ONE,
                thrown_at: 0.0,
            },
        );
        let recycled = pool.update(&config, &camera, 0.1, 0.1, None, &mut rng);
        assert!(recycled.contains(&(ObjectId(3), RecycleReason::Escaped)));
    }
}
