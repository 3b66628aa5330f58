//! Release bursts
//!
//! A small puff of grey dust spawned where a prop is let go. Each burst is a
//! fixed set of particles moving at constant velocity; it fades with age and
//! is removed by its cleanup timeout (see `timers.rs`), never by age alone.

use macroquad::color::Color;
use macroquad::math::Vec3;
use rand::Rng;

use crate::config::{parse_hex_color, BurstConfig};

/// Upper bound on simultaneously live bursts; the oldest goes first
pub const MAX_BURSTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BurstId(pub u64);

/// A single particle of a burst
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// World position
    pub position: Vec3,
    /// Velocity (units per second)
    pub velocity: Vec3,
}

#[derive(Debug, Clone)]
pub struct ParticleBurst {
    pub id: BurstId,
    pub particles: Vec<Particle>,
    /// Seconds since spawn (simulated)
    pub age: f32,
    /// Seconds until fully faded
    pub lifetime: f32,
    pub radius: f32,
    pub color: Color,
    pub opacity: f32,
}

impl ParticleBurst {
    /// Current opacity, fading linearly to zero over the lifetime
    pub fn current_opacity(&self) -> f32 {
        if self.lifetime <= 0.0 {
            return 0.0;
        }
        let t = (self.age / self.lifetime).clamp(0.0, 1.0);
        lerp(self.opacity, 0.0, t)
    }
}

/// All live bursts
#[derive(Debug, Default)]
pub struct Bursts {
    next_id: u64,
    live: Vec<ParticleBurst>,
}

impl Bursts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a burst at `origin`. The caller schedules its cleanup.
    pub fn spawn<R: Rng>(&mut self, config: &BurstConfig, origin: Vec3, rng: &mut R) -> BurstId {
        let id = BurstId(self.next_id);
        self.next_id += 1;

        let particles = (0..config.count)
            .map(|_| Particle {
                position: origin,
                velocity: Vec3::new(
                    config.velocity.sample(rng),
                    config.velocity.sample(rng),
                    config.velocity.sample(rng),
                ),
            })
            .collect();

        if self.live.len() >= MAX_BURSTS {
            self.live.remove(0);
        }
        self.live.push(ParticleBurst {
            id,
            particles,
            age: 0.0,
            lifetime: (config.lifetime_ms / 1000.0) as f32,
            radius: config.radius,
            color: parse_hex_color(&config.color).unwrap_or(Color::new(0.67, 0.67, 0.67, 1.0)),
            opacity: config.opacity,
        });
        id
    }

    /// Integrate positions
    pub fn update(&mut self, delta_time: f32) {
        for burst in &mut self.live {
            burst.age += delta_time;
            for particle in &mut burst.particles {
                particle.position += particle.velocity * delta_time;
            }
        }
    }

    /// Remove a burst; false if it was already gone
    pub fn remove(&mut self, id: BurstId) -> bool {
        let before = self.live.len();
        self.live.retain(|b| b.id != id);
        self.live.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParticleBurst> {
        self.live.iter()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn particle_count(&self) -> usize {
        self.live.iter().map(|b| b.particles.len()).sum()
    }

    pub fn clear(&mut self) {
        self.live.clear();
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}
