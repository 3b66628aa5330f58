//! 3D scene bootstrap
//!
//! Camera, lights and the render surface description, plus the models and
//! prop pool once loading resolves. The GPU side of the surface lives in
//! `render.rs`; this struct only holds what the simulation needs.

use macroquad::math::Vec2;
use rand::Rng;
use thiserror::Error;

use super::camera::CameraRig;
use super::lighting::Lighting;
use super::loader::{LoadOutcome, PLACEHOLDER_LUMPINESS};
use super::model::ModelAsset;
use super::pool::ObjectPool;
use crate::config::SkyConfig;

/// Why the 3D layer could not start. The starfield carries on regardless.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    #[error("3D rendering is disabled")]
    Disabled,
    #[error("viewport {width}x{height} has no area")]
    ZeroSized { width: f32, height: f32 },
}

/// Size of the render surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSpec {
    /// Logical size (same units as pointer coordinates)
    pub width: f32,
    pub height: f32,
    /// Device pixels per logical pixel, capped
    pub pixel_ratio: f32,
}

impl SurfaceSpec {
    pub fn new(width: f32, height: f32, device_ratio: f32, max_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: device_ratio.clamp(1.0, max_ratio.max(1.0)),
        }
    }

    pub fn logical_size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Backing texture size in device pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width * self.pixel_ratio).round().max(1.0) as u32,
            (self.height * self.pixel_ratio).round().max(1.0) as u32,
        )
    }
}

/// The 3D half of the sky
#[derive(Debug)]
pub struct Scene3d {
    pub camera: CameraRig,
    pub lights: Lighting,
    pub surface: SurfaceSpec,
    /// One model per prop kind, empty until loading resolves
    pub models: Vec<ModelAsset>,
    pub pool: ObjectPool,
    /// Every requested model has resolved (loaded or placeholder)
    pub ready: bool,
    /// Fade-in progress, 0..=1
    pub fade: f32,
}

impl Scene3d {
    pub fn initialize(
        config: &SkyConfig,
        width: f32,
        height: f32,
        device_ratio: f32,
    ) -> Result<Self, SurfaceError> {
        if !config.enable_3d {
            return Err(SurfaceError::Disabled);
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(SurfaceError::ZeroSized { width, height });
        }

        let camera = CameraRig::new(&config.camera, width, height);
        let mut lights = Lighting::studio(Self::wants_shadows(config, width));
        lights.follow_camera(camera.position);

        Ok(Self {
            camera,
            lights,
            surface: SurfaceSpec::new(width, height, device_ratio, config.scene.max_pixel_ratio),
            models: Vec::new(),
            pool: ObjectPool::new(),
            ready: false,
            fade: 0.0,
        })
    }

    /// Shadows only on the desktop profile
    pub fn wants_shadows(config: &SkyConfig, width: f32) -> bool {
        width > config.mobile_breakpoint
    }

    /// Take the load results and fill the pool. Kinds with no outcome get a
    /// placeholder so the pool always matches the configured target.
    pub fn install_models<R: Rng>(&mut self, outcomes: Vec<LoadOutcome>, config: &SkyConfig, rng: &mut R) {
        let mut models: Vec<Option<ModelAsset>> = vec![None; config.props.len()];
        for outcome in outcomes {
            let kind = outcome.kind();
            if let Some(slot) = models.get_mut(kind) {
                *slot = Some(match outcome {
                    LoadOutcome::Loaded { model, .. } | LoadOutcome::Fallback { model, .. } => model,
                });
            }
        }

        self.models = models
            .into_iter()
            .enumerate()
            .map(|(kind, model)| {
                model.unwrap_or_else(|| {
                    ModelAsset::placeholder(&config.props[kind].name, PLACEHOLDER_LUMPINESS, rng)
                })
            })
            .collect();

        let available = vec![true; self.models.len()];
        self.pool
            .populate(config, &self.camera, self.surface.width, &available, rng);
        self.ready = true;
        log::info!(
            "Sky scene ready: {} props from {} models",
            self.pool.len(),
            self.models.len()
        );
    }

    /// Apply a (debounced) viewport change
    pub fn resize(&mut self, config: &SkyConfig, width: f32, height: f32, device_ratio: f32) {
        self.camera.set_viewport(width, height);
        self.surface = SurfaceSpec::new(width, height, device_ratio, config.scene.max_pixel_ratio);
        self.lights.set_shadows(Self::wants_shadows(config, width));
    }

    pub fn update_lights(&mut self) {
        self.lights.follow_camera(self.camera.position);
    }

    pub fn advance_fade(&mut self, delta_time: f32, fade_secs: f32) {
        if !self.ready {
            return;
        }
        self.fade = if fade_secs <= 0.0 {
            1.0
        } else {
            (self.fade + delta_time / fade_secs).min(1.0)
        };
    }

    /// Drop models and props
    pub fn release(&mut self) {
        self.pool.clear();
        self.models.clear();
        self.ready = false;
        self.fade = 0.0;
    }
}
