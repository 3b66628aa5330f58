//! Night sky background
//!
//! A 2D starfield with a 3D layer of drifting props on top that can be
//! grabbed and flung. `SkyLayer` owns all of it: the frame loop calls
//! [`SkyLayer::advance`] then [`SkyLayer::draw`] once per frame, and feeds
//! input through [`SkyLayer::handle_event`] in between.
//!
//! The simulation never touches the GPU, so everything except `draw` runs
//! headless in tests.

pub mod camera;
pub mod interaction;
pub mod lighting;
pub mod loader;
pub mod model;
pub mod particles;
pub mod pool;
pub mod ray;
pub mod render;
pub mod scene;
pub mod starfield;
pub mod timers;

use macroquad::color::Color;
use macroquad::math::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::SkyConfig;
use camera::pixel_to_ndc;
use interaction::{compute_throw, drag_position, phase_of, pick, Gesture, Phase, PointerState};
use loader::{Fetcher, LoadOutcome, ModelRequest, PendingModels};
use particles::Bursts;
use pool::{ObjectId, ThrowMotion};
use render::{draw_scene, RenderSurface};
use scene::Scene3d;
use starfield::StarField;
use timers::{TimerEvent, Timers};

/// Input the layer reacts to. Times are wall-clock milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkyEvent {
    PointerMove { x: f32, y: f32, t_ms: f64 },
    PointerDown { x: f32, y: f32, t_ms: f64 },
    PointerUp { x: f32, y: f32, t_ms: f64 },
    /// Page scroll position in pixels
    Scroll { y: f32 },
    Resize { width: f32, height: f32, pixel_ratio: f32, t_ms: f64 },
}

/// Logical viewport size and device pixel ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        Self { width, height, pixel_ratio }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// Per-frame state shared by the subsystems
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationState {
    pub viewport: Viewport,
    pub mobile: bool,
    pub pointer: PointerState,
    pub page_scroll: f32,
    /// Sum of frame deltas, seconds
    pub sim_time: f64,
    /// False during the post-throw cooldown
    pub interaction_enabled: bool,
}

/// Turns wall-clock timestamps into capped frame deltas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    last_ms: f64,
    max_delta: f32,
}

impl FrameClock {
    pub fn new(start_ms: f64, max_delta: f32) -> Self {
        Self { last_ms: start_ms, max_delta }
    }

    /// Seconds since the previous tick, clamped to `[0, max_delta]`
    pub fn tick(&mut self, now_ms: f64) -> f32 {
        let dt = ((now_ms - self.last_ms) / 1000.0) as f32;
        self.last_ms = now_ms;
        dt.clamp(0.0, self.max_delta)
    }
}

/// The mounted night sky
pub struct SkyLayer {
    config: SkyConfig,
    palette: [Color; 3],
    rng: SmallRng,
    state: AnimationState,
    clock: FrameClock,
    starfield: StarField,
    scene: Option<Scene3d>,
    surface: Option<RenderSurface>,
    bursts: Bursts,
    timers: Timers,
    fetcher: Option<Fetcher>,
    pending: Option<PendingModels>,
    /// Bumped on every load and on teardown; stale completions are dropped
    generation: u64,
    mounted: bool,
}

impl SkyLayer {
    /// Build the starfield and, when possible, the 3D scene. Models are not
    /// requested until [`SkyLayer::start_loading`].
    pub fn mount(config: SkyConfig, viewport: Viewport, now_ms: f64, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let palette = config.starfield.resolved_palette();
        let mobile = config.is_mobile(viewport.width);

        let starfield = StarField::initialize(
            &config.starfield,
            &palette,
            viewport.width,
            viewport.height,
            mobile,
            &mut rng,
        );

        let scene = match Scene3d::initialize(&config, viewport.width, viewport.height, viewport.pixel_ratio) {
            Ok(scene) => Some(scene),
            Err(e) => {
                log::warn!("3D layer unavailable ({}), starfield only", e);
                None
            }
        };

        log::info!(
            "Sky mounted at {}x{} ({} stars, {} profile)",
            viewport.width,
            viewport.height,
            starfield.len(),
            if mobile { "mobile" } else { "desktop" }
        );

        Self {
            clock: FrameClock::new(now_ms, config.scene.max_frame_delta),
            state: AnimationState {
                viewport,
                mobile,
                pointer: PointerState::default(),
                page_scroll: 0.0,
                sim_time: 0.0,
                interaction_enabled: true,
            },
            config,
            palette,
            rng,
            starfield,
            scene,
            surface: None,
            bursts: Bursts::new(),
            timers: Timers::new(),
            fetcher: None,
            pending: None,
            generation: 0,
            mounted: true,
        }
    }

    /// Begin loading prop models through `fetcher`. No-op without a 3D scene.
    pub fn start_loading(&mut self, fetcher: Fetcher) {
        self.fetcher = Some(fetcher);
        self.begin_load();
    }

    fn begin_load(&mut self) {
        if !self.mounted || self.scene.is_none() {
            return;
        }
        let Some(fetch) = self.fetcher.clone() else {
            return;
        };
        self.generation += 1;
        let requests = ModelRequest::from_config(&self.config);
        log::debug!("Loading {} models (generation {})", requests.len(), self.generation);
        self.pending = Some(PendingModels::start(requests, fetch, self.rng.gen(), self.generation));
    }

    /// Install finished loads. Returns false (and drops them) when they
    /// belong to an earlier generation or the layer is gone.
    pub fn complete_loading(&mut self, generation: u64, outcomes: Vec<LoadOutcome>) -> bool {
        if !self.mounted || generation != self.generation {
            log::debug!("Ignoring stale model load (generation {})", generation);
            return false;
        }
        let Some(scene) = self.scene.as_mut() else {
            return false;
        };

        // The held prop may not survive a repopulate
        self.state.pointer.release();
        self.state.pointer.hovering = false;
        scene.install_models(outcomes, &self.config, &mut self.rng);
        true
    }

    fn poll_loading(&mut self) {
        let finished = match self.pending.as_mut() {
            Some(pending) => pending.is_complete(),
            None => false,
        };
        if !finished {
            return;
        }
        if let Some(pending) = self.pending.take() {
            let generation = pending.generation();
            if let Some(outcomes) = pending.take() {
                self.complete_loading(generation, outcomes);
            }
        }
    }

    pub fn handle_event(&mut self, event: SkyEvent) {
        if !self.mounted {
            return;
        }
        match event {
            SkyEvent::PointerMove { x, y, .. } => self.pointer_move(Vec2::new(x, y)),
            SkyEvent::PointerDown { x, y, t_ms } => self.pointer_down(Vec2::new(x, y), t_ms),
            SkyEvent::PointerUp { x, y, t_ms } => self.pointer_up(Vec2::new(x, y), t_ms),
            SkyEvent::Scroll { y } => self.state.page_scroll = y,
            SkyEvent::Resize {
                width,
                height,
                pixel_ratio,
                t_ms,
            } => {
                self.timers.debounce(
                    t_ms + self.config.scene.resize_debounce_ms,
                    TimerEvent::Resize {
                        width,
                        height,
                        pixel_ratio,
                    },
                );
            }
        }
    }

    /// Scene is ready and this profile allows grabbing props
    fn interactive(&self) -> bool {
        self.mounted
            && !self.state.mobile
            && self
                .scene
                .as_ref()
                .is_some_and(|s| s.ready && !s.pool.is_empty())
    }

    fn track_pointer(&mut self, pixel: Vec2) {
        self.state.pointer.pixel = pixel;
        self.state.pointer.ndc = pixel_to_ndc(pixel, self.state.viewport.size());
        self.state.pointer.present = true;
    }

    /// Re-test the pointer against the props where they are now. Props drift
    /// under a still cursor, so this runs every frame as well as on moves.
    fn refresh_hover(&mut self) {
        let pointer = &self.state.pointer;
        if !self.interactive()
            || !self.state.interaction_enabled
            || !pointer.present
            || pointer.selected.is_some()
        {
            self.state.pointer.hovering = false;
            return;
        }
        let Some(scene) = self.scene.as_ref() else {
            return;
        };
        let ray = scene.camera.ndc_ray(pointer.ndc);
        self.state.pointer.hovering = pick(&ray, &scene.pool, &scene.models).is_some();
    }

    fn pointer_down(&mut self, pixel: Vec2, t_ms: f64) {
        self.track_pointer(pixel);
        if !self.interactive()
            || !self.state.interaction_enabled
            || self.state.pointer.selected.is_some()
        {
            return;
        }
        let Some(scene) = self.scene.as_ref() else {
            return;
        };

        let ray = scene.camera.ndc_ray(self.state.pointer.ndc);
        let Some(hit) = pick(&ray, &scene.pool, &scene.models) else {
            return;
        };
        if scene.pool.get(hit.id).is_some_and(|o| o.is_thrown()) {
            return;
        }
        self.state.pointer.select(hit.id, pixel, t_ms);
        log::debug!("Picked prop {:?}", hit.id);
    }

    fn pointer_move(&mut self, pixel: Vec2) {
        self.track_pointer(pixel);
        if !self.interactive() {
            self.state.pointer.hovering = false;
            return;
        }
        let Some(id) = self.state.pointer.selected else {
            self.refresh_hover();
            return;
        };
        let ndc = self.state.pointer.ndc;
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        let ray = scene.camera.ndc_ray(ndc);
        let Some(object) = scene.pool.get_mut(id) else {
            return;
        };
        if object.is_thrown() {
            return;
        }
        if let Some(position) = drag_position(&ray, object.position) {
            object.position = position;
            self.state.pointer.dragged = true;
        }
    }

    fn pointer_up(&mut self, pixel: Vec2, t_ms: f64) {
        self.track_pointer(pixel);
        let start = self.state.pointer.gesture_start;
        let start_ms = self.state.pointer.gesture_start_ms;
        let Some(id) = self.state.pointer.selected else {
            return;
        };
        let phase = match self.scene.as_ref() {
            Some(scene) => phase_of(&scene.pool, &self.state.pointer, id),
            None => Phase::Idle,
        };
        self.state.pointer.release();
        // Only a prop still in hand can be thrown
        if !self.interactive() || !matches!(phase, Phase::Selected | Phase::Dragging) {
            return;
        }
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        let Some(object) = scene.pool.get(id) else {
            return;
        };

        let gesture = Gesture::new(start, pixel, start_ms, t_ms);
        let params = compute_throw(&self.config.throw, &gesture, object.speed, &mut self.rng);
        let origin = object.position;
        scene.pool.throw(
            id,
            ThrowMotion {
                velocity: params.velocity,
                spin: params.spin,
                thrown_at: self.state.sim_time,
            },
        );

        let burst = self.bursts.spawn(&self.config.burst, origin, &mut self.rng);
        self.timers.schedule(
            t_ms + self.config.burst.lifetime_ms,
            TimerEvent::ParticleCleanup(burst),
        );

        self.state.interaction_enabled = false;
        self.state.pointer.hovering = false;
        self.timers
            .schedule(t_ms + self.config.throw.cooldown_ms, TimerEvent::InteractionCooldown);

        log::debug!(
            "Threw prop {:?} from {:?} at speed {:.2}{}",
            id,
            phase,
            params.speed,
            if params.flick { "" } else { " (nudge)" }
        );
    }

    /// Step the simulation to `now_ms`. Returns the frame delta in seconds.
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        if !self.mounted {
            return 0.0;
        }
        let dt = self.clock.tick(now_ms);

        for event in self.timers.drain_due(now_ms) {
            match event {
                TimerEvent::InteractionCooldown => self.state.interaction_enabled = true,
                TimerEvent::ParticleCleanup(id) => {
                    self.bursts.remove(id);
                }
                TimerEvent::Resize {
                    width,
                    height,
                    pixel_ratio,
                } => self.apply_resize(width, height, pixel_ratio),
            }
        }
        self.poll_loading();

        self.state.sim_time += dt as f64;

        self.starfield.update(
            &self.config.starfield,
            dt,
            self.state.pointer.pixel,
            self.state.page_scroll,
        );

        if let Some(scene) = self.scene.as_mut() {
            if scene.ready {
                let recycled = scene.pool.update(
                    &self.config,
                    &scene.camera,
                    dt,
                    self.state.sim_time,
                    self.state.pointer.selected,
                    &mut self.rng,
                );
                for (id, reason) in recycled {
                    log::debug!("Recycled prop {:?} ({:?})", id, reason);
                }
            }
            scene.update_lights();
            scene.advance_fade(dt, self.config.scene.fade_in_secs);
        }
        self.refresh_hover();
        self.bursts.update(dt);

        dt
    }

    fn apply_resize(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        let was_mobile = self.state.mobile;
        self.state.viewport = Viewport::new(width, height, pixel_ratio);
        self.state.mobile = self.config.is_mobile(width);

        self.starfield.regenerate(
            &self.config.starfield,
            &self.palette,
            width,
            height,
            self.state.mobile,
            &mut self.rng,
        );
        // A sky mounted at zero size gets its scene once there is room for one
        let mut needs_load = false;
        if width > 0.0 && height > 0.0 {
            if let Some(scene) = self.scene.as_mut() {
                scene.resize(&self.config, width, height, pixel_ratio);
            } else if self.config.enable_3d {
                match Scene3d::initialize(&self.config, width, height, pixel_ratio) {
                    Ok(scene) => {
                        log::info!("3D layer created at {}x{}", width, height);
                        self.scene = Some(scene);
                        self.surface = None;
                        needs_load = true;
                    }
                    Err(e) => log::warn!("3D layer still unavailable ({})", e),
                }
            }
        }
        if self.state.mobile {
            self.state.pointer.release();
            self.state.pointer.hovering = false;
        }
        log::debug!("Sky resized to {}x{} @{}x", width, height, pixel_ratio);

        // Pool size depends on the profile; reload for the new target
        if needs_load {
            self.begin_load();
        } else if was_mobile != self.state.mobile {
            log::info!(
                "Switched to {} profile, pool target {}",
                if self.state.mobile { "mobile" } else { "desktop" },
                self.config.pool_target(width)
            );
            self.begin_load();
        }
    }

    /// Paint the starfield and composite the 3D layer over it
    pub fn draw(&mut self) {
        if !self.mounted {
            return;
        }
        self.starfield.draw(&self.config.starfield);

        let Some(scene) = self.scene.as_ref() else {
            return;
        };
        if !scene.ready {
            return;
        }
        let surface = self
            .surface
            .get_or_insert_with(|| RenderSurface::attach(&scene.surface));
        draw_scene(surface, scene, &self.bursts, &self.config);
    }

    /// Stop everything and release the scene. Safe to call twice.
    pub fn teardown(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.generation += 1;
        self.pending = None;
        self.timers.clear();
        self.bursts.clear();
        if let Some(scene) = self.scene.as_mut() {
            scene.release();
        }
        self.scene = None;
        self.surface = None;
        self.state.pointer = PointerState::default();
        log::info!("Sky torn down");
    }

    /// Pointer is over (or holding) a prop, so clicks belong to the sky
    pub fn captures_pointer(&self) -> bool {
        self.mounted && (self.state.pointer.hovering || self.state.pointer.selected.is_some())
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &SkyConfig {
        &self.config
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn starfield(&self) -> &StarField {
        &self.starfield
    }

    pub fn scene(&self) -> Option<&Scene3d> {
        self.scene.as_ref()
    }

    pub fn bursts(&self) -> &Bursts {
        &self.bursts
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    /// The held prop, if any
    pub fn selected(&self) -> Option<ObjectId> {
        self.state.pointer.selected
    }

    /// Where a prop is in the pick-drag-throw cycle
    pub fn phase(&self, id: ObjectId) -> Phase {
        match self.scene.as_ref() {
            Some(scene) => phase_of(&scene.pool, &self.state.pointer, id),
            None => Phase::Idle,
        }
    }
}

impl Drop for SkyLayer {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::model::ModelError;
    use std::rc::Rc;

    fn offline() -> Fetcher {
        Rc::new(|path: String| -> loader::FetchFuture {
            Box::pin(std::future::ready(Err(ModelError::Fetch {
                path,
                message: "offline".to_string(),
            })))
        })
    }

    fn loaded_layer(width: f32) -> SkyLayer {
        let mut layer = SkyLayer::mount(SkyConfig::default(), Viewport::new(width, 800.0, 1.0), 0.0, 99);
        layer.start_loading(offline());
        layer.advance(16.0);
        layer
    }

    /// Screen position of a prop's centre
    fn screen_of(layer: &SkyLayer, id: ObjectId) -> Vec2 {
        let scene = layer.scene().unwrap();
        let object = scene.pool.get(id).unwrap();
        scene
            .camera
            .project(object.position, layer.state().viewport.size())
            .unwrap()
            .screen
    }

    /// Press on the prop nearest the screen centre
    fn grab(layer: &mut SkyLayer, t_ms: f64) -> Vec2 {
        let centre = layer.state().viewport.size() / 2.0;
        let scene = layer.scene().unwrap();
        let id = scene
            .pool
            .iter()
            .map(|(id, _)| id)
            .min_by(|a, b| {
                let da = (screen_of(layer, *a) - centre).length();
                let db = (screen_of(layer, *b) - centre).length();
                da.total_cmp(&db)
            })
            .unwrap();
        let at = screen_of(layer, id);
        layer.handle_event(SkyEvent::PointerDown { x: at.x, y: at.y, t_ms });
        at
    }

    #[test]
    fn test_frame_clock_caps_delta() {
        let mut clock = FrameClock::new(1000.0, 0.1);
        assert!((clock.tick(1016.0) - 0.016).abs() < 1e-6);
        assert_eq!(clock.tick(9000.0), 0.1);
        // Clock going backwards never yields a negative step
        assert_eq!(clock.tick(8000.0), 0.0);
    }

    #[test]
    fn test_loading_resolves_to_placeholders() {
        let layer = loaded_layer(1280.0);
        let scene = layer.scene().unwrap();
        assert!(scene.ready);
        assert!(!layer.is_loading());
        assert_eq!(scene.pool.len(), 8);
        assert!(scene.models[0].is_placeholder());
        assert!(scene.fade > 0.0);
    }

    #[test]
    fn test_input_before_load_is_noop() {
        let mut layer = SkyLayer::mount(SkyConfig::default(), Viewport::new(1280.0, 800.0, 1.0), 0.0, 1);
        layer.handle_event(SkyEvent::PointerDown { x: 640.0, y: 400.0, t_ms: 10.0 });
        layer.handle_event(SkyEvent::PointerMove { x: 700.0, y: 400.0, t_ms: 20.0 });
        layer.handle_event(SkyEvent::PointerUp { x: 700.0, y: 400.0, t_ms: 30.0 });
        layer.advance(40.0);
        assert!(layer.selected().is_none());
        assert!(layer.bursts().is_empty());
        assert!(!layer.captures_pointer());
    }

    #[test]
    fn test_pick_drag_throw_cycle() {
        let mut layer = loaded_layer(1280.0);
        let at = grab(&mut layer, 100.0);
        let id = layer.selected().expect("prop under the pointer is picked");
        assert!(layer.captures_pointer());

        // Second press while holding does nothing
        layer.handle_event(SkyEvent::PointerDown { x: 10.0, y: 10.0, t_ms: 120.0 });
        assert_eq!(layer.selected(), Some(id));

        let z_before = layer.scene().unwrap().pool.get(id).unwrap().position.z;
        layer.handle_event(SkyEvent::PointerMove { x: at.x + 50.0, y: at.y, t_ms: 200.0 });
        let object = layer.scene().unwrap().pool.get(id).unwrap();
        assert_eq!(object.position.z, z_before);

        // Held props don't drift
        let held_at = object.position;
        layer.advance(250.0);
        assert_eq!(layer.scene().unwrap().pool.get(id).unwrap().position, held_at);

        layer.handle_event(SkyEvent::PointerUp { x: at.x + 50.0, y: at.y, t_ms: 300.0 });
        assert!(layer.selected().is_none());
        assert!(layer.scene().unwrap().pool.get(id).unwrap().is_thrown());
        assert_eq!(layer.bursts().len(), 1);
        assert!(!layer.state().interaction_enabled);

        // Cooldown blocks picking
        grab(&mut layer, 350.0);
        assert!(layer.selected().is_none());

        layer.advance(801.0);
        assert!(layer.state().interaction_enabled);
        assert_eq!(layer.bursts().len(), 1);
        layer.advance(1301.0);
        assert!(layer.bursts().is_empty());
    }

    #[test]
    fn test_hover_follows_drifting_props() {
        let mut layer = loaded_layer(1280.0);
        let id = layer.scene().unwrap().pool.iter().map(|(id, _)| id).next().unwrap();
        let at = screen_of(&layer, id);
        layer.handle_event(SkyEvent::PointerMove { x: at.x, y: at.y, t_ms: 20.0 });
        assert!(layer.captures_pointer());

        // Pointer stays put while the props move underneath it
        let mut t = 20.0;
        for _ in 0..300 {
            t += 16.0;
            layer.advance(t);
            let scene = layer.scene().unwrap();
            let ray = scene.camera.ndc_ray(layer.state().pointer.ndc);
            let over_prop = pick(&ray, &scene.pool, &scene.models).is_some();
            assert_eq!(layer.captures_pointer(), over_prop);
        }
    }

    #[test]
    fn test_no_hover_before_pointer_arrives() {
        let mut layer = loaded_layer(1280.0);
        layer.advance(32.0);
        assert!(!layer.state().pointer.present);
        assert!(!layer.captures_pointer());
    }

    #[test]
    fn test_phase_tracks_grab_and_throw() {
        let mut layer = loaded_layer(1280.0);
        let at = grab(&mut layer, 100.0);
        let id = layer.selected().unwrap();
        assert_eq!(layer.phase(id), Phase::Selected);
        layer.handle_event(SkyEvent::PointerMove { x: at.x + 40.0, y: at.y, t_ms: 150.0 });
        assert_eq!(layer.phase(id), Phase::Dragging);
        layer.handle_event(SkyEvent::PointerUp { x: at.x + 80.0, y: at.y, t_ms: 200.0 });
        assert_eq!(layer.phase(id), Phase::Thrown);
    }

    #[test]
    fn test_mobile_profile_never_picks() {
        let mut layer = loaded_layer(500.0);
        assert_eq!(layer.scene().unwrap().pool.len(), 4);
        grab(&mut layer, 100.0);
        assert!(layer.selected().is_none());
        assert!(!layer.captures_pointer());
    }

    #[test]
    fn test_at_most_one_selected_over_many_frames() {
        let mut layer = loaded_layer(1280.0);
        let mut t = 16.0;
        for i in 0..300 {
            t += 16.0;
            match i % 4 {
                0 => {
                    grab(&mut layer, t);
                }
                1 => layer.handle_event(SkyEvent::PointerMove { x: 600.0, y: 300.0, t_ms: t }),
                2 => layer.handle_event(SkyEvent::PointerUp { x: 900.0, y: 200.0, t_ms: t }),
                _ => {}
            }
            layer.advance(t);
            let scene = layer.scene().unwrap();
            assert_eq!(scene.pool.len(), 8);
            let held = scene
                .pool
                .iter()
                .filter(|(id, _)| layer.selected() == Some(*id))
                .count();
            assert!(held <= 1);
            if let Some(id) = layer.selected() {
                assert!(!scene.pool.get(id).unwrap().is_thrown());
            }
        }
    }

    #[test]
    fn test_resize_is_debounced_and_switches_profile() {
        let mut layer = loaded_layer(1280.0);
        let generation = layer.generation();
        assert!(layer.scene().unwrap().lights.shadows_enabled());

        layer.handle_event(SkyEvent::Resize {
            width: 1000.0,
            height: 800.0,
            pixel_ratio: 1.0,
            t_ms: 100.0,
        });
        layer.handle_event(SkyEvent::Resize {
            width: 600.0,
            height: 800.0,
            pixel_ratio: 1.0,
            t_ms: 200.0,
        });
        layer.advance(400.0);
        // Nothing applied yet
        assert!(!layer.state().mobile);

        layer.advance(450.0);
        assert!(layer.state().mobile);
        assert_eq!(layer.state().viewport.width, 600.0);
        let scene = layer.scene().unwrap();
        assert!(!scene.lights.shadows_enabled());
        assert!((scene.camera.aspect - 0.75).abs() < 1e-6);
        assert!(layer.generation() > generation);
        assert_eq!(scene.pool.len(), 4);
    }

    #[test]
    fn test_zero_sized_mount_builds_scene_on_resize() {
        let mut layer = SkyLayer::mount(SkyConfig::default(), Viewport::new(0.0, 0.0, 1.0), 0.0, 11);
        layer.start_loading(offline());
        assert!(layer.scene().is_none());
        assert!(!layer.is_loading());

        layer.handle_event(SkyEvent::Resize {
            width: 1280.0,
            height: 800.0,
            pixel_ratio: 1.0,
            t_ms: 10.0,
        });
        layer.advance(16.0);
        assert!(layer.scene().is_none());

        layer.advance(300.0);
        let scene = layer.scene().expect("scene created once the viewport has area");
        assert!(scene.ready);
        assert_eq!(scene.pool.len(), 8);
        assert!(!layer.state().mobile);
    }

    #[test]
    fn test_resize_carries_pixel_ratio() {
        let mut layer = loaded_layer(1280.0);
        layer.handle_event(SkyEvent::Resize {
            width: 1280.0,
            height: 800.0,
            pixel_ratio: 2.0,
            t_ms: 20.0,
        });
        layer.advance(300.0);
        assert_eq!(layer.state().viewport.pixel_ratio, 2.0);
        assert_eq!(layer.scene().unwrap().surface.pixel_ratio, 2.0);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let mut layer = loaded_layer(1280.0);
        grab(&mut layer, 100.0);
        layer.handle_event(SkyEvent::PointerUp { x: 0.0, y: 0.0, t_ms: 150.0 });
        layer.handle_event(SkyEvent::Resize {
            width: 900.0,
            height: 700.0,
            pixel_ratio: 1.0,
            t_ms: 160.0,
        });
        let generation = layer.generation();

        layer.teardown();
        assert!(!layer.is_mounted());
        assert!(layer.scene().is_none());
        assert!(layer.bursts().is_empty());
        assert!(layer.timers().is_empty());
        assert!(!layer.captures_pointer());
        assert_eq!(layer.advance(5000.0), 0.0);

        // A load that finishes after unmount is dropped
        assert!(!layer.complete_loading(generation, Vec::new()));
        layer.teardown();
    }

    #[test]
    fn test_stale_generation_ignored() {
        let mut layer = SkyLayer::mount(SkyConfig::default(), Viewport::new(1280.0, 800.0, 1.0), 0.0, 3);
        layer.start_loading(offline());
        let first = layer.generation();
        layer.start_loading(offline());
        assert!(!layer.complete_loading(first, Vec::new()));
        assert!(!layer.scene().unwrap().ready);
        layer.advance(16.0);
        assert!(layer.scene().unwrap().ready);
    }

    #[test]
    fn test_degrades_to_starfield_only() {
        let config = SkyConfig {
            enable_3d: false,
            ..SkyConfig::default()
        };
        let mut layer = SkyLayer::mount(config, Viewport::new(1280.0, 800.0, 1.0), 0.0, 5);
        layer.start_loading(offline());
        assert!(layer.scene().is_none());
        assert!(!layer.is_loading());
        layer.handle_event(SkyEvent::PointerDown { x: 640.0, y: 400.0, t_ms: 10.0 });
        layer.handle_event(SkyEvent::Scroll { y: 120.0 });
        layer.advance(16.0);
        assert!(!layer.starfield().is_empty());
        assert_eq!(layer.state().page_scroll, 120.0);
    }
}
