//! Procedural 2D starfield
//!
//! A flat field of twinkling point lights painted behind the 3D layer.
//! Stars are scattered over three viewport heights so vertical wrapping
//! never shows a seam, scroll slowly to the left, and lean away from
//! pointer motion (bigger stars lean further, which reads as parallax).

use macroquad::color::Color;
use macroquad::math::Vec2;
use rand::Rng;

use crate::config::StarfieldConfig;

/// Concentric rings used to approximate the radial glow gradient
const GLOW_RINGS: usize = 4;

/// A single star
#[derive(Debug, Clone, Copy)]
pub struct StarParticle {
    /// Where the star was drawn this frame
    pub position: Vec2,
    /// Placement before scroll, wrap and parallax are applied
    pub home: Vec2,
    pub radius: f32,
    pub glow_radius: f32,
    pub color: Color,
    pub opacity: f32,
    /// Signed opacity change per frame; flips at either bound
    pub twinkle_speed: f32,
    pub max_opacity: f32,
    /// False when the star is outside the viewport (plus margin)
    pub visible: bool,
}

/// The whole field plus its scroll and pointer-drift state
#[derive(Debug, Clone)]
pub struct StarField {
    stars: Vec<StarParticle>,
    width: f32,
    height: f32,
    mobile: bool,
    scroll_offset: f32,
    drift: Vec2,
    prev_pointer: Option<Vec2>,
}

impl StarField {
    /// Number of stars for a viewport.
    ///
    /// The area term is deterministic; the second term is drawn from
    /// `[random_floor, random_floor + random_span)` and caps it.
    pub fn star_count<R: Rng>(config: &StarfieldConfig, width: f32, height: f32, rng: &mut R) -> usize {
        // Float-to-int casts saturate, so a zero density gives usize::MAX here
        let area_term = ((width.max(0.0) * height.max(0.0) / config.area_per_star).floor() as usize)
            .saturating_add(config.base_count);
        let random_term = (rng.gen::<f32>() * config.random_span + config.random_floor).floor() as usize;
        area_term.min(random_term)
    }

    /// Generate a fresh field for a viewport
    pub fn initialize<R: Rng>(
        config: &StarfieldConfig,
        palette: &[Color; 3],
        width: f32,
        height: f32,
        mobile: bool,
        rng: &mut R,
    ) -> Self {
        let mut field = Self {
            stars: Vec::new(),
            width,
            height,
            mobile,
            scroll_offset: 0.0,
            drift: Vec2::ZERO,
            prev_pointer: None,
        };
        field.regenerate(config, palette, width, height, mobile, rng);
        field
    }

    /// Replace every star for new viewport dimensions.
    /// Scroll offset and pointer drift carry over so a resize doesn't jolt.
    pub fn regenerate<R: Rng>(
        &mut self,
        config: &StarfieldConfig,
        palette: &[Color; 3],
        width: f32,
        height: f32,
        mobile: bool,
        rng: &mut R,
    ) {
        self.width = width;
        self.height = height;
        self.mobile = mobile;

        let count = Self::star_count(config, width, height, rng);
        let band = height * config.vertical_bands;

        self.stars = (0..count)
            .map(|_| {
                let home = Vec2::new(rng.gen::<f32>() * width, rng.gen::<f32>() * band);
                let radius = config.radius.sample(rng);
                let max_opacity = config.max_opacity.sample(rng);
                let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                StarParticle {
                    position: home,
                    home,
                    radius,
                    glow_radius: radius * (3.0 + radius / 2.0),
                    color: palette[rng.gen_range(0..palette.len())],
                    opacity: rng.gen_range(config.min_opacity..=max_opacity.max(config.min_opacity)),
                    twinkle_speed: config.twinkle_speed.sample(rng) * sign,
                    max_opacity,
                    visible: true,
                }
            })
            .collect();
    }

    pub fn stars(&self) -> &[StarParticle] {
        &self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn drift(&self) -> Vec2 {
        self.drift
    }

    /// Advance one frame: auto-scroll, pointer drift, twinkle, wrap.
    pub fn update(&mut self, config: &StarfieldConfig, delta_time: f32, pointer: Vec2, page_scroll: f32) {
        let (scroll_speed, pointer_factor) = if self.mobile {
            (config.scroll_speed_mobile, config.pointer_factor_mobile)
        } else {
            (config.scroll_speed_desktop, config.pointer_factor_desktop)
        };
        self.scroll_offset += scroll_speed * delta_time;

        let pointer_delta = match self.prev_pointer {
            Some(prev) => pointer - prev,
            None => Vec2::ZERO,
        };
        self.prev_pointer = Some(pointer);
        self.drift = pointer_delta * pointer_factor + self.drift * config.pointer_decay;

        if self.width <= 0.0 || self.height <= 0.0 {
            return;
        }

        let band = self.height * config.vertical_bands;
        for star in &mut self.stars {
            star.opacity += star.twinkle_speed;
            if star.opacity > star.max_opacity || star.opacity < config.min_opacity {
                star.twinkle_speed = -star.twinkle_speed;
                star.opacity = star.opacity.clamp(config.min_opacity, star.max_opacity.max(config.min_opacity));
            }

            let base_x = (star.home.x - self.scroll_offset).rem_euclid(self.width);
            let shifted_y = star.home.y - page_scroll * config.page_scroll_factor;
            let base_y = (shifted_y + self.height).rem_euclid(band) - self.height;

            let lean = star.radius / 5.0 * config.parallax;
            star.position = Vec2::new(base_x + self.drift.x * lean, base_y + self.drift.y * lean);
            star.visible = star.position.y >= -config.cull_margin
                && star.position.y <= self.height + config.cull_margin;
        }
    }

    /// Paint the field. Clears the screen to black first.
    pub fn draw(&self, config: &StarfieldConfig) {
        use macroquad::prelude::{clear_background, draw_circle, BLACK};

        clear_background(BLACK);

        for star in self.stars.iter().filter(|s| s.visible) {
            let glow_alpha = star.opacity * config.glow_alpha / GLOW_RINGS as f32;
            for ring in 0..GLOW_RINGS {
                let t = 1.0 - ring as f32 / GLOW_RINGS as f32;
                let radius = star.radius + (star.glow_radius - star.radius) * t;
                let c = star.color;
                draw_circle(star.position.x, star.position.y, radius, Color::new(c.r, c.g, c.b, glow_alpha));
            }
            let c = star.color;
            draw_circle(star.position.x, star.position.y, star.radius, Color::new(c.r, c.g, c.b, star.opacity));
        }
    }
}
